//! Mapping of Rust field types to declared column kinds
//!
//! Classification is syntactic: the last path segment names the type.
//! - Integer types: i8..i64, isize, u8..u32 (anything that fits an `i64`)
//! - Floating point: f32, f64 (stored as text)
//! - Boolean: bool
//! - String: String
//! - Option<T> for all above types
//!
//! Anything else is declared as `DeclaredKind::Other` and reported by the
//! schema builder.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Declared kind of a field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Integer,
    String,
    Boolean,
    Float,
    Other(String),
}

impl Kind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Kind::Other(_))
    }

    /// Tokens constructing the matching `DeclaredKind`.
    pub fn to_tokens(&self) -> TokenStream {
        match self {
            Kind::Integer => quote! { ::dbrecord::DeclaredKind::Integer },
            Kind::String => quote! { ::dbrecord::DeclaredKind::String },
            Kind::Boolean => quote! { ::dbrecord::DeclaredKind::Boolean },
            Kind::Float => quote! { ::dbrecord::DeclaredKind::Float },
            Kind::Other(name) => quote! { ::dbrecord::DeclaredKind::Other(#name.to_string()) },
        }
    }
}

/// Inner type of `Option<T>`
pub fn option_inner(ty: &Type) -> Option<&Type> {
    if let Type::Path(TypePath { path, qself: None }) = ty {
        if let Some(segment) = path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return Some(inner);
                    }
                }
            }
        }
    }
    None
}

/// Classify a field type, looking through `Option`.
pub fn classify(ty: &Type) -> Kind {
    if let Some(inner) = option_inner(ty) {
        return classify(inner);
    }

    if let Type::Path(TypePath { path, qself: None }) = ty {
        if let Some(segment) = path.segments.last() {
            if segment.arguments.is_empty() {
                match segment.ident.to_string().as_str() {
                    "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" => {
                        return Kind::Integer
                    }
                    "f32" | "f64" => return Kind::Float,
                    "bool" => return Kind::Boolean,
                    "String" => return Kind::String,
                    _ => {}
                }
            }
        }
    }

    Kind::Other(type_to_string(ty))
}

/// Readable type name for error messages, e.g. `Vec<u8>`.
pub fn type_to_string(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .iter()
            .map(|seg| {
                let mut result = seg.ident.to_string();
                if let PathArguments::AngleBracketed(args) = &seg.arguments {
                    let generic_args: Vec<String> = args
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(inner) => Some(type_to_string(inner)),
                            _ => None,
                        })
                        .collect();
                    if !generic_args.is_empty() {
                        result.push('<');
                        result.push_str(&generic_args.join(", "));
                        result.push('>');
                    }
                }
                result
            })
            .collect::<Vec<_>>()
            .join("::"),
        Type::Array(_) => "array".to_string(),
        Type::Slice(_) => "slice".to_string(),
        Type::Tuple(tuple) => {
            let elems: Vec<String> = tuple.elems.iter().map(type_to_string).collect();
            format!("({})", elems.join(", "))
        }
        Type::Reference(_) => "reference".to_string(),
        Type::Ptr(_) => "pointer".to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> Type {
        syn::parse_str(s).unwrap()
    }

    #[test]
    fn test_classify_supported() {
        assert_eq!(classify(&ty("i32")), Kind::Integer);
        assert_eq!(classify(&ty("u32")), Kind::Integer);
        assert_eq!(classify(&ty("String")), Kind::String);
        assert_eq!(classify(&ty("std::string::String")), Kind::String);
        assert_eq!(classify(&ty("bool")), Kind::Boolean);
        assert_eq!(classify(&ty("f64")), Kind::Float);
        assert_eq!(classify(&ty("Option<i64>")), Kind::Integer);
        assert_eq!(classify(&ty("Option<String>")), Kind::String);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify(&ty("Vec<u8>")), Kind::Other("Vec<u8>".to_string()));
        assert_eq!(
            classify(&ty("Option<std::path::PathBuf>")),
            Kind::Other("std::path::PathBuf".to_string())
        );
        assert_eq!(classify(&ty("u64")), Kind::Other("u64".to_string()));
        assert_eq!(classify(&ty("Option<usize>")), Kind::Other("usize".to_string()));
        assert_eq!(classify(&ty("(i32, i32)")), Kind::Other("(i32, i32)".to_string()));
        assert!(!classify(&ty("&str")).is_supported());
    }
}
