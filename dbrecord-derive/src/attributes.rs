//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// String value of a `#[name = "..."]` attribute.
fn name_value(attrs: &[Attribute], name: &str) -> Option<String> {
    for attr in attrs {
        if attr.path().is_ident(name) {
            if let Ok(meta) = attr.meta.require_name_value() {
                if let syn::Expr::Lit(ExprLit {
                    lit: Lit::Str(s),
                    ..
                }) = &meta.value
                {
                    return Some(s.value());
                }
            }
        }
    }
    None
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    name_value(attrs, "table_name")
}

/// Extract the validation function path from struct attributes
pub fn extract_validate(attrs: &[Attribute]) -> syn::Result<Option<syn::Path>> {
    match name_value(attrs, "validate") {
        Some(path) => syn::parse_str(&path).map(Some),
        None => Ok(None),
    }
}

/// Extract column name from field attributes
pub fn extract_column_name(field: &Field) -> Option<String> {
    name_value(&field.attrs, "column_name")
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Reject `#[table_name]`, `#[column_name]` or `#[validate]` written in a form other than `= "..."`.
pub fn check_name_value(attrs: &[Attribute], name: &str) -> syn::Result<()> {
    for attr in attrs {
        if attr.path().is_ident(name) && name_value(std::slice::from_ref(attr), name).is_none() {
            return Err(syn::Error::new_spanned(
                attr,
                format!("expected #[{name} = \"...\"]"),
            ));
        }
    }
    Ok(())
}
