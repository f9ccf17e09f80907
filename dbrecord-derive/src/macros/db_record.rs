//! Derive macro for `DbRecord`
//!
//! Generates the `RecordType` declaration, the `<Name>Column` enum and,
//! when every field type is supported, the `RecordModel` conversions.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes;
use crate::type_conversion::{self, Kind};
use crate::utils;

struct FieldInfo {
    ident: syn::Ident,
    name: String,
    column: String,
    explicit_column: Option<String>,
    variant: syn::Ident,
    primary_key: bool,
    kind: Kind,
}

pub fn derive_db_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DbRecord cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "DbRecord can only be derived for structs with named fields",
            ));
        }
    };

    attributes::check_name_value(&input.attrs, "table_name")?;
    attributes::check_name_value(&input.attrs, "validate")?;
    let validate = attributes::extract_validate(&input.attrs)?;
    let table_name = attributes::extract_table_name(&input.attrs)
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));

    let mut infos = Vec::with_capacity(fields.len());
    let mut primary_key: Option<&syn::Ident> = None;
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        attributes::check_name_value(&field.attrs, "column_name")?;

        let is_pk = attributes::has_attribute(field, "primary_key");
        if is_pk {
            if let Some(first) = primary_key {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("#[primary_key] is already set on field `{first}`"),
                ));
            }
            primary_key = field.ident.as_ref();
        }

        let name = utils::unraw(&ident);
        let explicit_column = attributes::extract_column_name(field);
        infos.push(FieldInfo {
            column: explicit_column.clone().unwrap_or_else(|| name.clone()),
            variant: format_ident!("{}", utils::pascal_case(&name)),
            explicit_column,
            primary_key: is_pk,
            kind: type_conversion::classify(&field.ty),
            ident,
            name,
        });
    }

    Ok(assemble(struct_name, vis, &table_name, validate.as_ref(), &infos))
}

fn assemble(
    struct_name: &syn::Ident,
    vis: &syn::Visibility,
    table_name: &str,
    validate: Option<&syn::Path>,
    infos: &[FieldInfo],
) -> TokenStream2 {
    let validate = validate.map(|path| {
        quote! {
            fn validate(record: &::dbrecord::RecordState, errors: &mut ::dbrecord::FieldErrors) {
                #path(record, errors)
            }
        }
    });
    let declaration = generate_declaration(table_name, infos);
    let column_enum = generate_column_enum(struct_name, vis, infos);
    let model = if infos.iter().all(|f| f.kind.is_supported()) {
        generate_model(struct_name, infos)
    } else {
        TokenStream2::new()
    };

    quote! {
        #[automatically_derived]
        impl ::dbrecord::RecordType for #struct_name {
            fn declaration() -> ::dbrecord::SchemaDeclaration {
                #declaration
            }

            #validate
        }

        #column_enum
        #model
    }
}

fn generate_declaration(table_name: &str, infos: &[FieldInfo]) -> TokenStream2 {
    let decls = infos.iter().map(|f| {
        let name = &f.name;
        let kind = f.kind.to_tokens();
        let column = match &f.explicit_column {
            Some(column) => quote! { .column(#column) },
            None => TokenStream2::new(),
        };
        let primary_key = if f.primary_key {
            quote! { .primary_key() }
        } else {
            TokenStream2::new()
        };
        quote! {
            ::dbrecord::FieldDecl::new(#name, #kind) #column #primary_key
        }
    });

    quote! {
        ::dbrecord::SchemaDeclaration::new(#table_name, ::std::vec![#(#decls),*])
    }
}

fn generate_column_enum(struct_name: &syn::Ident, vis: &syn::Visibility, infos: &[FieldInfo]) -> TokenStream2 {
    let enum_name = format_ident!("{}Column", struct_name);
    let variants: Vec<&syn::Ident> = infos.iter().map(|f| &f.variant).collect();
    let columns: Vec<&String> = infos.iter().map(|f| &f.column).collect();
    let doc = format!("Columns of [`{struct_name}`].");

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #enum_name {
            #(#variants),*
        }

        #[automatically_derived]
        impl #enum_name {
            /// Every column, in declaration order.
            pub const ALL: &'static [#enum_name] = &[#(#enum_name::#variants),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    #(#enum_name::#variants => #columns),*
                }
            }
        }

        #[automatically_derived]
        impl ::std::convert::AsRef<str> for #enum_name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        #[automatically_derived]
        impl ::std::fmt::Display for #enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    }
}

fn generate_model(struct_name: &syn::Ident, infos: &[FieldInfo]) -> TokenStream2 {
    let reads = infos.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! {
            #ident: ::dbrecord::FieldValue::from_value(&state.get(#column).unwrap_or_default())
        }
    });
    let writes = infos.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! {
            (#column, ::dbrecord::FieldValue::into_value(::std::clone::Clone::clone(&self.#ident)))
        }
    });

    quote! {
        #[automatically_derived]
        impl ::dbrecord::RecordModel for #struct_name {
            fn from_state(state: &::dbrecord::RecordState) -> Self {
                Self {
                    #(#reads),*
                }
            }

            fn to_values(&self) -> ::std::vec::Vec<(&'static str, ::dbrecord::Value)> {
                ::std::vec![#(#writes),*]
            }
        }
    }
}
