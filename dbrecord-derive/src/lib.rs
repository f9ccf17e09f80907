//! Procedural macros for dbrecord
//!
//! This crate provides the `DbRecord` derive.

mod attributes;
mod macros;
mod type_conversion;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `DbRecord` - declares a record type from a struct
///
/// This macro generates:
/// - `RecordType` implementation (table name, columns, primary key)
/// - `<Name>Column` enum with one variant per field, usable wherever a
///   column name is expected
/// - `RecordModel` implementation (`from_state`/`to_values`) when every
///   field has a supported type
///
/// Attributes:
/// - `#[table_name = "..."]` on the struct (default: snake_case struct name)
/// - `#[primary_key]` on one field (default: the `id` column)
/// - `#[column_name = "..."]` on a field (default: the field name)
/// - `#[validate = "path::to::fn"]` on the struct: a
///   `fn(&RecordState, &mut FieldErrors)` used as `RecordType::validate`
///
/// Fields of any other type still derive, but the record type fails with
/// `SchemaError::UnsupportedType` when first used.
#[proc_macro_derive(DbRecord, attributes(table_name, primary_key, column_name, validate))]
pub fn derive_db_record(input: TokenStream) -> TokenStream {
    macros::derive_db_record(input)
}
