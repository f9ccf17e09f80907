//! Tests for the generated `RecordType` declaration and column enum

use dbrecord::{DbRecord, LogicalType, RecordType, SchemaError};

#[derive(DbRecord)]
#[table_name = "contact"]
pub struct Contact {
    #[primary_key]
    id: i64,
    name: String,
    firstname: String,
    lastname: String,
    order: i32,
}

#[derive(DbRecord)]
struct ContactLegacy {
    id: i64,
    name: String,
    #[column_name = "is_active"]
    active: bool,
    income: f64,
    age: Option<i32>,
}

#[derive(DbRecord)]
#[table_name = "contact"]
struct ContactWithKey {
    #[primary_key]
    contact_id: i64,
    name: String,
}

#[derive(DbRecord)]
#[table_name = "attachment"]
struct Attachment {
    id: i64,
    data: Vec<u8>,
}

#[derive(DbRecord)]
#[table_name = "counter"]
struct Counter {
    id: i64,
    hits: u64,
}

#[test]
fn test_table_and_columns() {
    let schema = Contact::schema().unwrap();
    assert_eq!(schema.table_name(), "contact");
    assert_eq!(schema.primary_key(), "id");
    let names: Vec<_> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "name", "firstname", "lastname", "order"]);
    assert_eq!(schema.logical_type("order"), Some(LogicalType::Int));
    assert_eq!(schema.logical_type("name"), Some(LogicalType::String));
}

#[test]
fn test_default_table_name_and_column_rename() {
    let schema = ContactLegacy::schema().unwrap();
    assert_eq!(schema.table_name(), "contact_legacy");
    assert_eq!(schema.primary_key(), "id");
    assert!(schema.has_column("is_active"));
    assert!(!schema.has_column("active"));
    assert_eq!(schema.logical_type("is_active"), Some(LogicalType::Bool));
    assert_eq!(schema.logical_type("income"), Some(LogicalType::String));
    assert_eq!(schema.logical_type("age"), Some(LogicalType::Int));
}

#[test]
fn test_flagged_primary_key() {
    let schema = ContactWithKey::schema().unwrap();
    assert_eq!(schema.primary_key(), "contact_id");
}

#[test]
fn test_unsupported_field_type_reported_on_first_use() {
    let err = Attachment::schema().unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnsupportedType {
            field: "data".to_string(),
            kind: "Vec<u8>".to_string(),
        }
    );
}

#[test]
fn test_unsigned_64_bit_field_rejected() {
    let err = Counter::schema().unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnsupportedType {
            field: "hits".to_string(),
            kind: "u64".to_string(),
        }
    );
}

#[test]
fn test_column_enum() {
    assert_eq!(ContactColumn::Order.as_str(), "order");
    assert_eq!(ContactColumn::Firstname.as_ref(), "firstname");
    assert_eq!(ContactColumn::ALL.len(), 5);
    assert_eq!(ContactLegacyColumn::Active.to_string(), "is_active");
    assert_eq!(AttachmentColumn::Data.as_str(), "data");
}
