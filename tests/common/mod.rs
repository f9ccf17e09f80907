//! Shared record types and database setup for integration tests

#![allow(dead_code)]

use dbrecord::{
    DbRecord, FieldErrors, LogicalType, Record, RecordState, RecordType, SchemaDeclaration, SchemaDescriptor,
    SqliteDatabase,
};

pub const CREATE_CONTACT: &str = "CREATE TABLE contact (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  firstname TEXT,
  lastname TEXT,
  age INTEGER,
  `order` INTEGER,
  active INTEGER DEFAULT 0,
  active2 INTEGER DEFAULT 1,
  income REAL DEFAULT 0
)";

/// Fresh in-memory database with an empty `contact` table.
pub fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::open_in_memory().expect("open in-memory sqlite");
    db.connection()
        .execute_batch(CREATE_CONTACT)
        .expect("create contact table");
    db
}

pub fn count_contacts(db: &SqliteDatabase) -> i64 {
    db.connection()
        .query_row("SELECT COUNT(*) FROM contact", [], |row| row.get(0))
        .expect("count contacts")
}

pub fn require_names(record: &RecordState, errors: &mut FieldErrors) {
    if record.get("firstname").map(|v| v.is_empty()).unwrap_or(true) {
        errors.insert("firstname".to_string(), "First name is required".to_string());
    }
    if record.get("lastname").map(|v| v.is_empty()).unwrap_or(true) {
        errors.insert("lastname".to_string(), "Last name is required".to_string());
    }
}

/// Declarative record type.
#[derive(Debug, Clone, PartialEq, DbRecord)]
#[table_name = "contact"]
#[validate = "require_names"]
pub struct Contact {
    #[primary_key]
    pub id: i64,
    pub name: String,
    pub firstname: String,
    pub lastname: String,
    pub order: i32,
}

/// Record type with an explicit column map.
pub struct ContactLegacy;

impl RecordType for ContactLegacy {
    fn declaration() -> SchemaDeclaration {
        SchemaDescriptor::builder("contact")
            .column("id", LogicalType::Int)
            .column("name", LogicalType::String)
            .column("firstname", LogicalType::String)
            .column("lastname", LogicalType::String)
            .column("age", LogicalType::Int)
            .column("order", LogicalType::Int)
            .column("active", LogicalType::Bool)
            .column("active2", LogicalType::Bool)
            .column("income", LogicalType::String)
            .declaration()
    }

    fn validate(record: &RecordState, errors: &mut FieldErrors) {
        require_names(record, errors);
    }
}

/// Legacy record whose primary key is not one of its columns.
pub struct Contact2;

impl RecordType for Contact2 {
    fn declaration() -> SchemaDeclaration {
        SchemaDescriptor::builder("contact")
            .column("id", LogicalType::Int)
            .column("name", LogicalType::String)
            .primary_key("contact_id")
            .declaration()
    }
}

/// `active2` defaults to true when unset.
pub fn with_legacy_defaults(record: &mut Record<'_, ContactLegacy>) {
    record.on_before_save(|event| {
        if !event.record.has("active2") {
            event.record.set("active2", true)?;
        }
        Ok(())
    });
}

/// Insert the reference contact through a record of type `T`.
pub fn create_contact<'db, T: RecordType>(db: &'db SqliteDatabase) -> Record<'db, T> {
    let mut contact = Record::<T>::new(db).expect("schema builds");
    contact
        .bind([
            ("name", dbrecord::Value::from("Toto")),
            ("firstname", "Sylvain".into()),
            ("lastname", "Philip".into()),
            ("order", 1.into()),
        ])
        .expect("columns exist");
    assert!(contact.save().expect("insert succeeds"));
    contact
}
