//! # dbrecord
//!
//! A minimal Active-Record layer: one [`Record`] per table row, with
//! schema-checked attribute access, dialect-aware identifier quoting,
//! lifecycle events and single-row CRUD by primary key.
//!
//! ```no_run
//! use dbrecord::{DbRecord, Record, SqliteDatabase};
//!
//! #[derive(DbRecord)]
//! #[table_name = "contact"]
//! struct Contact {
//!     #[primary_key]
//!     id: i64,
//!     name: String,
//!     order: i32,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = SqliteDatabase::open_in_memory()?;
//! let mut contact = Record::<Contact>::new(&db)?;
//! contact.set(ContactColumn::Name, "John Lennon")?;
//! contact.save()?;
//! # Ok(())
//! # }
//! ```

extern crate self as dbrecord;

// Engine messages go to `tracing` subscribers when the feature is on
// (and on to `log` when none is installed), straight to `log` otherwise.
macro_rules! emit {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)+);
        #[cfg(not(feature = "tracing"))]
        ::log::$level!($($arg)+);
    }};
}

pub mod config;
pub mod connection;
pub mod database;
pub mod dialect;
pub mod error;
pub mod events;
pub mod metrics;
pub mod record;
pub mod schema;
pub mod sql;
pub mod state;
pub mod value;

#[cfg(feature = "tracing")]
pub mod logging;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::DatabaseConfig;
pub use database::{Database, DatabaseError};
pub use dialect::{quote, Dialect};
pub use error::{ConnectionError, ListenerError, RecordError, SchemaError};
pub use events::{AfterDelete, AfterSave, BeforeDelete, BeforeSave, EventHub, EventKind, ListenerResult};
pub use record::{Record, RecordModel, RecordStatus, RecordType};
pub use schema::{
    ColumnDef, DeclaredKind, FieldDecl, LogicalType, SchemaBuilder, SchemaDeclaration, SchemaDescriptor,
};
pub use state::{FieldErrors, RecordState};
pub use value::{FieldValue, Value};

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use dbrecord_derive::DbRecord;
