//! Error types for record operations.
//!
//! [`SchemaError`] covers configuration problems in a record type's
//! declaration. [`RecordError`] is what every record operation returns.
//! A vetoed save or delete is *not* an error: those operations return
//! `Ok(false)`.

use crate::events::EventKind;
use crate::record::RecordStatus;
use crate::value::Value;
use thiserror::Error;

/// Boxed error returned by event listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration errors in a record type's schema declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field was declared with a kind that has no logical type.
    #[error("field {field} has unsupported type {kind}")]
    UnsupportedType { field: String, kind: String },

    /// The primary key does not name a declared column.
    #[error("primary key {primary_key} is not defined in the schema of table {table}")]
    MissingPrimaryKey { table: String, primary_key: String },

    /// More than one field carries the primary-key flag.
    #[error("table {table} declares more than one primary key ({first}, {second})")]
    MultiplePrimaryKeys {
        table: String,
        first: String,
        second: String,
    },

    /// Two fields map to the same column name.
    #[error("column {column} is declared twice in table {table}")]
    DuplicateColumn { table: String, column: String },

    /// The table name is empty.
    #[error("record type declares an empty table name")]
    EmptyTable,
}

/// Errors returned by record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Access to a field that is not a column of the table.
    #[error("{column} is not in the table schema.")]
    UnknownColumn { table: String, column: String },

    /// `load` found no row for the given key.
    #[error("Error while trying to load item {id}")]
    NotFound { table: String, id: Value },

    /// `delete` on a record whose primary key holds no value.
    #[error("Item cannot be delete because it is not loaded.")]
    NotLoaded { table: String },

    /// The backend rejected a statement.
    #[error("Query '{query}' failed with error {message}")]
    Persistence { query: String, message: String },

    /// A value cannot be bound as its column's logical type.
    #[error("Invalid value for column {column}: expected {expected}, got {actual}")]
    InvalidValue {
        column: String,
        expected: String,
        actual: String,
    },

    /// The operation is not defined for the record's current status.
    #[error("cannot {operation} a record in status {status:?}")]
    InvalidState {
        operation: &'static str,
        status: RecordStatus,
    },

    /// A listener failed while handling an event.
    #[error("{event:?} listener failed: {source}")]
    Listener {
        event: EventKind,
        #[source]
        source: ListenerError,
    },
}

/// Errors raised while opening a database handle.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The URL is empty or malformed.
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// No handle is compiled in for this URL scheme.
    #[error("Unsupported database scheme: {0}")]
    UnsupportedScheme(String),

    /// The backend refused the connection.
    #[error("Connection error: {0}")]
    Backend(String),
}
