//! The database handle a record executes through.
//!
//! This crate never opens or closes connections itself. Anything that can
//! run a parameterized statement, fetch a single row, report the last
//! generated identity and name its dialect can back a record.

use crate::dialect::Dialect;
use crate::schema::LogicalType;
use crate::value::Value;
use thiserror::Error;

/// Backend diagnostic for a failed prepare or execute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DatabaseError {
    pub message: String,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Handle to a database connection.
///
/// Statements use `?` placeholders; parameters are already normalized to
/// their column's logical type and never `Value::Null`. Handles whose
/// driver wants another placeholder syntax rewrite it themselves.
pub trait Database {
    /// Dialect used for identifier quoting.
    fn dialect(&self) -> Dialect;

    /// Prepare, bind and execute a statement; returns the affected row count.
    ///
    /// # Errors
    ///
    /// [`DatabaseError`] with the backend's diagnostic text.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError>;

    /// Run a query and decode its first row, one value per entry of `columns`.
    ///
    /// Returns `Ok(None)` when the query yields no row.
    ///
    /// # Errors
    ///
    /// [`DatabaseError`] with the backend's diagnostic text.
    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
        columns: &[LogicalType],
    ) -> Result<Option<Vec<Value>>, DatabaseError>;

    /// Identity generated by the most recent INSERT on this handle.
    ///
    /// # Errors
    ///
    /// [`DatabaseError`] if the backend cannot report one.
    fn last_insert_id(&self) -> Result<i64, DatabaseError>;
}

impl<D: Database + ?Sized> Database for &D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        (**self).execute(sql, params)
    }

    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
        columns: &[LogicalType],
    ) -> Result<Option<Vec<Value>>, DatabaseError> {
        (**self).query_row(sql, params, columns)
    }

    fn last_insert_id(&self) -> Result<i64, DatabaseError> {
        (**self).last_insert_id()
    }
}

impl<D: Database + ?Sized> Database for Box<D> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        (**self).execute(sql, params)
    }

    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
        columns: &[LogicalType],
    ) -> Result<Option<Vec<Value>>, DatabaseError> {
        (**self).query_row(sql, params, columns)
    }

    fn last_insert_id(&self) -> Result<i64, DatabaseError> {
        (**self).last_insert_id()
    }
}
