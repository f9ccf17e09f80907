//! SQLite database handle over `rusqlite`.

use crate::database::{Database, DatabaseError};
use crate::dialect::Dialect;
use crate::schema::LogicalType;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::Path;
use std::time::Duration;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn backend_error(err: rusqlite::Error) -> DatabaseError {
    DatabaseError::new(err.to_string())
}

/// Decode one SQLite cell as `logical_type`. NULL stays `Value::Null`.
fn decode(cell: ValueRef<'_>, logical_type: LogicalType) -> Result<Value, DatabaseError> {
    let raw = match cell {
        ValueRef::Null => return Ok(Value::Null),
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::String(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    raw.to_param("", logical_type)
        .map_err(|e| DatabaseError::new(format!("cannot decode column value: {e}")))
}

/// A [`Database`] backed by one SQLite connection.
#[derive(Debug)]
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// # Errors
    ///
    /// [`DatabaseError`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Connection::open_in_memory()
            .map(Self::from_connection)
            .map_err(backend_error)
    }

    /// # Errors
    ///
    /// [`DatabaseError`] if the file cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        Connection::open(path)
            .map(Self::from_connection)
            .map_err(backend_error)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// # Errors
    ///
    /// [`DatabaseError`] if SQLite rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<(), DatabaseError> {
        self.conn.busy_timeout(timeout).map_err(backend_error)
    }

    /// The underlying connection, for schema setup and ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(backend_error)?;
        Ok(affected as u64)
    }

    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
        columns: &[LogicalType],
    ) -> Result<Option<Vec<Value>>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql).map_err(backend_error)?;
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(backend_error)?;

        let Some(row) = rows.next().map_err(backend_error)? else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(columns.len());
        for (idx, logical_type) in columns.iter().enumerate() {
            let cell = row.get_ref(idx).map_err(backend_error)?;
            values.push(decode(cell, *logical_type)?);
        }
        Ok(Some(values))
    }

    fn last_insert_id(&self) -> Result<i64, DatabaseError> {
        Ok(self.conn.last_insert_rowid())
    }
}
