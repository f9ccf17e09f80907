//! PostgreSQL database handle over `may_postgres`.
//!
//! Statements arrive with `?` placeholders and are rewritten to `$n`.
//! Each statement is prepared first so parameters can be converted to the
//! exact width the server expects (`INT2`/`INT4`/`INT8`, `FLOAT4`/`FLOAT8`).

use crate::database::{Database, DatabaseError};
use crate::dialect::Dialect;
use crate::error::ConnectionError;
use crate::schema::LogicalType;
use crate::value::Value;
use may_postgres::types::{ToSql, Type};
use may_postgres::{Client, Row};

fn backend_error(err: may_postgres::Error) -> DatabaseError {
    DatabaseError::new(err.to_string())
}

/// Rewrite `?` placeholders to `$1`, `$2`, ... outside quoted text.
pub fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut n = 0;

    for c in sql.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                out.push(c);
            }
            (Some(q), _) if c == q => {
                quote = None;
                out.push(c);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

/// Floats travel as text; the empty string is the zero value.
fn parse_float<F: std::str::FromStr + Default>(value: &Value) -> Option<F> {
    let text = value.to_string();
    let text = text.trim();
    if text.is_empty() {
        Some(F::default())
    } else {
        text.parse().ok()
    }
}

/// Convert a bound value to the parameter type the server declared.
fn to_param(value: &Value, ty: &Type) -> Result<Box<dyn ToSql>, DatabaseError> {
    let invalid = || DatabaseError::new(format!("cannot bind {value:?} as {ty}"));

    let param: Box<dyn ToSql> = match *ty {
        Type::BOOL => Box::new(value.as_bool().ok_or_else(invalid)?),
        Type::INT2 => Box::new(
            value
                .as_int()
                .and_then(|i| i16::try_from(i).ok())
                .ok_or_else(invalid)?,
        ),
        Type::INT4 => Box::new(
            value
                .as_int()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(invalid)?,
        ),
        Type::INT8 => Box::new(value.as_int().ok_or_else(invalid)?),
        Type::FLOAT4 => Box::new(parse_float::<f32>(value).ok_or_else(invalid)?),
        Type::FLOAT8 => Box::new(parse_float::<f64>(value).ok_or_else(invalid)?),
        _ => Box::new(value.to_string()),
    };
    Ok(param)
}

fn decode(row: &Row, idx: usize, logical_type: LogicalType) -> Result<Value, DatabaseError> {
    let ty = row.columns()[idx].type_().clone();
    let raw = match ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|i| Value::Int(i64::from(i)))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|i| Value::Int(i64::from(i)))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::Int)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|f| Value::String(f.to_string()))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map(|v| v.map(|f| Value::String(f.to_string()))),
        _ => row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::String)),
    }
    .map_err(backend_error)?;

    match raw {
        None => Ok(Value::Null),
        Some(value) => value
            .to_param("", logical_type)
            .map_err(|e| DatabaseError::new(format!("cannot decode column value: {e}"))),
    }
}

/// A [`Database`] backed by one `may_postgres` client.
pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    /// # Errors
    ///
    /// [`ConnectionError::Backend`] if the server refuses the connection.
    pub fn connect(url: &str) -> Result<Self, ConnectionError> {
        may_postgres::connect(url)
            .map(Self::new)
            .map_err(|e| ConnectionError::Backend(e.to_string()))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn bind(&self, sql: &str, params: &[Value]) -> Result<(may_postgres::Statement, Vec<Box<dyn ToSql>>), DatabaseError> {
        let stmt = self
            .client
            .prepare(&number_placeholders(sql))
            .map_err(backend_error)?;
        let bound = params
            .iter()
            .zip(stmt.params())
            .map(|(value, ty)| to_param(value, ty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((stmt, bound))
    }
}

impl Database for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        let (stmt, bound) = self.bind(sql, params)?;
        let refs: Vec<&dyn ToSql> = bound.iter().map(AsRef::as_ref).collect();
        self.client.execute(&stmt, &refs).map_err(backend_error)
    }

    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
        columns: &[LogicalType],
    ) -> Result<Option<Vec<Value>>, DatabaseError> {
        let (stmt, bound) = self.bind(sql, params)?;
        let refs: Vec<&dyn ToSql> = bound.iter().map(AsRef::as_ref).collect();
        let rows = self.client.query(&stmt, &refs).map_err(backend_error)?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        columns
            .iter()
            .enumerate()
            .map(|(idx, ty)| decode(row, idx, *ty))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn last_insert_id(&self) -> Result<i64, DatabaseError> {
        let row = self
            .client
            .query_one("SELECT lastval()", &[])
            .map_err(backend_error)?;
        row.try_get::<_, i64>(0).map_err(backend_error)
    }
}
