//! Identifier quoting per database dialect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier-quoting convention of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Sqlite,
    Postgres,
    SqlServer,
    Unknown,
}

impl Dialect {
    /// Map a driver name to a dialect.
    ///
    /// Accepts the usual driver spellings (`pgsql`, `sqlsrv`, `dblib`, ...).
    pub fn from_driver_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Dialect::MySql,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            "pgsql" | "postgres" | "postgresql" => Dialect::Postgres,
            "sqlsrv" | "sqlserver" | "mssql" | "dblib" => Dialect::SqlServer,
            _ => Dialect::Unknown,
        }
    }

    /// Opening and closing quote characters, if the dialect quotes at all.
    fn delimiters(self) -> Option<(char, char)> {
        match self {
            Dialect::MySql | Dialect::Sqlite => Some(('`', '`')),
            Dialect::Postgres => Some(('"', '"')),
            Dialect::SqlServer => Some(('[', ']')),
            Dialect::Unknown => None,
        }
    }

    /// Quote an identifier for this dialect. See [`quote`].
    pub fn quote(self, identifier: &str) -> String {
        quote(self, identifier)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::SqlServer => "sqlserver",
            Dialect::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Quote a table or column name.
///
/// MySQL and SQLite wrap in backticks, PostgreSQL in double quotes, SQL
/// Server in brackets. Unknown dialects pass the identifier through.
/// A closing delimiter inside the identifier is doubled.
pub fn quote(dialect: Dialect, identifier: &str) -> String {
    let Some((open, close)) = dialect.delimiters() else {
        return identifier.to_string();
    };

    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(open);
    for c in identifier.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}
