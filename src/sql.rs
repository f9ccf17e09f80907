//! SQL text for single-row CRUD by primary key.
//!
//! Builders are pure: they read the schema and record state and return
//! the statement text with its ordered parameters. Identifiers are quoted
//! for the target dialect; values are always `?` placeholders except the
//! UPDATE key, which is inlined as an integer literal.

use crate::dialect::{quote, Dialect};
use crate::error::RecordError;
use crate::schema::SchemaDescriptor;
use crate::state::RecordState;
use crate::value::Value;

/// SQL text plus bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

fn column_list(dialect: Dialect, names: &[&str]) -> String {
    names
        .iter()
        .map(|name| quote(dialect, name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parameters for every non-key column, normalized to the column's type.
fn value_params<'s>(
    schema: &'s SchemaDescriptor,
    state: &RecordState,
) -> Result<(Vec<&'s str>, Vec<Value>), RecordError> {
    let mut names = Vec::new();
    let mut params = Vec::new();
    for column in schema.value_columns() {
        let value = state.get(&column.name)?;
        params.push(value.to_param(&column.name, column.logical_type)?);
        names.push(column.name.as_str());
    }
    Ok((names, params))
}

/// `SELECT <columns> FROM <table> WHERE <pk> = ?`
pub fn select_by_key(dialect: Dialect, schema: &SchemaDescriptor, key: Value) -> Statement {
    let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    Statement {
        sql: format!(
            "SELECT {} FROM {} WHERE {} = ?",
            column_list(dialect, &names),
            quote(dialect, schema.table_name()),
            quote(dialect, schema.primary_key()),
        ),
        params: vec![key],
    }
}

/// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`, primary key excluded.
///
/// # Errors
///
/// [`RecordError::InvalidValue`] when a value cannot be bound as its column type.
pub fn insert(dialect: Dialect, schema: &SchemaDescriptor, state: &RecordState) -> Result<Statement, RecordError> {
    let (names, params) = value_params(schema, state)?;
    let table = quote(dialect, schema.table_name());

    let sql = if names.is_empty() {
        match dialect {
            Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
            _ => format!("INSERT INTO {table} DEFAULT VALUES"),
        }
    } else {
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            column_list(dialect, &names),
            vec!["?"; names.len()].join(", "),
        )
    };

    Ok(Statement { sql, params })
}

/// `UPDATE <table> SET <col> = ?, ... WHERE <pk> = <key>`.
///
/// The key is inlined as an integer literal. Returns `None` when the table
/// has no column besides the primary key.
///
/// # Errors
///
/// [`RecordError::InvalidValue`] when a value cannot be bound as its column type.
pub fn update(
    dialect: Dialect,
    schema: &SchemaDescriptor,
    state: &RecordState,
    key: i64,
) -> Result<Option<Statement>, RecordError> {
    let (names, params) = value_params(schema, state)?;
    if names.is_empty() {
        return Ok(None);
    }

    let assignments = names
        .iter()
        .map(|name| format!("{} = ?", quote(dialect, name)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Some(Statement {
        sql: format!(
            "UPDATE {} SET {assignments} WHERE {} = {key}",
            quote(dialect, schema.table_name()),
            quote(dialect, schema.primary_key()),
        ),
        params,
    }))
}

/// `DELETE FROM <table> WHERE <pk> = ?`, key bound as an integer.
pub fn delete_by_key(dialect: Dialect, schema: &SchemaDescriptor, key: i64) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            quote(dialect, schema.table_name()),
            quote(dialect, schema.primary_key()),
        ),
        params: vec![Value::Int(key)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LogicalType;
    use once_cell::sync::Lazy;

    static CONTACT: Lazy<SchemaDescriptor> = Lazy::new(|| {
        SchemaDescriptor::builder("contact")
            .column("id", LogicalType::Int)
            .column("name", LogicalType::String)
            .column("order", LogicalType::Int)
            .column("active", LogicalType::Bool)
            .build()
            .unwrap()
    });

    static KEY_ONLY: Lazy<SchemaDescriptor> =
        Lazy::new(|| SchemaDescriptor::builder("tick").column("id", LogicalType::Int).build().unwrap());

    #[test]
    fn test_select_by_key() {
        let stmt = select_by_key(Dialect::Sqlite, &CONTACT, Value::Int(3));
        assert_eq!(
            stmt.sql,
            "SELECT `id`, `name`, `order`, `active` FROM `contact` WHERE `id` = ?"
        );
        assert_eq!(stmt.params, vec![Value::Int(3)]);
    }

    #[test]
    fn test_insert_excludes_key_and_fills_zero_values() {
        let mut state = RecordState::new(&CONTACT);
        state.set("id", 99).unwrap();
        state.set("name", "Toto").unwrap();

        let stmt = insert(Dialect::Postgres, &CONTACT, &state).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"contact\" (\"name\", \"order\", \"active\") VALUES (?, ?, ?)"
        );
        assert_eq!(
            stmt.params,
            vec![Value::from("Toto"), Value::Int(0), Value::Bool(false)]
        );
    }

    #[test]
    fn test_insert_without_value_columns() {
        let state = RecordState::new(&KEY_ONLY);
        assert_eq!(
            insert(Dialect::Sqlite, &KEY_ONLY, &state).unwrap().sql,
            "INSERT INTO `tick` DEFAULT VALUES"
        );
        assert_eq!(
            insert(Dialect::MySql, &KEY_ONLY, &state).unwrap().sql,
            "INSERT INTO `tick` () VALUES ()"
        );
    }

    #[test]
    fn test_update_inlines_integer_key() {
        let mut state = RecordState::new(&CONTACT);
        state.set("id", 7).unwrap();
        state.set("order", "3").unwrap();
        state.set("active", true).unwrap();

        let stmt = update(Dialect::SqlServer, &CONTACT, &state, 7).unwrap().unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE [contact] SET [name] = ?, [order] = ?, [active] = ? WHERE [id] = 7"
        );
        assert_eq!(
            stmt.params,
            vec![Value::from(""), Value::Int(3), Value::Bool(true)]
        );
    }

    #[test]
    fn test_update_without_value_columns_is_skipped() {
        let state = RecordState::new(&KEY_ONLY);
        assert_eq!(update(Dialect::Sqlite, &KEY_ONLY, &state, 1).unwrap(), None);
    }

    #[test]
    fn test_update_rejects_unbindable_value() {
        let mut state = RecordState::new(&CONTACT);
        state.set("order", "first").unwrap();
        assert!(matches!(
            update(Dialect::MySql, &CONTACT, &state, 1),
            Err(RecordError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_delete_by_key() {
        let stmt = delete_by_key(Dialect::Unknown, &CONTACT, 4);
        assert_eq!(stmt.sql, "DELETE FROM contact WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::Int(4)]);
    }
}
