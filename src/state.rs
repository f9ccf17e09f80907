//! Per-record data bag with schema-validated attribute access.

use crate::error::RecordError;
use crate::schema::SchemaDescriptor;
use crate::value::Value;
use std::collections::BTreeMap;

/// Field name to human-readable message, rebuilt on every validation pass.
pub type FieldErrors = BTreeMap<String, String>;

/// The mutable values of one record.
///
/// Every accessor that names a field checks it against the schema first:
/// reading an undeclared field is an error, not a miss.
#[derive(Debug, Clone)]
pub struct RecordState {
    schema: &'static SchemaDescriptor,
    data: BTreeMap<String, Value>,
    errors: FieldErrors,
}

impl RecordState {
    pub fn new(schema: &'static SchemaDescriptor) -> Self {
        Self {
            schema,
            data: BTreeMap::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    fn check_column(&self, name: &str) -> Result<(), RecordError> {
        if self.schema.has_column(name) {
            Ok(())
        } else {
            Err(RecordError::UnknownColumn {
                table: self.schema.table_name().to_string(),
                column: name.to_string(),
            })
        }
    }

    /// Current value of a column, `Value::Null` when unset.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownColumn`] if `name` is not a column.
    pub fn get(&self, name: impl AsRef<str>) -> Result<Value, RecordError> {
        let name = name.as_ref();
        self.check_column(name)?;
        Ok(self.data.get(name).cloned().unwrap_or_default())
    }

    /// # Errors
    ///
    /// [`RecordError::UnknownColumn`] if `name` is not a column.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Result<(), RecordError> {
        let name = name.as_ref();
        self.check_column(name)?;
        self.data.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Whether the field holds a non-null value. Never fails.
    pub fn has(&self, name: impl AsRef<str>) -> bool {
        self.data.get(name.as_ref()).is_some_and(|v| !v.is_null())
    }

    /// Clear a field. Clearing an unset field is a no-op.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownColumn`] if `name` is not a column.
    pub fn unset(&mut self, name: impl AsRef<str>) -> Result<(), RecordError> {
        let name = name.as_ref();
        self.check_column(name)?;
        self.data.remove(name);
        Ok(())
    }

    /// Merge values into the current state, overwriting existing keys.
    ///
    /// All keys are checked before anything is written, so a failed bind
    /// leaves the state untouched.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownColumn`] for the first key that is not a column.
    pub fn bind<I, K, V>(&mut self, values: I) -> Result<(), RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values: Vec<(String, Value)> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        for (name, _) in &values {
            self.check_column(name)?;
        }
        self.data.extend(values);
        Ok(())
    }

    /// Snapshot of every field currently held.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data.clone()
    }

    /// Snapshot as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or_default()))
                .collect(),
        )
    }

    /// [`bind`](Self::bind) from a JSON object.
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidValue`] if the input is not an object or holds
    /// a value that is not null, bool, integer or string;
    /// [`RecordError::UnknownColumn`] for unknown keys.
    pub fn bind_json(&mut self, json: serde_json::Value) -> Result<(), RecordError> {
        let serde_json::Value::Object(object) = json else {
            return Err(RecordError::InvalidValue {
                column: self.schema.table_name().to_string(),
                expected: "object".to_string(),
                actual: json.to_string(),
            });
        };

        let mut values = Vec::with_capacity(object.len());
        for (name, raw) in object {
            let value = serde_json::from_value::<Value>(raw.clone()).map_err(|_| RecordError::InvalidValue {
                column: name.clone(),
                expected: "null, bool, integer or string".to_string(),
                actual: raw.to_string(),
            })?;
            values.push((name, value));
        }
        self.bind(values)
    }

    /// Current primary-key value, `Value::Null` when unset.
    pub fn primary_key_value(&self) -> Value {
        self.data
            .get(self.schema.primary_key())
            .cloned()
            .unwrap_or_default()
    }

    /// Record a validation message for a field.
    pub fn set_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub(crate) fn replace_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Write without a schema check; for values the engine already validated.
    pub(crate) fn put(&mut self, name: &str, value: Value) {
        self.data.insert(name.to_string(), value);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.data.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LogicalType, SchemaDescriptor};
    use fake::{Fake, Faker};
    use once_cell::sync::Lazy;

    static SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
        SchemaDescriptor::builder("contact")
            .column("id", LogicalType::Int)
            .column("name", LogicalType::String)
            .column("order", LogicalType::Int)
            .column("active", LogicalType::Bool)
            .build()
            .unwrap()
    });

    fn state() -> RecordState {
        RecordState::new(&SCHEMA)
    }

    #[test]
    fn test_get_after_set_returns_value() {
        let mut state = state();
        for _ in 0..20 {
            let order: i64 = Faker.fake();
            let name: String = Faker.fake();
            let active: bool = Faker.fake();

            state.set("order", order).unwrap();
            state.set("name", name.clone()).unwrap();
            state.set("active", active).unwrap();

            assert_eq!(state.get("order").unwrap(), Value::Int(order));
            assert_eq!(state.get("name").unwrap(), Value::String(name));
            assert_eq!(state.get("active").unwrap(), Value::Bool(active));
        }
    }

    #[test]
    fn test_unknown_column_always_fails() {
        let mut state = state();
        assert!(matches!(state.get("email"), Err(RecordError::UnknownColumn { .. })));
        assert!(matches!(state.set("email", "x"), Err(RecordError::UnknownColumn { .. })));
        assert!(matches!(state.unset("email"), Err(RecordError::UnknownColumn { .. })));

        state.set("name", "Toto").unwrap();
        let err = state.get("email").unwrap_err();
        assert_eq!(err.to_string(), "email is not in the table schema.");
    }

    #[test]
    fn test_has_never_fails() {
        let mut state = state();
        assert!(!state.has("email"));
        assert!(!state.has("order"));
        state.set("order", 1).unwrap();
        assert!(state.has("order"));
        state.set("order", Value::Null).unwrap();
        assert!(!state.has("order"));
    }

    #[test]
    fn test_unset_is_idempotent() {
        let mut state = state();
        state.set("order", 1).unwrap();
        state.unset("order").unwrap();
        assert!(!state.has("order"));
        assert_eq!(state.get("order").unwrap(), Value::Null);
        state.unset("order").unwrap();
    }

    #[test]
    fn test_bind_is_additive() {
        let mut state = state();
        state.set("name", "Toto").unwrap();
        state.set("order", 1).unwrap();

        state
            .bind([("order", Value::Int(2)), ("active", Value::Bool(true))])
            .unwrap();

        let expected: BTreeMap<String, Value> = [
            ("name".to_string(), Value::from("Toto")),
            ("order".to_string(), Value::Int(2)),
            ("active".to_string(), Value::Bool(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(state.to_map(), expected);
    }

    #[test]
    fn test_bind_unknown_key_writes_nothing() {
        let mut state = state();
        let err = state
            .bind([("name", Value::from("x")), ("email", Value::from("y"))])
            .unwrap_err();
        assert!(matches!(err, RecordError::UnknownColumn { ref column, .. } if column == "email"));
        assert!(state.to_map().is_empty());
    }

    #[test]
    fn test_json_projection() {
        let mut state = state();
        state
            .bind_json(serde_json::json!({"id": 1, "name": "John Lennon", "active": false}))
            .unwrap();
        assert_eq!(
            state.to_json(),
            serde_json::json!({"id": 1, "name": "John Lennon", "active": false})
        );

        assert!(state.bind_json(serde_json::json!([1, 2])).is_err());
        assert!(state.bind_json(serde_json::json!({"order": 1.5})).is_err());
    }

    #[test]
    fn test_errors_map() {
        let mut state = state();
        state.set_error("name", "Name is required");
        assert_eq!(state.errors().get("name").unwrap(), "Name is required");
        state.replace_errors(FieldErrors::new());
        assert!(state.errors().is_empty());
    }
}
