//! Field values and their conversion to bound parameters.
//!
//! A record stores [`Value`]s. When a statement is built, each value is
//! normalized to its column's [`LogicalType`]: absent values become the
//! type's zero value (`0`, `""`, `false`) so no column is ever sent as
//! NULL.

use crate::error::RecordError;
use crate::schema::LogicalType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl Value {
    /// Zero value of a logical type.
    pub fn zero(logical_type: LogicalType) -> Self {
        match logical_type {
            LogicalType::Int => Value::Int(0),
            LogicalType::String => Value::String(String::new()),
            LogicalType::Bool => Value::Bool(false),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Null`, `0`, `""`, `"0"` and `false`.
    ///
    /// Save uses this on the primary key to choose between INSERT and UPDATE.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::String(s) => s.is_empty() || s == "0",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => parse_bool(s),
            Value::Null => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
        }
    }

    /// Normalize this value into a parameter of `logical_type`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidValue`] when a string cannot be read as
    /// the requested integer or boolean.
    pub fn to_param(&self, column: &str, logical_type: LogicalType) -> Result<Value, RecordError> {
        let invalid = || RecordError::InvalidValue {
            column: column.to_string(),
            expected: logical_type.to_string(),
            actual: format!("{} {:?}", self.type_name(), self),
        };

        match (logical_type, self) {
            (_, Value::Null) => Ok(Value::zero(logical_type)),
            (LogicalType::Int, Value::Int(_)) => Ok(self.clone()),
            (LogicalType::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
            (LogicalType::Int, Value::String(s)) => {
                s.trim().parse().map(Value::Int).map_err(|_| invalid())
            }
            (LogicalType::String, Value::String(_)) => Ok(self.clone()),
            (LogicalType::String, Value::Int(i)) => Ok(Value::String(i.to_string())),
            (LogicalType::String, Value::Bool(b)) => {
                Ok(Value::String(if *b { "1" } else { "0" }.to_string()))
            }
            (LogicalType::Bool, Value::Bool(_)) => Ok(self.clone()),
            (LogicalType::Bool, Value::Int(i)) => Ok(Value::Bool(*i != 0)),
            (LogicalType::Bool, Value::String(s)) => {
                parse_bool(s).map(Value::Bool).ok_or_else(invalid)
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "" | "0" | "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion between a Rust field type and [`Value`].
///
/// Used by code generated with `#[derive(DbRecord)]`. Reading is lenient:
/// a value that does not fit the field reads as the field's zero value.
pub trait FieldValue: Sized {
    fn from_value(value: &Value) -> Self;
    fn into_value(self) -> Value;
}

macro_rules! impl_field_value_int {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn from_value(value: &Value) -> Self {
                    value
                        .as_int()
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .unwrap_or_default()
                }

                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }
        )*
    };
}

impl_field_value_int!(i8, i16, i32, i64, u8, u16, u32);

// No `From<isize>` for `i64`; the conversion cannot fail on 64-bit and narrower targets.
impl FieldValue for isize {
    fn from_value(value: &Value) -> Self {
        value
            .as_int()
            .and_then(|i| isize::try_from(i).ok())
            .unwrap_or_default()
    }

    fn into_value(self) -> Value {
        i64::try_from(self).map_or(Value::Null, Value::Int)
    }
}

// Floating point is stored as text.
macro_rules! impl_field_value_float {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn from_value(value: &Value) -> Self {
                    match value {
                        Value::String(s) => s.trim().parse().unwrap_or_default(),
                        Value::Int(i) => *i as $ty,
                        _ => 0.0,
                    }
                }

                fn into_value(self) -> Value {
                    Value::String(self.to_string())
                }
            }
        )*
    };
}

impl_field_value_float!(f32, f64);

impl FieldValue for bool {
    fn from_value(value: &Value) -> Self {
        value.as_bool().unwrap_or_default()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FieldValue for String {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn from_value(value: &Value) -> Self {
        if value.is_null() {
            None
        } else {
            Some(T::from_value(value))
        }
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, FieldValue::into_value)
    }
}
