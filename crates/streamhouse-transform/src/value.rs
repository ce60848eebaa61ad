//! Decoded record values.
//!
//! [`Value`] is the tagged container every decoded Avro datum is converted into.
//! Field access goes through fallible accessors so a record with an unexpected
//! shape produces a [`TransformError`] instead of a panic.

use std::collections::BTreeMap;

use apache_avro::types::Value as AvroValue;

use crate::error::{Result, TransformError};

/// A decoded datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Short tag name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("int", other)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", other)),
        }
    }

    /// Look up a field of an object.
    ///
    /// Fails with `TypeMismatch` when `self` is not an object and with `Path`
    /// when the key is absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        match self {
            Value::Object(fields) => fields
                .get(key)
                .ok_or_else(|| TransformError::Path(format!("missing field '{}'", key))),
            other => Err(mismatch("object", other)),
        }
    }

    /// Index into an array.
    pub fn index(&self, index: usize) -> Result<&Value> {
        match self {
            Value::Array(items) => items.get(index).ok_or_else(|| {
                TransformError::Path(format!(
                    "index {} out of range (len {})",
                    index,
                    items.len()
                ))
            }),
            other => Err(mismatch("array", other)),
        }
    }

    /// Compact JSON rendering, used for plain columns that address a container.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn mismatch(expected: &'static str, actual: &Value) -> TransformError {
    TransformError::TypeMismatch {
        expected,
        actual: actual.type_name(),
    }
}

impl From<AvroValue> for Value {
    fn from(value: AvroValue) -> Self {
        match value {
            AvroValue::Null => Value::Null,
            AvroValue::Boolean(b) => Value::Bool(b),
            AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => {
                Value::Int(i64::from(i))
            }
            AvroValue::Long(l)
            | AvroValue::TimeMicros(l)
            | AvroValue::TimestampMillis(l)
            | AvroValue::TimestampMicros(l) => Value::Int(l),
            AvroValue::Float(f) => Value::Float(f64::from(f)),
            AvroValue::Double(d) => Value::Float(d),
            AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => Value::Bytes(b),
            AvroValue::String(s) | AvroValue::Enum(_, s) => Value::Text(s),
            AvroValue::Uuid(u) => Value::Text(u.to_string()),
            AvroValue::Union(_, inner) => Value::from(*inner),
            AvroValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            AvroValue::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
            AvroValue::Record(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
            // Decimal, duration and local-timestamp logical types
            other => Value::Text(format!("{:?}", other)),
        }
    }
}
