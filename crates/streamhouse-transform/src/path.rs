//! Slash-delimited path expressions over decoded values.
//!
//! A path such as `2/name` addresses index 2 of an array, then the `name`
//! field of the object found there. Segments that parse as a non-negative
//! integer index arrays (or byte sequences); every other segment is an object key.

use std::borrow::Cow;

use crate::error::{Result, TransformError};
use crate::value::{mismatch, Value};

/// Resolve `path` against `value`, returning the addressed sub-value.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Result<Cow<'a, Value>> {
    match path.split_once('/') {
        Some((step, rest)) => match step_into(value, step)? {
            Cow::Borrowed(next) => resolve_path(next, rest),
            Cow::Owned(next) => resolve_path(&next, rest).map(|v| Cow::Owned(v.into_owned())),
        },
        None => step_into(value, path),
    }
}

fn step_into<'a>(value: &'a Value, step: &str) -> Result<Cow<'a, Value>> {
    match step.parse::<usize>() {
        Ok(index) => match value {
            Value::Array(_) => value.index(index).map(Cow::Borrowed),
            Value::Bytes(bytes) => bytes
                .get(index)
                .map(|b| Cow::Owned(Value::Int(i64::from(*b))))
                .ok_or_else(|| {
                    TransformError::Path(format!(
                        "index {} out of range (len {})",
                        index,
                        bytes.len()
                    ))
                }),
            other => Err(mismatch("array", other)),
        },
        Err(_) => value.get(step).map(Cow::Borrowed),
    }
}
