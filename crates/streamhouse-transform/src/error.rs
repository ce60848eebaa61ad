//! Error types for the Avro transform stage.
//!
//! Errors fall into two groups:
//!
//! - **Construction errors** (`Config`, `Schema` for an embedded schema, `Io`):
//!   raised while building a [`TransformEngine`](crate::TransformEngine). An engine
//!   that fails construction never processes messages.
//! - **Per-invocation errors** (`NotReady`, `Framing`, `Registry`, `Schema` for a
//!   registry schema, `Path`, `TypeMismatch`): reported for a single payload. The
//!   invocation produces no output and the engine stays usable.
//!
//! A decode failure inside the record stream is not an error; it ends the stream.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Invalid or missing configuration property.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A payload was submitted before the engine finished initialization.
    #[error("Transform invoked before initialization completed")]
    NotReady,

    /// Payload does not start with a valid `[magic][schema_id]` header.
    #[error("Framing error: {0}")]
    Framing(String),

    /// Schema registry request failed (non-200 status or transport error).
    #[error("Schema registry error: {0}")]
    Registry(String),

    /// Schema text could not be parsed as Avro.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// Path expression does not address a value in the record.
    #[error("Path error: {0}")]
    Path(String),

    /// A value's tag disagrees with what the column or field expects.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Returns true for errors that can only occur while building an engine.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, TransformError::Config(_) | TransformError::Io(_))
    }
}

impl From<apache_avro::Error> for TransformError {
    fn from(e: apache_avro::Error) -> Self {
        TransformError::Schema(e.to_string())
    }
}
