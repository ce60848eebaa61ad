//! StreamHouse Avro Transform
//!
//! A pipeline stage that decodes Avro records and re-emits them as CSV rows.
//!
//! # Features
//!
//! - **Schema sources**: an embedded schema file, or a Confluent-compatible
//!   registry addressed by the `[0x00][schema_id]` frame at the start of each payload
//! - **Caching**: registry schemas are fetched once per id and kept for the
//!   lifetime of the engine
//! - **Column extraction**: a fixed four-field layout, or configured columns
//!   addressed by slash-delimited paths (`orders/0/total`) with optional
//!   timestamp rendering
//!
//! # Usage
//!
//! ```ignore
//! use streamhouse_transform::{TransformConfig, TransformEngine};
//!
//! let config = TransformConfig::from_config_map(&properties)?;
//! let engine = TransformEngine::new(config)?;
//!
//! let csv = engine.transform(&payload).await?;
//! ```

pub mod cache;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod format;
pub mod frame;
pub mod path;
pub mod plugin;
pub mod registry;
pub mod row;
pub mod value;

pub use cache::{ResolvedSchema, SchemaCache};
pub use config::{Column, ExtractionMode, SchemaSource, TransformConfig};
pub use decoder::{decode_all, DecodeOutcome};
pub use engine::TransformEngine;
pub use error::{Result, TransformError};
pub use format::{format_field, DeclaredType, TimeZoneSpec};
pub use frame::{encode_frame, parse_frame, SchemaId};
pub use path::resolve_path;
pub use plugin::{TransformOutput, TransformPlugin, TransformStatus};
pub use registry::{HttpSchemaResolver, SchemaResolver};
pub use row::RowWriter;
pub use value::Value;
