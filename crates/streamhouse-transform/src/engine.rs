//! Transform engine
//!
//! Turns one payload of Avro records into CSV rows:
//!
//! ```text
//! payload → frame → schema (embedded | cache → registry) → decode loop
//!         → per record: fixed fields | configured columns → CSV rows
//! ```
//!
//! An engine only exists once its configuration has been validated, so every
//! engine value is ready to transform. It is `Send + Sync`; share one instance
//! across tasks behind an `Arc`. The schema cache is the only shared mutable state.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::cache::{ResolvedSchema, SchemaCache};
use crate::config::{Column, ExtractionMode, SchemaSource, TransformConfig};
use crate::decoder::decode_all;
use crate::error::{Result, TransformError};
use crate::format::{format_field, format_first_byte, format_timestamp};
use crate::frame::parse_frame;
use crate::path::resolve_path;
use crate::registry::{HttpSchemaResolver, SchemaResolver};
use crate::row::RowWriter;
use crate::value::Value;

/// Field names of the fixed record layout
pub const STATIC_FIELDS: [&str; 4] = ["username", "tweet", "timestamp", "photo"];

enum SchemaProvider {
    Embedded(Arc<ResolvedSchema>),
    Registry {
        resolver: Arc<dyn SchemaResolver>,
        cache: SchemaCache,
    },
}

pub struct TransformEngine {
    config: TransformConfig,
    schemas: SchemaProvider,
}

impl TransformEngine {
    /// Validate `config` and build an engine.
    ///
    /// Registry mode talks to the registry over HTTP.
    pub fn new(config: TransformConfig) -> Result<Self> {
        let resolver: Option<Arc<dyn SchemaResolver>> = match &config.schema_source {
            SchemaSource::Registry(url) => Some(Arc::new(HttpSchemaResolver::new(
                url,
                config.registry_timeout,
            )?)),
            SchemaSource::Embedded(_) => None,
        };
        Self::build(config, resolver)
    }

    /// Build an engine whose registry lookups go through `resolver`.
    ///
    /// The resolver is unused when the config embeds its schema.
    pub fn with_resolver(config: TransformConfig, resolver: Arc<dyn SchemaResolver>) -> Result<Self> {
        Self::build(config, Some(resolver))
    }

    fn build(config: TransformConfig, resolver: Option<Arc<dyn SchemaResolver>>) -> Result<Self> {
        info!(name = %config.name, "Transform init start");

        if let ExtractionMode::Dynamic(columns) = &config.mode {
            if columns.is_empty() {
                return Err(TransformError::Config(
                    "dynamic mode needs at least one column".to_string(),
                ));
            }
            if let Some(i) = columns.iter().position(|c| c.path.is_empty()) {
                return Err(TransformError::Config(format!(
                    "the value_{} must not be empty",
                    i + 1
                )));
            }
        }

        let schemas = match (&config.schema_source, resolver) {
            (SchemaSource::Embedded(text), _) => {
                SchemaProvider::Embedded(Arc::new(ResolvedSchema::parse(text)?))
            }
            (SchemaSource::Registry(_), Some(resolver)) => SchemaProvider::Registry {
                resolver,
                cache: SchemaCache::new(),
            },
            (SchemaSource::Registry(url), None) => {
                return Err(TransformError::Config(format!(
                    "no resolver available for registry '{}'",
                    url
                )));
            }
        };

        info!(name = %config.name, "Transform init finished");

        Ok(Self { config, schemas })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Number of registry schemas cached so far (always 0 with an embedded schema).
    pub fn cached_schemas(&self) -> u64 {
        match &self.schemas {
            SchemaProvider::Embedded(_) => 0,
            SchemaProvider::Registry { cache, .. } => cache.len(),
        }
    }

    /// Transform one payload into CSV rows, one per decoded record.
    ///
    /// Any error fails the whole invocation and no output is produced.
    pub async fn transform(&self, payload: &[u8]) -> Result<Bytes> {
        info!(name = %self.config.name, bytes = payload.len(), "Start transform");

        let (schema, records) = self.resolve_schema(payload).await?;

        let outcome = decode_all(&schema.schema, records);
        if outcome.discarded > 0 {
            debug!(
                name = %self.config.name,
                discarded = outcome.discarded,
                "Trailing bytes dropped from record stream"
            );
        }

        let mut writer = RowWriter::new();
        for (index, record) in outcome.records.iter().enumerate() {
            let cells = self.extract(record).map_err(|e| {
                warn!(name = %self.config.name, record = index, error = %e, "Failed to extract record");
                e
            })?;
            writer.write_row(&cells);
        }

        info!(name = %self.config.name, rows = writer.rows(), "Finished transform");

        Ok(writer.finish())
    }

    async fn resolve_schema<'p>(
        &self,
        payload: &'p [u8],
    ) -> Result<(Arc<ResolvedSchema>, &'p [u8])> {
        match &self.schemas {
            SchemaProvider::Embedded(schema) => Ok((Arc::clone(schema), payload)),
            SchemaProvider::Registry { resolver, cache } => {
                let (schema_id, records) = parse_frame(payload).map_err(|e| {
                    warn!(name = %self.config.name, error = %e, "Rejecting payload");
                    e
                })?;
                let schema = cache.resolve(schema_id, resolver.as_ref()).await.map_err(|e| {
                    warn!(name = %self.config.name, schema_id, error = %e, "Get registry schema failed");
                    e
                })?;
                Ok((schema, records))
            }
        }
    }

    fn extract(&self, record: &Value) -> Result<Vec<String>> {
        match &self.config.mode {
            ExtractionMode::Static => self.extract_static(record),
            ExtractionMode::Dynamic(columns) => self.extract_columns(record, columns),
        }
    }

    fn extract_columns(&self, record: &Value, columns: &[Column]) -> Result<Vec<String>> {
        columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                resolve_path(record, &column.path)
                    .and_then(|leaf| {
                        format_field(&leaf, column.declared, &self.config.timezone)
                    })
                    .map_err(|e| {
                        warn!(column = i + 1, path = %column.path, error = %e, "Column extraction failed");
                        e
                    })
            })
            .collect()
    }

    fn extract_static(&self, record: &Value) -> Result<Vec<String>> {
        let [username, tweet, timestamp, photo] = STATIC_FIELDS;

        let username = static_field(record, username, "text")?.as_str()?.to_string();
        let tweet = static_field(record, tweet, "text")?.as_str()?.to_string();
        let timestamp = static_field(record, timestamp, "int")?.as_int()?;
        let photo = format_first_byte(static_field(record, photo, "bytes")?)?;

        Ok(vec![
            username,
            tweet,
            format_timestamp(timestamp, &self.config.timezone)?,
            photo,
        ])
    }
}

/// Look up a fixed-layout field; a missing field counts as a type mismatch.
fn static_field<'a>(record: &'a Value, key: &str, expected: &'static str) -> Result<&'a Value> {
    record.get(key).map_err(|e| match e {
        TransformError::Path(_) => TransformError::TypeMismatch {
            expected,
            actual: "missing field",
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DeclaredType, TimeZoneSpec};
    use apache_avro::types::Value as AvroValue;

    const TWEET_SCHEMA: &str = r#"{
        "type": "record",
        "name": "Tweet",
        "fields": [
            {"name": "username", "type": "string"},
            {"name": "tweet", "type": "string"},
            {"name": "timestamp", "type": "long"},
            {"name": "photo", "type": "bytes"}
        ]
    }"#;

    fn encode_tweet(username: &str, tweet: &str, timestamp: i64, photo: &[u8]) -> Vec<u8> {
        let schema = apache_avro::Schema::parse_str(TWEET_SCHEMA).unwrap();
        let record = AvroValue::Record(vec![
            ("username".to_string(), AvroValue::String(username.to_string())),
            ("tweet".to_string(), AvroValue::String(tweet.to_string())),
            ("timestamp".to_string(), AvroValue::Long(timestamp)),
            ("photo".to_string(), AvroValue::Bytes(photo.to_vec())),
        ]);
        apache_avro::to_avro_datum(&schema, record).unwrap()
    }

    fn embedded_engine() -> TransformEngine {
        let config = TransformConfig::embedded(TWEET_SCHEMA).with_timezone(TimeZoneSpec::utc());
        TransformEngine::new(config).unwrap()
    }

    fn record(fields: Vec<(&str, Value)>) -> Value {
        Value::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[tokio::test]
    async fn test_static_mode_embedded_schema() {
        let engine = embedded_engine();
        let mut payload = encode_tweet("a", "hi", 1_700_000_000, b"AB");
        payload.extend(encode_tweet("b", "yo", 0, b"Z"));

        let output = engine.transform(&payload).await.unwrap();
        assert_eq!(
            output,
            Bytes::from("a,hi,2023-11-14 22:13:20,A\nb,yo,1970-01-01 00:00:00,Z\n")
        );
        assert_eq!(engine.cached_schemas(), 0);
    }

    #[tokio::test]
    async fn test_empty_payload_gives_empty_output() {
        let engine = embedded_engine();
        let output = engine.transform(&[]).await.unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_invalid_embedded_schema_fails_construction() {
        let config = TransformConfig::embedded("{not a schema");
        assert!(matches!(
            TransformEngine::new(config),
            Err(TransformError::Schema(_))
        ));
    }

    #[test]
    fn test_empty_columns_fail_construction() {
        let config = TransformConfig::embedded(TWEET_SCHEMA).with_columns(vec![]);
        assert!(matches!(
            TransformEngine::new(config),
            Err(TransformError::Config(_))
        ));
    }

    #[test]
    fn test_static_missing_field_is_type_mismatch() {
        let engine = embedded_engine();
        let rec = record(vec![
            ("username", Value::Text("a".into())),
            ("tweet", Value::Text("hi".into())),
            ("photo", Value::Bytes(vec![65])),
        ]);
        let err = engine.extract(&rec).unwrap_err();
        assert!(matches!(
            err,
            TransformError::TypeMismatch { expected: "int", actual: "missing field" }
        ));
    }

    #[test]
    fn test_static_wrong_tag_is_type_mismatch() {
        let engine = embedded_engine();
        let rec = record(vec![
            ("username", Value::Int(1)),
            ("tweet", Value::Text("hi".into())),
            ("timestamp", Value::Int(0)),
            ("photo", Value::Bytes(vec![65])),
        ]);
        assert!(matches!(
            engine.extract(&rec),
            Err(TransformError::TypeMismatch { expected: "text", actual: "int" })
        ));
        assert!(engine.extract(&Value::Array(vec![])).is_err());
    }

    #[test]
    fn test_dynamic_columns() {
        let config = TransformConfig::embedded(TWEET_SCHEMA)
            .with_timezone(TimeZoneSpec::utc())
            .with_columns(vec![
                Column::new("username", DeclaredType::Plain),
                Column::new("tweet", DeclaredType::Plain),
                Column::new("timestamp", DeclaredType::Timestamp),
                Column::new("photo/0", DeclaredType::Plain),
            ]);
        let engine = TransformEngine::new(config).unwrap();

        let rec = record(vec![
            ("username", Value::Text("a".into())),
            ("tweet", Value::Text("hi".into())),
            ("timestamp", Value::Int(1_700_000_000)),
            ("photo", Value::Array(vec![Value::Int(65), Value::Int(66)])),
        ]);

        assert_eq!(
            engine.extract(&rec).unwrap(),
            vec!["a", "hi", "2023-11-14 22:13:20", "65"]
        );
    }

    #[test]
    fn test_dynamic_column_errors_propagate() {
        let config = TransformConfig::embedded(TWEET_SCHEMA)
            .with_columns(vec![Column::new("username", DeclaredType::Timestamp)]);
        let engine = TransformEngine::new(config).unwrap();
        let rec = record(vec![("username", Value::Text("a".into()))]);
        assert!(matches!(
            engine.extract(&rec),
            Err(TransformError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_extraction_error_fails_invocation() {
        let config = TransformConfig::embedded(TWEET_SCHEMA)
            .with_columns(vec![Column::new("missing", DeclaredType::Plain)]);
        let engine = TransformEngine::new(config).unwrap();
        let payload = encode_tweet("a", "hi", 1, b"A");

        let err = engine.transform(&payload).await.unwrap_err();
        assert!(matches!(err, TransformError::Path(_)));

        // The engine keeps working for later payloads.
        let engine = embedded_engine();
        assert!(engine.transform(&payload).await.is_ok());
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransformEngine>();
    }
}
