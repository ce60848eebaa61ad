//! Transform configuration.
//!
//! Parsed once from the host's property table and immutable afterwards.
//!
//! ## Configuration
//!
//! | Key                   | Description                                         | Default          |
//! |-----------------------|-----------------------------------------------------|------------------|
//! | `name`                | Instance name used in logs                          | `avro-transform` |
//! | `schema_file`         | Path to an Avro schema; payloads carry no frame     | (none)           |
//! | `schema_url`          | Registry base URL; payloads carry a schema id frame | (none)           |
//! | `dynamic_csv`         | Use configured columns instead of the fixed fields  | `false`          |
//! | `column_number`       | Number of configured columns                        | required if dynamic |
//! | `value_{i}`           | Path expression of column i (1-based)               | required if dynamic |
//! | `type_{i}`            | `timestamp` or anything else for plain text         | required if dynamic |
//! | `timezone`            | `local`, `UTC`, or a fixed offset like `+08:00`     | `local`          |
//! | `registry_timeout_ms` | Timeout of one registry request                     | `10000`          |
//!
//! Exactly one of `schema_file` and `schema_url` must be set.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TransformError};
use crate::format::{DeclaredType, TimeZoneSpec};
use crate::registry::DEFAULT_REGISTRY_TIMEOUT;

pub const DEFAULT_NAME: &str = "avro-transform";

/// Where record schemas come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Fixed schema text; the whole payload is the record stream.
    Embedded(String),
    /// Registry base URL; each payload starts with a schema id frame.
    Registry(String),
}

/// One output column: where to find the value and how to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub path: String,
    pub declared: DeclaredType,
}

impl Column {
    pub fn new(path: &str, declared: DeclaredType) -> Self {
        Self {
            path: path.to_string(),
            declared,
        }
    }
}

/// How cells are extracted from each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// The fixed `username`, `tweet`, `timestamp`, `photo` layout.
    Static,
    /// Configured columns, in output order.
    Dynamic(Vec<Column>),
}

#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub name: String,
    pub schema_source: SchemaSource,
    pub mode: ExtractionMode,
    pub timezone: TimeZoneSpec,
    pub registry_timeout: Duration,
}

impl TransformConfig {
    /// Static-mode config with an embedded schema.
    pub fn embedded(schema: &str) -> Self {
        Self::with_source(SchemaSource::Embedded(schema.to_string()))
    }

    /// Static-mode config resolving schemas from a registry.
    pub fn registry(base_url: &str) -> Self {
        Self::with_source(SchemaSource::Registry(base_url.to_string()))
    }

    fn with_source(schema_source: SchemaSource) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            schema_source,
            mode: ExtractionMode::Static,
            timezone: TimeZoneSpec::default(),
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.mode = ExtractionMode::Dynamic(columns);
        self
    }

    pub fn with_timezone(mut self, timezone: TimeZoneSpec) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Parse a `TransformConfig` from a string key-value map.
    ///
    /// Reads `schema_file` from disk when present.
    pub fn from_config_map(config: &HashMap<String, String>) -> Result<Self> {
        let name = config
            .get("name")
            .cloned()
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let schema_source = match (config.get("schema_file"), config.get("schema_url")) {
            (Some(_), Some(_)) => {
                return Err(TransformError::Config(
                    "'schema_file' and 'schema_url' are mutually exclusive".to_string(),
                ));
            }
            (Some(file), None) => SchemaSource::Embedded(read_schema_file(file)?),
            (None, Some(url)) => {
                if url.trim().is_empty() {
                    return Err(TransformError::Config(
                        "'schema_url' must not be empty".to_string(),
                    ));
                }
                SchemaSource::Registry(url.trim().to_string())
            }
            (None, None) => {
                return Err(TransformError::Config(
                    "no schema file or URL specified".to_string(),
                ));
            }
        };

        let dynamic = config
            .get("dynamic_csv")
            .map(|s| parse_bool(s))
            .transpose()?
            .unwrap_or(false);

        let mode = if dynamic {
            ExtractionMode::Dynamic(parse_columns(config)?)
        } else {
            ExtractionMode::Static
        };

        let timezone = config
            .get("timezone")
            .map(|s| TimeZoneSpec::from_str_config(s))
            .transpose()?
            .unwrap_or_default();

        let registry_timeout = config
            .get("registry_timeout_ms")
            .map(|s| {
                s.trim().parse::<u64>().map(Duration::from_millis).map_err(|e| {
                    TransformError::Config(format!("invalid registry_timeout_ms: {}", e))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_REGISTRY_TIMEOUT);

        Ok(TransformConfig {
            name,
            schema_source,
            mode,
            timezone,
            registry_timeout,
        })
    }
}

fn read_schema_file(file: &str) -> Result<String> {
    let path = Path::new(file);
    std::fs::read_to_string(path).map_err(|e| {
        TransformError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read schema_file '{}': {}", path.display(), e),
        ))
    })
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        other => Err(TransformError::Config(format!(
            "invalid dynamic_csv '{}': must be a boolean",
            other
        ))),
    }
}

fn parse_columns(config: &HashMap<String, String>) -> Result<Vec<Column>> {
    let count = config
        .get("column_number")
        .ok_or_else(|| {
            TransformError::Config(
                "need to set 'column_number' when 'dynamic_csv' is set".to_string(),
            )
        })?
        .trim()
        .parse::<usize>()
        .map_err(|e| TransformError::Config(format!("invalid column_number: {}", e)))?;

    if count == 0 {
        return Err(TransformError::Config(
            "'column_number' must be a positive integer".to_string(),
        ));
    }

    (1..=count)
        .map(|i| {
            let path = config
                .get(&format!("value_{}", i))
                .ok_or_else(|| TransformError::Config(format!("the value_{} is missing", i)))?;
            if path.is_empty() {
                return Err(TransformError::Config(format!(
                    "the value_{} must not be empty",
                    i
                )));
            }
            let declared = config
                .get(&format!("type_{}", i))
                .ok_or_else(|| TransformError::Config(format!("the type_{} is missing", i)))?;
            Ok(Column::new(path, DeclaredType::from_str_config(declared)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config_map() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("name".to_string(), "tweets".to_string());
        m.insert(
            "schema_url".to_string(),
            "http://localhost:8081".to_string(),
        );
        m
    }

    fn dynamic_config_map() -> HashMap<String, String> {
        let mut m = base_config_map();
        m.insert("dynamic_csv".to_string(), "true".to_string());
        m.insert("column_number".to_string(), "2".to_string());
        m.insert("value_1".to_string(), "username".to_string());
        m.insert("type_1".to_string(), "string".to_string());
        m.insert("value_2".to_string(), "timestamp".to_string());
        m.insert("type_2".to_string(), "timestamp".to_string());
        m
    }

    #[test]
    fn test_config_parse_minimal() {
        let config = TransformConfig::from_config_map(&base_config_map()).unwrap();
        assert_eq!(config.name, "tweets");
        assert_eq!(
            config.schema_source,
            SchemaSource::Registry("http://localhost:8081".to_string())
        );
        assert_eq!(config.mode, ExtractionMode::Static);
        assert_eq!(config.timezone, TimeZoneSpec::Local);
        assert_eq!(config.registry_timeout, DEFAULT_REGISTRY_TIMEOUT);
    }

    #[test]
    fn test_config_default_name() {
        let mut m = base_config_map();
        m.remove("name");
        let config = TransformConfig::from_config_map(&m).unwrap();
        assert_eq!(config.name, DEFAULT_NAME);
    }

    #[test]
    fn test_config_missing_schema_source() {
        let mut m = base_config_map();
        m.remove("schema_url");
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(err.to_string().contains("no schema file or URL specified"));
    }

    #[test]
    fn test_config_both_schema_sources() {
        let mut m = base_config_map();
        m.insert("schema_file".to_string(), "/tmp/schema.avsc".to_string());
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));
    }

    #[test]
    fn test_config_schema_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "string"}}"#).unwrap();

        let mut m = HashMap::new();
        m.insert(
            "schema_file".to_string(),
            file.path().to_string_lossy().into_owned(),
        );
        let config = TransformConfig::from_config_map(&m).unwrap();
        assert_eq!(
            config.schema_source,
            SchemaSource::Embedded(r#"{"type": "string"}"#.to_string())
        );
    }

    #[test]
    fn test_config_unreadable_schema_file() {
        let mut m = HashMap::new();
        m.insert(
            "schema_file".to_string(),
            "/nonexistent/schema.avsc".to_string(),
        );
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(matches!(err, TransformError::Io(_)));
        assert!(err.to_string().contains("/nonexistent/schema.avsc"));
    }

    #[test]
    fn test_config_dynamic_columns() {
        let config = TransformConfig::from_config_map(&dynamic_config_map()).unwrap();
        assert_eq!(
            config.mode,
            ExtractionMode::Dynamic(vec![
                Column::new("username", DeclaredType::Plain),
                Column::new("timestamp", DeclaredType::Timestamp),
            ])
        );
    }

    #[test]
    fn test_config_dynamic_false_ignores_columns() {
        let mut m = dynamic_config_map();
        m.insert("dynamic_csv".to_string(), "FALSE".to_string());
        m.remove("column_number");
        let config = TransformConfig::from_config_map(&m).unwrap();
        assert_eq!(config.mode, ExtractionMode::Static);
    }

    #[test]
    fn test_config_invalid_dynamic_flag() {
        let mut m = dynamic_config_map();
        m.insert("dynamic_csv".to_string(), "maybe".to_string());
        assert!(TransformConfig::from_config_map(&m).is_err());
    }

    #[test]
    fn test_config_missing_column_number() {
        let mut m = dynamic_config_map();
        m.remove("column_number");
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(err.to_string().contains("column_number"));
    }

    #[test]
    fn test_config_invalid_column_number() {
        for bad in ["0", "-1", "two", ""] {
            let mut m = dynamic_config_map();
            m.insert("column_number".to_string(), bad.to_string());
            assert!(
                TransformConfig::from_config_map(&m).is_err(),
                "column_number '{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_config_missing_value_path() {
        let mut m = dynamic_config_map();
        m.remove("value_2");
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(err.to_string().contains("value_2"));
    }

    #[test]
    fn test_config_missing_type() {
        let mut m = dynamic_config_map();
        m.remove("type_1");
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(err.to_string().contains("type_1"));
    }

    #[test]
    fn test_config_column_count_larger_than_columns() {
        let mut m = dynamic_config_map();
        m.insert("column_number".to_string(), "3".to_string());
        let err = TransformConfig::from_config_map(&m).unwrap_err();
        assert!(err.to_string().contains("value_3"));
    }

    #[test]
    fn test_config_timezone_and_timeout() {
        let mut m = base_config_map();
        m.insert("timezone".to_string(), "UTC".to_string());
        m.insert("registry_timeout_ms".to_string(), "250".to_string());
        let config = TransformConfig::from_config_map(&m).unwrap();
        assert_eq!(config.timezone, TimeZoneSpec::utc());
        assert_eq!(config.registry_timeout, Duration::from_millis(250));

        m.insert("registry_timeout_ms".to_string(), "soon".to_string());
        assert!(TransformConfig::from_config_map(&m).is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let config = TransformConfig::embedded(r#"{"type": "string"}"#)
            .with_name("inline")
            .with_timezone(TimeZoneSpec::utc())
            .with_columns(vec![Column::new("0", DeclaredType::Plain)]);
        assert_eq!(config.name, "inline");
        assert!(matches!(config.mode, ExtractionMode::Dynamic(ref c) if c.len() == 1));
    }
}
