//! HTTP client for schema lookups
//!
//! Fetches schema text by numeric id from a Confluent-compatible registry:
//! `GET {base_url}/schemas/ids/{id}`. The response body is used verbatim.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TransformError};
use crate::frame::SchemaId;

/// Default timeout for a single registry request
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of schema text for a schema id.
///
/// Failures are surfaced immediately; callers never retry.
#[async_trait]
pub trait SchemaResolver: Send + Sync {
    async fn fetch_schema(&self, id: SchemaId) -> Result<String>;
}

/// Registry-backed resolver using reqwest
pub struct HttpSchemaResolver {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpSchemaResolver {
    /// Create a resolver for the registry at `base_url` (e.g. "http://localhost:8081")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TransformError::Config(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn schema_url(&self, id: SchemaId) -> String {
        format!("{}/schemas/ids/{}", self.base_url, id)
    }
}

#[async_trait]
impl SchemaResolver for HttpSchemaResolver {
    async fn fetch_schema(&self, id: SchemaId) -> Result<String> {
        let url = self.schema_url(id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransformError::Registry(format!("failed to fetch schema {}: {}", id, e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransformError::Registry(format!(
                "unexpected status code {} for schema {}",
                status, id
            )));
        }

        let body = response.text().await.map_err(|e| {
            TransformError::Registry(format!("failed to read response body: {}", e))
        })?;

        tracing::debug!(schema_id = id, bytes = body.len(), "Schema fetched from registry");

        Ok(body)
    }
}
