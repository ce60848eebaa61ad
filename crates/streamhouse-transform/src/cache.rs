//! Read-through schema cache.
//!
//! Maps schema id to schema text (and its parsed form). Entries are never
//! evicted: the schema behind an id never changes, so the cache only grows
//! until the process exits.

use std::sync::Arc;

use moka::future::Cache;

use crate::error::{Result, TransformError};
use crate::frame::SchemaId;
use crate::registry::SchemaResolver;

/// A schema fetched from the registry together with its parsed form.
#[derive(Debug)]
pub struct ResolvedSchema {
    pub text: Arc<str>,
    pub schema: apache_avro::Schema,
}

impl ResolvedSchema {
    /// Parse schema text. Fails with `Schema` if the text is not valid Avro.
    pub fn parse(text: &str) -> Result<Self> {
        let schema = apache_avro::Schema::parse_str(text)?;
        Ok(Self {
            text: Arc::from(text),
            schema,
        })
    }
}

pub struct SchemaCache {
    entries: Cache<SchemaId, Arc<ResolvedSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Return the schema for `id`, fetching it through `resolver` on a miss.
    ///
    /// Concurrent misses for the same id share one fetch. A failed fetch is not
    /// cached, so the next lookup for that id tries the registry again.
    pub async fn resolve(
        &self,
        id: SchemaId,
        resolver: &dyn SchemaResolver,
    ) -> Result<Arc<ResolvedSchema>> {
        if let Some(schema) = self.entries.get(&id).await {
            tracing::debug!(schema_id = id, "Schema cache hit");
            return Ok(schema);
        }

        tracing::debug!(schema_id = id, "Schema cache miss, querying registry");

        self.entries
            .try_get_with(id, async move {
                let text = resolver.fetch_schema(id).await?;
                ResolvedSchema::parse(&text).map(Arc::new)
            })
            .await
            .map_err(|e| {
                Arc::try_unwrap(e).unwrap_or_else(|shared| match shared.as_ref() {
                    TransformError::Schema(msg) => TransformError::Schema(msg.clone()),
                    other => TransformError::Registry(other.to_string()),
                })
            })
    }

    pub async fn contains(&self, id: SchemaId) -> bool {
        self.entries.get(&id).await.is_some()
    }

    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}
