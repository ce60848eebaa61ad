//! Host lifecycle adapter.
//!
//! Hosts load the transform, call [`TransformPlugin::on_init`] once with the
//! configured properties, then call [`TransformPlugin::transform`] for every
//! message. A message that arrives before a successful init is rejected with
//! [`TransformError::NotReady`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;

use crate::config::TransformConfig;
use crate::engine::TransformEngine;
use crate::error::{Result, TransformError};
use crate::registry::SchemaResolver;

/// Status reported back to the host for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    Accept,
    Error,
}

/// Result of one message: status plus output (empty on error).
#[derive(Debug)]
pub struct TransformOutput {
    pub status: TransformStatus,
    pub output: Bytes,
    pub error: Option<TransformError>,
}

impl From<Result<Bytes>> for TransformOutput {
    fn from(result: Result<Bytes>) -> Self {
        match result {
            Ok(output) => Self {
                status: TransformStatus::Accept,
                output,
                error: None,
            },
            Err(e) => Self {
                status: TransformStatus::Error,
                output: Bytes::new(),
                error: Some(e),
            },
        }
    }
}

#[derive(Default)]
pub struct TransformPlugin {
    engine: OnceLock<TransformEngine>,
    resolver: Option<Arc<dyn SchemaResolver>>,
}

impl TransformPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugin whose engine resolves registry schemas through `resolver`.
    pub fn with_resolver(resolver: Arc<dyn SchemaResolver>) -> Self {
        Self {
            engine: OnceLock::new(),
            resolver: Some(resolver),
        }
    }

    /// Build the engine from host properties.
    ///
    /// Fails if the properties are invalid or the plugin was already initialized;
    /// in the latter case the existing engine keeps serving.
    pub fn on_init(&self, properties: &HashMap<String, String>) -> Result<()> {
        if self.engine.get().is_some() {
            return Err(TransformError::Config(
                "init method invoked more than once".to_string(),
            ));
        }

        let config = TransformConfig::from_config_map(properties)?;
        let engine = match &self.resolver {
            Some(resolver) => TransformEngine::with_resolver(config, Arc::clone(resolver))?,
            None => TransformEngine::new(config)?,
        };

        self.engine.set(engine).map_err(|_| {
            TransformError::Config("init method invoked more than once".to_string())
        })
    }

    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    pub fn engine(&self) -> Result<&TransformEngine> {
        self.engine.get().ok_or(TransformError::NotReady)
    }

    /// Transform one message, reporting failures through the returned status.
    pub async fn transform(&self, payload: &[u8]) -> TransformOutput {
        let result = match self.engine() {
            Ok(engine) => engine.transform(payload).await,
            Err(e) => {
                tracing::error!(error = %e, "Transform called before init");
                Err(e)
            }
        };
        TransformOutput::from(result)
    }
}
