//! Query routing with engine fallback.
//!
//! A single linear pass over the active engines in priority order. The
//! first eligible engine that answers without an error wins, even with an
//! empty answer. Engine errors are logged and the next engine is tried.
//! `None` means the caller must fall back to the primary store.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use channel_search::{EngineCapability, EngineError, EngineHandle, SearchEngineRegistry};

/// The accepted answer of one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed<T> {
    pub engine: String,
    pub value: T,
}

pub struct QueryRouter {
    registry: Arc<SearchEngineRegistry>,
}

impl QueryRouter {
    pub fn new(registry: Arc<SearchEngineRegistry>) -> Self {
        Self { registry }
    }

    /// Run `query` against eligible engines until one succeeds.
    pub async fn route<T, F, Fut>(&self, capability: EngineCapability, mut query: F) -> Option<Routed<T>>
    where
        F: FnMut(EngineHandle) -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        for engine in self.registry.active_engines() {
            if !capability.is_enabled_on(engine.as_ref()) {
                debug!(engine = %engine.name(), capability = %capability, "Engine not eligible, skipping");
                continue;
            }

            let name = engine.name().to_string();
            match query(engine).await {
                Ok(value) => {
                    debug!(engine = %name, "Engine answered query");
                    return Some(Routed {
                        engine: name,
                        value,
                    });
                }
                Err(e) => {
                    warn!(engine = %name, error = %e, "Engine query failed, trying next engine");
                }
            }
        }

        debug!(capability = %capability, "No engine answered, falling back to store");
        None
    }
}
