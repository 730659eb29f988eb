//! Registry of active search engines.
//!
//! The registry is process-wide: initialized once at startup, updated on
//! configuration reload, read by every mutation and query. Readers get a
//! snapshot that stays valid for the whole operation even if the list is
//! swapped concurrently.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use channel_types::EngineSettings;

use crate::capability::EngineCapability;
use crate::engine::EngineHandle;

/// Point-in-time view of one engine for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub name: String,
    pub indexing_enabled: bool,
    pub autocomplete_enabled: bool,
}

/// Ordered set of active engines. Order is query priority.
#[derive(Default)]
pub struct SearchEngineRegistry {
    engines: RwLock<Vec<EngineHandle>>,
}

impl SearchEngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engines(engines: Vec<EngineHandle>) -> Self {
        Self {
            engines: RwLock::new(engines),
        }
    }

    /// Snapshot of every active engine in priority order.
    pub fn active_engines(&self) -> Vec<EngineHandle> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of active engines that currently have `capability` enabled.
    pub fn engines_with(&self, capability: EngineCapability) -> Vec<EngineHandle> {
        self.active_engines()
            .into_iter()
            .filter(|engine| capability.is_enabled_on(engine.as_ref()))
            .collect()
    }

    /// Append an engine with the lowest priority.
    pub fn register(&self, engine: EngineHandle) {
        info!(engine = %engine.name(), "Registered search engine");
        self.engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(engine);
    }

    /// Replace the whole engine list at once.
    pub fn set_engines(&self, engines: Vec<EngineHandle>) {
        let names: Vec<String> = engines.iter().map(|e| e.name().to_string()).collect();
        *self.engines.write().unwrap_or_else(PoisonError::into_inner) = engines;
        info!(engines = ?names, "Replaced active search engines");
    }

    /// Look up an engine by name.
    pub fn get(&self, name: &str) -> Option<EngineHandle> {
        self.active_engines().into_iter().find(|e| e.name() == name)
    }

    /// Apply capability flags from reloaded settings.
    ///
    /// Engines are matched by name; returns how many were updated. Engines
    /// missing from `settings` keep their current flags.
    pub fn apply_settings(&self, settings: &[EngineSettings]) -> usize {
        let mut updated = 0;
        for engine in self.active_engines() {
            match settings.iter().find(|s| s.name == engine.name()) {
                Some(s) => {
                    let caps = engine.capabilities();
                    caps.set_indexing(s.indexing_enabled);
                    caps.set_autocomplete(s.autocomplete_enabled);
                    debug!(
                        engine = %engine.name(),
                        indexing = s.indexing_enabled,
                        autocomplete = s.autocomplete_enabled,
                        "Applied engine capabilities"
                    );
                    updated += 1;
                }
                None => {
                    warn!(engine = %engine.name(), "No settings for active engine, keeping capabilities");
                }
            }
        }
        updated
    }

    /// Status of every active engine.
    pub fn status(&self) -> Vec<EngineStatus> {
        self.active_engines()
            .iter()
            .map(|e| EngineStatus {
                name: e.name().to_string(),
                indexing_enabled: e.is_indexing_enabled(),
                autocomplete_enabled: e.is_autocomplete_enabled(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
