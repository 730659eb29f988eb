//! Engine capabilities.
//!
//! Capabilities can change at runtime (configuration reload), so they
//! are stored as atomics and read fresh on every operation.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::SearchEngine;

/// A capability an operation requires from an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCapability {
    /// Accepts index and delete operations
    Indexing,
    /// Answers autocomplete and search queries
    Autocomplete,
}

impl EngineCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineCapability::Indexing => "indexing",
            EngineCapability::Autocomplete => "autocomplete",
        }
    }

    /// Whether `engine` currently has this capability enabled.
    pub fn is_enabled_on(&self, engine: &dyn SearchEngine) -> bool {
        match self {
            EngineCapability::Indexing => engine.is_indexing_enabled(),
            EngineCapability::Autocomplete => engine.is_autocomplete_enabled(),
        }
    }
}

impl std::fmt::Display for EngineCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime capability flags of one engine.
#[derive(Debug)]
pub struct EngineCapabilities {
    indexing: AtomicBool,
    autocomplete: AtomicBool,
}

impl EngineCapabilities {
    pub fn new(indexing: bool, autocomplete: bool) -> Self {
        Self {
            indexing: AtomicBool::new(indexing),
            autocomplete: AtomicBool::new(autocomplete),
        }
    }

    pub fn indexing_enabled(&self) -> bool {
        self.indexing.load(Ordering::Acquire)
    }

    pub fn autocomplete_enabled(&self) -> bool {
        self.autocomplete.load(Ordering::Acquire)
    }

    pub fn set_indexing(&self, enabled: bool) {
        self.indexing.store(enabled, Ordering::Release);
    }

    pub fn set_autocomplete(&self, enabled: bool) {
        self.autocomplete.store(enabled, Ordering::Release);
    }
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        Self::new(true, true)
    }
}
