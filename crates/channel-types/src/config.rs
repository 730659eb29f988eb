//! Configuration loading for the channel search layer.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/channel-search/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Kind of search engine backing an [`EngineSettings`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Embedded Tantivy index on local disk
    #[default]
    Tantivy,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Tantivy => write!(f, "tantivy"),
        }
    }
}

/// Settings for one search engine.
///
/// The position of an entry in [`Settings::engines`] is its query priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Unique engine name, used for logging and capability reloads
    pub name: String,

    #[serde(default)]
    pub kind: EngineKind,

    /// Index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Whether mutations are propagated to this engine
    #[serde(default = "default_true")]
    pub indexing_enabled: bool,

    /// Whether queries may be routed to this engine
    #[serde(default = "default_true")]
    pub autocomplete_enabled: bool,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,
}

impl EngineSettings {
    pub fn tantivy(name: impl Into<String>, index_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EngineKind::Tantivy,
            index_path: index_path.into(),
            indexing_enabled: true,
            autocomplete_enabled: true,
            writer_memory_mb: default_writer_memory_mb(),
        }
    }

    pub fn with_indexing(mut self, enabled: bool) -> Self {
        self.indexing_enabled = enabled;
        self
    }

    pub fn with_autocomplete(mut self, enabled: bool) -> Self {
        self.autocomplete_enabled = enabled;
        self
    }

    /// Index path with a leading `~/` expanded.
    pub fn expanded_index_path(&self) -> PathBuf {
        expand_home(&self.index_path)
    }
}

fn default_true() -> bool {
    true
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "channel-search")
        .map(|p| p.data_local_dir().join("channel-index"))
        .unwrap_or_else(|| PathBuf::from("./channel-index"))
        .to_string_lossy()
        .to_string()
}

/// Settings for background index propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationSettings {
    /// Upper bound on index jobs running at the same time
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_max_concurrent_jobs() -> usize {
    64
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Channel limit per team passed to the store on save (0 = unlimited)
    #[serde(default)]
    pub max_channels_per_team: i64,

    #[serde(default)]
    pub propagation: PropagationSettings,

    /// Engines in query priority order
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineSettings>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_engines() -> Vec<EngineSettings> {
    vec![EngineSettings::tantivy("tantivy", default_index_path())]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_channels_per_team: 0,
            propagation: PropagationSettings::default(),
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/channel-search/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (CHANNEL_SEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "channel-search")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .set_default("max_channels_per_team", 0_i64)?
            .set_default(
                "propagation.max_concurrent_jobs",
                default_max_concurrent_jobs() as i64,
            )?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: CHANNEL_SEARCH_LOG_LEVEL, CHANNEL_SEARCH_PROPAGATION__MAX_CONCURRENT_JOBS
        builder = builder.add_source(
            Environment::with_prefix("CHANNEL_SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.propagation.max_concurrent_jobs == 0 {
            return Err(ConfigError::Validation(
                "propagation.max_concurrent_jobs must be > 0".to_string(),
            ));
        }
        if self.max_channels_per_team < 0 {
            return Err(ConfigError::Validation(format!(
                "max_channels_per_team must be >= 0, got {}",
                self.max_channels_per_team
            )));
        }

        let mut seen = HashSet::new();
        for engine in &self.engines {
            if engine.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "engine name must not be empty".to_string(),
                ));
            }
            if !seen.insert(engine.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate engine name: {}",
                    engine.name
                )));
            }
            if engine.writer_memory_mb == 0 {
                return Err(ConfigError::Validation(format!(
                    "engine {}: writer_memory_mb must be > 0",
                    engine.name
                )));
            }
        }
        Ok(())
    }

    /// Look up engine settings by name.
    pub fn engine(&self, name: &str) -> Option<&EngineSettings> {
        self.engines.iter().find(|e| e.name == name)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
