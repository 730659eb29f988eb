//! Error types shared across the channel search layer.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration was read but holds invalid values
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Config(err.to_string())
    }
}
