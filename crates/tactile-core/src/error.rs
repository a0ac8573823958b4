//! Error types for configuration loading.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML could not be parsed into the configuration shape.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),

    /// A field holds a value the recognizer or agents cannot use.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
