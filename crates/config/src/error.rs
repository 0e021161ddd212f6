//! Configuration error types

use thiserror::Error;

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating a plan.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File or directory could not be read
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Not valid YAML, or unknown top-level keys
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Structurally valid YAML describing an invalid plan
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an [`ConfigError::Invalid`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
