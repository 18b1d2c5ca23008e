//! Error types for meshcfg Core

use std::path::PathBuf;

/// Errors loading or validating engine configuration
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Reading the configuration file failed
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML parse failure
    #[error("invalid TOML config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// YAML parse failure
    #[error("invalid YAML config: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// A connection definition cannot be used
    #[error("invalid connection '{id}': {reason}")]
    InvalidConnection {
        /// Connection id, empty when missing
        id: String,
        /// What is wrong with it
        reason: String,
    },
}

impl EngineError {
    /// Whether the error comes from file or parse problems
    #[inline]
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Self::InvalidConnection { .. })
    }
}
