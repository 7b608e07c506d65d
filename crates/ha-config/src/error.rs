//! Error types for sensor configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or reading sensor configuration
///
/// Every variant is structural: the configuration itself cannot be read, so
/// nothing built from it can be trusted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document or one of its sections is not a mapping
    #[error("section '{section}' must be a mapping of parameter names to values")]
    InvalidSection { section: String },

    /// A parameter holds a sequence or mapping instead of a scalar
    #[error("parameter '{key}' in section '{section}' must be a scalar value")]
    NonScalarParameter { section: String, key: String },

    /// Secret not found
    #[error("secret '{key}' not found in secrets.yaml")]
    SecretNotFound { key: String },

    /// Environment variable not found
    #[error("environment variable '{var}' not set")]
    EnvVarNotFound { var: String },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
