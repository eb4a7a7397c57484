//! Error types for the core library.

use thiserror::Error;

/// A field rule could not be built or run.
///
/// Rule failures are isolated: the registry logs them and treats the
/// affected rule as having produced no candidates.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Extractor for {field} failed: {message}")]
    Failed { field: String, message: String },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}
