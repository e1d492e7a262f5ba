//! Error types for misconfig-mapper

use thiserror::Error;

/// Main error type for mapper operations
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {kind} pattern for service '{service}': {source}")]
    Pattern {
        service: String,
        kind: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to build request: {0}")]
    Request(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid target URL '{0}'")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;
