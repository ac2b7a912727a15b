use std::io;

use thiserror::Error;

/// Result type used across the spanview crates.
pub type Result<T> = std::result::Result<T, SpanViewError>;

/// Canonical error representation shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum SpanViewError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("invalid filter: {0}")]
    ParseError(String),

    #[error("query unavailable: {0}")]
    QueryUnavailable(String),

    #[error("stale result discarded for slot {0}")]
    StaleResult(String),

    #[error("invalid timespan: {0}")]
    InvalidTimespan(String),

    #[error("timespan is locked while live-tail is active")]
    LiveTailActive,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for SpanViewError {
    fn from(err: serde_json::Error) -> Self {
        SpanViewError::DeserializationError(err.to_string())
    }
}

impl From<anyhow::Error> for SpanViewError {
    fn from(err: anyhow::Error) -> Self {
        SpanViewError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for SpanViewError {
    fn from(value: ConfigError) -> Self {
        SpanViewError::ConfigError(value.to_string())
    }
}
