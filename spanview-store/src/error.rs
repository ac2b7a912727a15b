use std::path::PathBuf;

use spanview_core::SpanViewError;
use thiserror::Error;

/// Errors raised while loading spans into a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read spans from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse spans from {path}: {message}")]
    Parse { path: String, message: String },
}

impl StoreError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        StoreError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for SpanViewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, .. } => SpanViewError::IoError(source),
            parse @ StoreError::Parse { .. } => {
                SpanViewError::DeserializationError(parse.to_string())
            }
        }
    }
}
