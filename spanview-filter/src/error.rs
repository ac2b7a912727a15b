use spanview_protocol::filter::ParseError;
use thiserror::Error;

/// Errors returned when filter text cannot be parsed or predicates cannot be compiled.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid regex /{pattern}/: {message}")]
    InvalidRegex { pattern: String, message: String },
}

impl FilterError {
    pub fn invalid_regex(pattern: impl Into<String>, source: &regex::Error) -> Self {
        FilterError::InvalidRegex {
            pattern: pattern.into(),
            message: source.to_string(),
        }
    }
}
