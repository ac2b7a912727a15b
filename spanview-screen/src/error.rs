use spanview_core::SpanViewError;
use spanview_protocol::filter::ParseError;
use thiserror::Error;

use crate::slot::SlotKind;

/// Errors surfaced by the screen coordinator and its views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("invalid filter: {0}")]
    Parse(#[from] ParseError),
    #[error("no data available for {slot} query")]
    QueryUnavailable { slot: SlotKind },
    #[error("{slot} result superseded by a newer request")]
    StaleResult { slot: SlotKind },
    #[error("time window is pinned to now while live tail is active")]
    LiveTailActive,
    #[error("column index {index} out of range for {len} columns")]
    ColumnIndex { index: usize, len: usize },
    #[error("cannot remove column: at least {min} columns are required")]
    ColumnMinimum { min: usize },
}

impl From<ScreenError> for SpanViewError {
    fn from(err: ScreenError) -> Self {
        match err {
            ScreenError::Parse(parse) => SpanViewError::ParseError(parse.to_string()),
            ScreenError::QueryUnavailable { slot } => {
                SpanViewError::QueryUnavailable(slot.to_string())
            }
            ScreenError::StaleResult { slot } => SpanViewError::StaleResult(slot.to_string()),
            ScreenError::LiveTailActive => SpanViewError::LiveTailActive,
            other => SpanViewError::GeneralError(other.to_string()),
        }
    }
}
