use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::span::{Span, SpanId, Timestamp};
use crate::timespan::Timespan;

/// Direction in which spans are returned, by creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Position of a span in creation order. Ties on `created_at` break on `id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanCursor {
    pub created_at: Timestamp,
    pub id: SpanId,
}

impl SpanCursor {
    pub fn of(span: &Span) -> Self {
        Self {
            created_at: span.created_at,
            id: span.id,
        }
    }
}

/// Directional, bounded page request relative to optional time boundaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PartialFilter {
    pub order: Order,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub limit: NonZeroUsize,
    /// Only spans strictly past this cursor in `order` are returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<SpanCursor>,
}

impl PartialFilter {
    /// Single newest span created at or before `end`.
    pub fn latest_before(end: Timestamp) -> Self {
        Self {
            order: Order::Desc,
            start: None,
            end: Some(end),
            limit: NonZeroUsize::MIN,
            after: None,
        }
    }

    /// Single oldest span still active at or after `start`.
    pub fn earliest_after(start: Timestamp) -> Self {
        Self {
            order: Order::Asc,
            start: Some(start),
            end: None,
            limit: NonZeroUsize::MIN,
            after: None,
        }
    }

    /// Page of spans intersecting `timespan`, oldest first.
    pub fn window(timespan: &Timespan, limit: NonZeroUsize) -> Self {
        Self {
            order: Order::Asc,
            start: Some(timespan.start()),
            end: Some(timespan.end()),
            limit,
            after: None,
        }
    }

    /// Next page of `timespan` after the span at `cursor`, oldest first.
    pub fn page_after(timespan: &Timespan, cursor: SpanCursor, limit: NonZeroUsize) -> Self {
        Self {
            after: Some(cursor),
            ..Self::window(timespan, limit)
        }
    }

    /// Whether `span` lies past the cursor in this filter's order.
    pub fn is_past_cursor(&self, span: &Span) -> bool {
        match self.after {
            None => true,
            Some(cursor) => match self.order {
                Order::Asc => SpanCursor::of(span) > cursor,
                Order::Desc => SpanCursor::of(span) < cursor,
            },
        }
    }
}

/// Window used solely to request an aggregate count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PartialCountFilter {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl From<&Timespan> for PartialCountFilter {
    fn from(timespan: &Timespan) -> Self {
        Self {
            start: timespan.start(),
            end: timespan.end(),
        }
    }
}

/// Displayed total and whether it is only a lower bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Counts {
    pub value: u64,
    pub is_capped: bool,
}

impl Counts {
    pub fn exact(value: u64) -> Self {
        Self {
            value,
            is_capped: false,
        }
    }

    pub fn capped(value: u64) -> Self {
        Self {
            value,
            is_capped: true,
        }
    }
}

/// Span annotated with graph-layout coordinates derived from its time extent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionedSpan {
    pub span: Span,
    /// Vertical lane; spans sharing a lane never overlap in time.
    pub lane: usize,
}
