use async_trait::async_trait;

use crate::filter::{FilterPredicate, ParseError};
use crate::query::{Counts, PartialCountFilter, PartialFilter, PositionedSpan};
use crate::span::Span;

/// Data-access layer that resolves filters into spans, positioned spans or counts.
///
/// Every method answers `None` when no data is available yet. When `wait` is
/// set the call may suspend until the backing data has materialised instead.
#[async_trait]
pub trait SpanSource: Send + Sync + 'static {
    async fn get_spans(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialFilter,
        wait: bool,
    ) -> Option<Vec<Span>>;

    async fn get_positioned_spans(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialFilter,
        wait: bool,
    ) -> Option<Vec<PositionedSpan>>;

    /// `cache` allows the source to answer from a previously computed count.
    async fn get_span_counts(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialCountFilter,
        wait: bool,
        cache: bool,
    ) -> Option<Counts>;
}

/// Turns raw filter text into validated predicates.
#[async_trait]
pub trait FilterParser: Send + Sync + 'static {
    async fn parse_span_filter(&self, text: &str) -> Result<Vec<FilterPredicate>, ParseError>;
}
