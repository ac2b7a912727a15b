use std::sync::Arc;

use spanview_protocol::filter::FilterPredicate;
use spanview_protocol::query::PartialFilter;
use spanview_protocol::source::SpanSource;
use spanview_protocol::span::Timestamp;
use tracing::debug;

/// Resolves the creation time of the neighbouring span around a timestamp.
///
/// Both lookups are single-result window queries, so a span whose extent
/// contains the reference time may be reported as its own neighbour. Callers
/// needing strict interval semantics have to filter that case themselves.
#[derive(Clone)]
pub struct TimeWindowNavigator {
    source: Arc<dyn SpanSource>,
    wait: bool,
}

impl TimeWindowNavigator {
    pub fn new(source: Arc<dyn SpanSource>, wait: bool) -> Self {
        Self { source, wait }
    }

    /// Creation time of the newest span created at or before `at`.
    pub async fn before(
        &self,
        filter: Vec<FilterPredicate>,
        at: Timestamp,
    ) -> Option<Timestamp> {
        self.first_created(filter, PartialFilter::latest_before(at))
            .await
    }

    /// Creation time of the oldest span still active at or after `at`.
    pub async fn after(&self, filter: Vec<FilterPredicate>, at: Timestamp) -> Option<Timestamp> {
        self.first_created(filter, PartialFilter::earliest_after(at))
            .await
    }

    async fn first_created(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialFilter,
    ) -> Option<Timestamp> {
        let spans = self.source.get_spans(filter, partial, self.wait).await;
        let found = spans.and_then(|spans| spans.first().map(|span| span.created_at));
        if found.is_none() {
            debug!(order = ?partial.order, "no neighbouring span available");
        }
        found
    }
}
