use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use spanview_core::serde_utils::from_ndjson_str;
use spanview_filter::SpanMatcher;
use spanview_protocol::filter::FilterPredicate;
use spanview_protocol::query::{Counts, Order, PartialCountFilter, PartialFilter, PositionedSpan};
use spanview_protocol::source::SpanSource;
use spanview_protocol::span::{Span, SpanId, Timestamp};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::layout::assign_lanes;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CountKey {
    filter: Vec<FilterPredicate>,
    start: Timestamp,
    end: Timestamp,
}

#[derive(Default)]
struct StoreInner {
    /// Ordered by `(created_at, id)`.
    spans: Vec<Span>,
    count_cache: HashMap<CountKey, Counts>,
}

/// In-memory span store answering screen queries.
///
/// Data is considered materialised once [`MemoryStore::mark_materialized`] is
/// called (immediately for [`MemoryStore::new`]). Until then queries made
/// without `wait` answer `None` and queries with `wait` suspend.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
    materialized: Arc<watch::Sender<bool>>,
    count_cap: u64,
}

impl MemoryStore {
    /// Creates an empty, materialised store.
    pub fn new(count_cap: u64) -> Self {
        let store = Self::pending(count_cap);
        store.mark_materialized();
        store
    }

    /// Creates an empty store whose data is not yet available.
    pub fn pending(count_cap: u64) -> Self {
        let (materialized, _) = watch::channel(false);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            materialized: Arc::new(materialized),
            count_cap,
        }
    }

    /// Loads spans from a newline-delimited JSON file into a materialised store.
    pub async fn from_ndjson_file(
        path: impl AsRef<Path>,
        count_cap: u64,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| StoreError::from_io(path, err))?;
        let spans: Vec<Span> =
            from_ndjson_str(&raw).map_err(|err| StoreError::parse_error(path, err.to_string()))?;

        info!(path = %path.display(), spans = spans.len(), "loaded spans");
        let store = Self::new(count_cap);
        store.extend(spans);
        Ok(store)
    }

    pub fn mark_materialized(&self) {
        self.materialized.send_replace(true);
    }

    pub fn is_materialized(&self) -> bool {
        *self.materialized.borrow()
    }

    pub fn len(&self) -> usize {
        self.inner.read().spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().spans.is_empty()
    }

    /// Inserts a span, replacing any previous version with the same id.
    pub fn insert(&self, span: Span) {
        self.extend(std::iter::once(span));
    }

    /// Inserts many spans at once, replacing previous versions by id.
    pub fn extend(&self, spans: impl IntoIterator<Item = Span>) {
        let mut inner = self.inner.write();
        for span in spans {
            if let Some(existing) = inner.spans.iter().position(|s| s.id == span.id) {
                inner.spans.remove(existing);
            }
            let key = (span.created_at, span.id);
            let index = inner
                .spans
                .partition_point(|s| (s.created_at, s.id) < key);
            inner.spans.insert(index, span);
        }
        inner.count_cache.clear();
    }

    pub fn get(&self, id: SpanId) -> Option<Span> {
        self.inner.read().spans.iter().find(|s| s.id == id).cloned()
    }

    async fn ready(&self, wait: bool) -> bool {
        if self.is_materialized() {
            return true;
        }
        if !wait {
            return false;
        }

        let mut receiver = self.materialized.subscribe();
        let ready = receiver.wait_for(|ready| *ready).await.is_ok();
        ready
    }

    fn matcher(filter: &[FilterPredicate]) -> Option<SpanMatcher> {
        match SpanMatcher::compile(filter) {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                warn!(error = %err, "filter could not be compiled");
                None
            }
        }
    }

    fn select(&self, matcher: &SpanMatcher, partial: &PartialFilter) -> Vec<Span> {
        let inner = self.inner.read();
        let candidates = inner
            .spans
            .iter()
            .filter(|span| span.intersects(partial.start, partial.end))
            .filter(|span| partial.is_past_cursor(span))
            .filter(|span| matcher.matches(span));

        match partial.order {
            Order::Asc => candidates.take(partial.limit.get()).cloned().collect(),
            Order::Desc => {
                let mut selected: Vec<Span> = candidates.cloned().collect();
                selected.reverse();
                selected.truncate(partial.limit.get());
                selected
            }
        }
    }
}

#[async_trait]
impl SpanSource for MemoryStore {
    async fn get_spans(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialFilter,
        wait: bool,
    ) -> Option<Vec<Span>> {
        if !self.ready(wait).await {
            debug!("spans requested before data materialised");
            return None;
        }

        let matcher = Self::matcher(&filter)?;
        Some(self.select(&matcher, &partial))
    }

    async fn get_positioned_spans(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialFilter,
        wait: bool,
    ) -> Option<Vec<PositionedSpan>> {
        if !self.ready(wait).await {
            debug!("positioned spans requested before data materialised");
            return None;
        }

        let matcher = Self::matcher(&filter)?;
        let mut spans = self.select(&matcher, &partial);
        if partial.order == Order::Desc {
            spans.reverse();
        }

        let mut positioned = assign_lanes(spans);
        if partial.order == Order::Desc {
            positioned.reverse();
        }
        Some(positioned)
    }

    async fn get_span_counts(
        &self,
        filter: Vec<FilterPredicate>,
        partial: PartialCountFilter,
        wait: bool,
        cache: bool,
    ) -> Option<Counts> {
        if !self.ready(wait).await {
            debug!("counts requested before data materialised");
            return None;
        }

        let key = CountKey {
            filter,
            start: partial.start,
            end: partial.end,
        };
        if cache {
            if let Some(counts) = self.inner.read().count_cache.get(&key) {
                return Some(*counts);
            }
        }

        let matcher = Self::matcher(&key.filter)?;
        let counts = {
            let inner = self.inner.read();
            let matching = inner
                .spans
                .iter()
                .filter(|span| span.intersects(Some(partial.start), Some(partial.end)))
                .filter(|span| matcher.matches(span))
                .take(self.count_cap.saturating_add(1) as usize)
                .count() as u64;

            if matching > self.count_cap {
                Counts::capped(self.count_cap)
            } else {
                Counts::exact(matching)
            }
        };

        if cache {
            self.inner.write().count_cache.insert(key, counts);
        }
        Some(counts)
    }
}
