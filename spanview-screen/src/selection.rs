use spanview_protocol::query::Counts;
use spanview_protocol::span::Span;
use tokio::sync::watch;
use tracing::debug;

use crate::state::Observable;

/// Cross-view interaction state: hovered row, selected row and the count estimate.
///
/// Hover and selection are independent channels and neither is validated
/// against current query results. Selection is sticky: nothing here clears it
/// when data is refreshed.
#[derive(Debug, Default)]
pub struct SelectionHub {
    hovered: Observable<Option<Span>>,
    selected: Observable<Option<Span>>,
    count: Observable<Counts>,
}

impl SelectionHub {
    pub fn new(selected: Option<Span>) -> Self {
        Self {
            selected: Observable::new(selected),
            ..Self::default()
        }
    }

    pub fn set_hovered_row(&self, span: Option<Span>) {
        self.hovered.set(span);
    }

    pub fn set_selected_row(&self, span: Option<Span>) {
        if self.selected.set(span) {
            debug!(
                selected = ?self.selected.with(|s| s.as_ref().map(|span| span.id)),
                "selection changed"
            );
        }
    }

    /// Written only by the graph's count query path.
    pub fn set_count(&self, counts: Counts) {
        self.count.set(counts);
    }

    pub fn hovered_row(&self) -> Option<Span> {
        self.hovered.get()
    }

    pub fn selected_row(&self) -> Option<Span> {
        self.selected.get()
    }

    pub fn with_selected<R>(&self, read: impl FnOnce(&Option<Span>) -> R) -> R {
        self.selected.with(read)
    }

    pub fn count(&self) -> Counts {
        self.count.get()
    }

    pub fn subscribe_hovered(&self) -> watch::Receiver<Option<Span>> {
        self.hovered.subscribe()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<Span>> {
        self.selected.subscribe()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<Counts> {
        self.count.subscribe()
    }
}
