use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use spanview_protocol::query::{PartialFilter, SpanCursor};
use spanview_protocol::source::SpanSource;
use spanview_protocol::span::{Span, SpanId};
use tokio::sync::watch;
use tracing::debug;

use super::{AsyncCallback, FrameProps, SpanCallback, ViewProps};
use crate::error::ScreenError;
use crate::slot::{QuerySlot, QueryTag, SlotKind};
use crate::state::Observable;

pub struct TableCallbacks {
    pub on_hover: SpanCallback,
    pub on_select: SpanCallback,
    pub on_add_predicate: AsyncCallback<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct TableData {
    tag: Option<QueryTag>,
    rows: Vec<Span>,
    has_more: bool,
    available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: SpanId,
    pub cells: Vec<String>,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFrame {
    pub headers: Vec<String>,
    pub widths: Vec<String>,
    pub rows: Vec<TableRow>,
    pub has_more: bool,
    pub available: bool,
}

/// Paged list of the spans in the window, oldest first. Owns the spans slot.
pub struct TableView {
    source: Arc<dyn SpanSource>,
    page_size: NonZeroUsize,
    wait: bool,
    slot: QuerySlot,
    current: watch::Receiver<QueryTag>,
    data: Observable<TableData>,
    callbacks: TableCallbacks,
}

impl TableView {
    pub fn new(
        source: Arc<dyn SpanSource>,
        page_size: NonZeroUsize,
        wait: bool,
        current: watch::Receiver<QueryTag>,
        callbacks: TableCallbacks,
    ) -> Self {
        Self {
            source,
            page_size,
            wait,
            slot: QuerySlot::new(SlotKind::Spans),
            current,
            data: Observable::default(),
            callbacks,
        }
    }

    /// Replaces the rows with the first page of the window.
    pub async fn load(&self, props: &ViewProps) -> Result<(), ScreenError> {
        let ticket = self.slot.issue(props.tag);
        let partial = PartialFilter::window(&props.timespan(), self.page_size);
        let result = self
            .source
            .get_spans(props.filter.clone(), partial, self.wait)
            .await;

        self.slot.accept(&ticket, &self.current.borrow())?;

        let available = result.is_some();
        let rows = result.unwrap_or_default();
        self.data.set(TableData {
            tag: Some(ticket.tag()),
            has_more: rows.len() == self.page_size.get(),
            rows,
            available,
        });

        if available {
            Ok(())
        } else {
            Err(ScreenError::QueryUnavailable {
                slot: SlotKind::Spans,
            })
        }
    }

    /// Appends the page created after the last row, in `(created_at, id)` order.
    ///
    /// Does nothing when the current rows were loaded for a different state or
    /// the last page was short. Returns the number of rows added.
    pub async fn load_more(&self, props: &ViewProps) -> Result<usize, ScreenError> {
        let last = self.data.with(|data| {
            if data.tag == Some(props.tag) && data.has_more {
                data.rows.last().map(SpanCursor::of)
            } else {
                None
            }
        });
        let Some(last) = last else {
            return Ok(0);
        };

        let ticket = self.slot.issue(props.tag);
        let partial = PartialFilter::page_after(&props.timespan(), last, self.page_size);
        let result = self
            .source
            .get_spans(props.filter.clone(), partial, self.wait)
            .await;

        self.slot.accept(&ticket, &self.current.borrow())?;

        let page = result.ok_or(ScreenError::QueryUnavailable {
            slot: SlotKind::Spans,
        })?;
        let full_page = page.len() == self.page_size.get();

        let mut added = 0;
        self.data.update(|data| {
            let seen: HashSet<SpanId> = data.rows.iter().map(|span| span.id).collect();
            let fresh: Vec<Span> = page
                .into_iter()
                .filter(|span| !seen.contains(&span.id))
                .collect();
            added = fresh.len();
            data.rows.extend(fresh);
            data.has_more = full_page && added > 0;
            true
        });

        debug!(added, "table page appended");
        Ok(added)
    }

    pub fn rows(&self) -> Vec<Span> {
        self.data.with(|data| data.rows.clone())
    }

    pub fn has_more(&self) -> bool {
        self.data.with(|data| data.has_more)
    }

    pub fn contains(&self, id: SpanId) -> bool {
        self.data
            .with(|data| data.rows.iter().any(|span| span.id == id))
    }

    pub fn hover(&self, span: Option<Span>) {
        (self.callbacks.on_hover)(span);
    }

    pub fn click(&self, span: Span) {
        (self.callbacks.on_select)(Some(span));
    }

    pub async fn add_predicate(&self, text: impl Into<String>) -> Result<(), ScreenError> {
        (self.callbacks.on_add_predicate)(text.into()).await
    }

    pub fn frame(&self, props: &FrameProps<'_>) -> TableFrame {
        let columns = props.columns.columns();
        self.data.with(|data| TableFrame {
            headers: columns.iter().map(|column| column.header()).collect(),
            widths: props.columns.widths().to_vec(),
            rows: data
                .rows
                .iter()
                .map(|span| TableRow {
                    id: span.id,
                    cells: columns.iter().map(|column| column.cell(span)).collect(),
                    selected: props.selected.is_some_and(|s| s.id == span.id),
                    hovered: props.hovered.is_some_and(|h| h.id == span.id),
                })
                .collect(),
            has_more: data.has_more,
            available: data.available,
        })
    }
}
