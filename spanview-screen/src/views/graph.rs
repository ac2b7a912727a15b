use std::num::NonZeroUsize;
use std::sync::Arc;

use spanview_protocol::query::{PartialFilter, PositionedSpan};
use spanview_protocol::source::SpanSource;
use spanview_protocol::span::{Span, SpanId};
use spanview_protocol::timespan::Timespan;
use tokio::sync::watch;

use super::{AsyncCallback, CountCallback, FrameProps, SpanCallback, ViewProps};
use crate::error::ScreenError;
use crate::slot::{QuerySlot, QueryTag, SlotKind};
use crate::state::Observable;

pub struct GraphCallbacks {
    pub on_hover: SpanCallback,
    pub on_count: CountCallback,
    /// Invoked when a range is brushed on the graph.
    pub on_timespan: AsyncCallback<Timespan>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct GraphData {
    tag: Option<QueryTag>,
    spans: Vec<PositionedSpan>,
    available: bool,
}

/// Render-ready graph contents.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFrame {
    pub timespan: Timespan,
    pub spans: Vec<PositionedSpan>,
    pub lanes: usize,
    /// Hovered span, when the graph currently shows it.
    pub highlighted: Option<SpanId>,
    pub available: bool,
}

/// Density graph of positioned spans. Owns the positioned-spans and counts slots.
pub struct GraphView {
    source: Arc<dyn SpanSource>,
    limit: NonZeroUsize,
    wait: bool,
    spans_slot: QuerySlot,
    count_slot: QuerySlot,
    current: watch::Receiver<QueryTag>,
    data: Observable<GraphData>,
    callbacks: GraphCallbacks,
}

impl GraphView {
    pub fn new(
        source: Arc<dyn SpanSource>,
        limit: NonZeroUsize,
        wait: bool,
        current: watch::Receiver<QueryTag>,
        callbacks: GraphCallbacks,
    ) -> Self {
        Self {
            source,
            limit,
            wait,
            spans_slot: QuerySlot::new(SlotKind::PositionedSpans),
            count_slot: QuerySlot::new(SlotKind::Counts),
            current,
            data: Observable::default(),
            callbacks,
        }
    }

    /// Re-queries positioned spans and the count estimate for `props`.
    pub async fn load(&self, props: &ViewProps) -> Result<(), ScreenError> {
        let (spans, count) = tokio::join!(self.load_spans(props), self.load_count(props));
        spans.and(count)
    }

    async fn load_spans(&self, props: &ViewProps) -> Result<(), ScreenError> {
        let ticket = self.spans_slot.issue(props.tag);
        let partial = PartialFilter::window(&props.timespan(), self.limit);
        let result = self
            .source
            .get_positioned_spans(props.filter.clone(), partial, self.wait)
            .await;

        self.spans_slot.accept(&ticket, &self.current.borrow())?;

        let available = result.is_some();
        self.data.set(GraphData {
            tag: Some(ticket.tag()),
            spans: result.unwrap_or_default(),
            available,
        });

        if available {
            Ok(())
        } else {
            Err(ScreenError::QueryUnavailable {
                slot: SlotKind::PositionedSpans,
            })
        }
    }

    /// Counts are only cached while the window is pinned; a live window keeps growing.
    async fn load_count(&self, props: &ViewProps) -> Result<(), ScreenError> {
        let ticket = self.count_slot.issue(props.tag);
        let result = self
            .source
            .get_span_counts(
                props.filter.clone(),
                (&props.timespan()).into(),
                self.wait,
                !props.live,
            )
            .await;

        self.count_slot.accept(&ticket, &self.current.borrow())?;

        let counts = result.ok_or(ScreenError::QueryUnavailable {
            slot: SlotKind::Counts,
        })?;
        (self.callbacks.on_count)(counts);
        Ok(())
    }

    pub fn spans(&self) -> Vec<PositionedSpan> {
        self.data.with(|data| data.spans.clone())
    }

    pub fn contains(&self, id: SpanId) -> bool {
        self.data
            .with(|data| data.spans.iter().any(|positioned| positioned.span.id == id))
    }

    pub fn hover(&self, span: Option<Span>) {
        (self.callbacks.on_hover)(span);
    }

    /// Zooms the screen to a brushed range.
    pub async fn select_range(&self, timespan: Timespan) -> Result<(), ScreenError> {
        (self.callbacks.on_timespan)(timespan).await
    }

    pub fn frame(&self, props: &FrameProps<'_>) -> GraphFrame {
        self.data.with(|data| {
            let highlighted = props
                .hovered
                .map(|span| span.id)
                .filter(|id| data.spans.iter().any(|p| p.span.id == *id));

            GraphFrame {
                timespan: props.timespan,
                spans: data.spans.clone(),
                lanes: data.spans.iter().map(|p| p.lane + 1).max().unwrap_or(0),
                highlighted,
                available: data.available,
            }
        })
    }
}
