use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use spanview_core::ScreenConfig;
use spanview_protocol::filter::{FilterPredicate, Input};
use spanview_protocol::query::Counts;
use spanview_protocol::source::{FilterParser, SpanSource};
use spanview_protocol::span::{Span, Timestamp};
use spanview_protocol::timespan::Timespan;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::columns::{parse_span_column, ColumnDef, ColumnIndex, ColumnLayout};
use crate::error::ScreenError;
use crate::filter::{FilterCoordinator, FilterSnapshot};
use crate::header::{CountBadge, HeaderFrame};
use crate::navigator::TimeWindowNavigator;
use crate::selection::SelectionHub;
use crate::slot::{QuerySlot, QueryTag, SlotKind};
use crate::state::Observable;
use crate::views::{
    DetailCallbacks, DetailFrame, DetailPane, FrameProps, GraphCallbacks, GraphFrame, GraphView,
    TableCallbacks, TableFrame, TableView, ViewProps,
};
use crate::window::{Clock, SystemClock, TimeWindowState};

struct ScreenShared {
    config: ScreenConfig,
    clock: Arc<dyn Clock>,
    filter: FilterCoordinator,
    window: TimeWindowState,
    selection: SelectionHub,
    navigator: TimeWindowNavigator,
    navigation: QuerySlot,
    columns: Observable<ColumnLayout>,
    tag: Observable<QueryTag>,
    graph: GraphView,
    table: TableView,
    detail: DetailPane,
}

/// Builder for [`ScreenCoordinator`].
pub struct ScreenBuilder {
    source: Arc<dyn SpanSource>,
    parser: Arc<dyn FilterParser>,
    config: ScreenConfig,
    clock: Arc<dyn Clock>,
    timespan: Option<Timespan>,
    live: bool,
    filter: Vec<Input>,
    columns: Option<ColumnLayout>,
    selected: Option<Span>,
}

impl ScreenBuilder {
    pub fn config(mut self, config: ScreenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Initial window. Defaults to the configured width ending now.
    pub fn timespan(mut self, timespan: Timespan) -> Self {
        self.timespan = Some(timespan);
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn filter(mut self, filter: Vec<Input>) -> Self {
        self.filter = filter;
        self
    }

    pub fn columns(mut self, columns: ColumnLayout) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn selected(mut self, selected: Option<Span>) -> Self {
        self.selected = selected;
        self
    }

    /// Assembles the screen. Nothing is queried until [`ScreenCoordinator::refresh`].
    pub fn build(self) -> ScreenCoordinator {
        let Self {
            source,
            parser,
            config,
            clock,
            timespan,
            live,
            filter,
            columns,
            selected,
        } = self;

        let mut timespan =
            timespan.unwrap_or_else(|| Timespan::ending_at(clock.now(), config.default_window));
        if live {
            timespan = timespan.slide_to(clock.now());
        }

        let filter = FilterCoordinator::new(parser, filter);
        let tag = Observable::new(QueryTag {
            generation: filter.generation(),
            timespan,
        });
        let columns = columns.unwrap_or_else(|| ColumnLayout::default_spans(config.column_min));
        let page_size = NonZeroUsize::new(config.page_size).unwrap_or(NonZeroUsize::MIN);
        let graph_limit = NonZeroUsize::new(config.graph_limit).unwrap_or(NonZeroUsize::MIN);

        let shared = Arc::new_cyclic(|weak: &Weak<ScreenShared>| {
            let graph = GraphView::new(
                source.clone(),
                graph_limit,
                config.view_wait,
                tag.subscribe(),
                GraphCallbacks {
                    on_hover: hover_callback(weak),
                    on_count: {
                        let weak = weak.clone();
                        Arc::new(move |counts: Counts| {
                            if let Some(shared) = weak.upgrade() {
                                shared.selection.set_count(counts);
                            }
                        })
                    },
                    on_timespan: {
                        let weak = weak.clone();
                        Arc::new(move |timespan: Timespan| {
                            let screen = ScreenCoordinator::upgrade(&weak);
                            async move {
                                match screen {
                                    Some(screen) => screen.set_timespan(timespan).await,
                                    None => Ok(()),
                                }
                            }
                            .boxed()
                        })
                    },
                },
            );

            let table = TableView::new(
                source.clone(),
                page_size,
                config.view_wait,
                tag.subscribe(),
                TableCallbacks {
                    on_hover: hover_callback(weak),
                    on_select: select_callback(weak),
                    on_add_predicate: add_predicate_callback(weak),
                },
            );

            let detail = DetailPane::new(DetailCallbacks {
                on_select: select_callback(weak),
                on_add_predicate: add_predicate_callback(weak),
                on_add_column: {
                    let weak = weak.clone();
                    Arc::new(move |text: String| match ScreenCoordinator::upgrade(&weak) {
                        Some(screen) => screen.add_column(&text),
                        None => Ok(()),
                    })
                },
            });

            ScreenShared {
                navigator: TimeWindowNavigator::new(source.clone(), config.navigation_wait),
                navigation: QuerySlot::new(SlotKind::Navigation),
                window: TimeWindowState::new(timespan, live),
                selection: SelectionHub::new(selected),
                columns: Observable::new(columns),
                config,
                clock,
                filter,
                tag,
                graph,
                table,
                detail,
            }
        });

        ScreenCoordinator { shared }
    }
}

fn hover_callback(weak: &Weak<ScreenShared>) -> crate::views::SpanCallback {
    let weak = weak.clone();
    Arc::new(move |span: Option<Span>| {
        if let Some(shared) = weak.upgrade() {
            shared.selection.set_hovered_row(span);
        }
    })
}

fn select_callback(weak: &Weak<ScreenShared>) -> crate::views::SpanCallback {
    let weak = weak.clone();
    Arc::new(move |span: Option<Span>| {
        if let Some(shared) = weak.upgrade() {
            shared.selection.set_selected_row(span);
        }
    })
}

fn add_predicate_callback(weak: &Weak<ScreenShared>) -> crate::views::AsyncCallback<String> {
    let weak = weak.clone();
    Arc::new(move |text: String| {
        let screen = ScreenCoordinator::upgrade(&weak);
        async move {
            match screen {
                Some(screen) => screen.add_to_filter(&text).await.map(|_| ()),
                None => Ok(()),
            }
        }
        .boxed()
    })
}

/// Integration point of the spans screen.
///
/// Owns filter, window, selection and column state, fans every filter or
/// window change out to the graph and the table, and discards any query
/// result that was issued against a state that no longer holds.
#[derive(Clone)]
pub struct ScreenCoordinator {
    shared: Arc<ScreenShared>,
}

impl ScreenCoordinator {
    pub fn builder(source: Arc<dyn SpanSource>, parser: Arc<dyn FilterParser>) -> ScreenBuilder {
        ScreenBuilder {
            source,
            parser,
            config: ScreenConfig::default(),
            clock: Arc::new(SystemClock),
            timespan: None,
            live: false,
            filter: Vec::new(),
            columns: None,
            selected: None,
        }
    }

    fn upgrade(weak: &Weak<ScreenShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.shared.config
    }

    pub fn raw_filter(&self) -> Vec<Input> {
        self.shared.filter.raw_filter()
    }

    pub fn filter(&self) -> Vec<FilterPredicate> {
        self.shared.filter.filter()
    }

    pub fn timespan(&self) -> Timespan {
        self.shared.window.timespan()
    }

    pub fn is_live(&self) -> bool {
        self.shared.window.is_live()
    }

    pub fn hovered_row(&self) -> Option<Span> {
        self.shared.selection.hovered_row()
    }

    pub fn selected_row(&self) -> Option<Span> {
        self.shared.selection.selected_row()
    }

    pub fn count(&self) -> Counts {
        self.shared.selection.count()
    }

    pub fn columns(&self) -> ColumnLayout {
        self.shared.columns.get()
    }

    pub fn detail_visible(&self) -> bool {
        self.shared.selection.with_selected(Option::is_some)
    }

    pub fn graph(&self) -> &GraphView {
        &self.shared.graph
    }

    pub fn table(&self) -> &TableView {
        &self.shared.table
    }

    pub fn detail(&self) -> &DetailPane {
        &self.shared.detail
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<FilterSnapshot> {
        self.shared.filter.subscribe()
    }

    pub fn subscribe_timespan(&self) -> watch::Receiver<Timespan> {
        self.shared.window.subscribe_timespan()
    }

    pub fn subscribe_live(&self) -> watch::Receiver<bool> {
        self.shared.window.subscribe_live()
    }

    pub fn subscribe_hovered(&self) -> watch::Receiver<Option<Span>> {
        self.shared.selection.subscribe_hovered()
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<Span>> {
        self.shared.selection.subscribe_selected()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<Counts> {
        self.shared.selection.subscribe_count()
    }

    pub fn subscribe_columns(&self) -> watch::Receiver<ColumnLayout> {
        self.shared.columns.subscribe()
    }

    fn props(&self) -> ViewProps {
        let snapshot = self.shared.filter.snapshot();
        ViewProps {
            tag: QueryTag {
                generation: snapshot.generation,
                timespan: self.shared.window.timespan(),
            },
            filter: snapshot.parsed,
            live: self.shared.window.is_live(),
        }
    }

    fn publish_tag(&self) {
        self.shared.tag.set(QueryTag {
            generation: self.shared.filter.generation(),
            timespan: self.shared.window.timespan(),
        });
    }

    /// Re-queries the graph and the table for the current filter and window.
    pub async fn refresh(&self) {
        let props = self.props();
        let (graph, table) = tokio::join!(
            self.shared.graph.load(&props),
            self.shared.table.load(&props)
        );
        settle(graph);
        settle(table);
    }

    /// Replaces the filter from the filter input. Refreshes only if the parsed filter changed.
    pub async fn set_filter(&self, inputs: Vec<Input>) -> bool {
        let changed = self.shared.filter.set_filter(inputs);
        if changed {
            self.publish_tag();
            self.refresh().await;
        }
        changed
    }

    /// Parses `text` and appends it to the filter. Nothing changes if it does not parse.
    pub async fn add_to_filter(&self, text: &str) -> Result<usize, ScreenError> {
        let added = self.shared.filter.add_to_filter(text).await?;
        if added > 0 {
            self.publish_tag();
            self.refresh().await;
        }
        Ok(added)
    }

    /// Moves the window by hand; refused with [`ScreenError::LiveTailActive`] while live.
    pub async fn set_timespan(&self, timespan: Timespan) -> Result<(), ScreenError> {
        if self.shared.window.set_timespan(timespan)? {
            self.publish_tag();
            self.refresh().await;
        }
        Ok(())
    }

    pub async fn set_live(&self, live: bool) {
        let now = self.shared.clock.now();
        if self.shared.window.set_live(live, now) {
            self.publish_tag();
            self.refresh().await;
        }
    }

    /// Slides a live window to the clock's current time.
    pub async fn tick(&self) -> Option<Timespan> {
        let now = self.shared.clock.now();
        self.tick_at(now).await
    }

    pub async fn tick_at(&self, now: Timestamp) -> Option<Timespan> {
        let moved = self.shared.window.tick(now)?;
        self.publish_tag();
        self.refresh().await;
        Some(moved)
    }

    /// Creation time of the span before `at` under the current filter.
    pub async fn timestamp_before(&self, at: Timestamp) -> Option<Timestamp> {
        self.shared.navigator.before(self.filter(), at).await
    }

    /// Creation time of the span after `at` under the current filter.
    pub async fn timestamp_after(&self, at: Timestamp) -> Option<Timestamp> {
        self.shared.navigator.after(self.filter(), at).await
    }

    /// Recentres the window on the span before the window's start.
    ///
    /// Returns the new window, or `None` when live, when no span was found,
    /// or when the screen moved on while the lookup was outstanding.
    pub async fn jump_before(&self) -> Option<Timespan> {
        self.jump(Direction::Before).await
    }

    /// Recentres the window on the span after the window's end.
    pub async fn jump_after(&self) -> Option<Timespan> {
        self.jump(Direction::After).await
    }

    async fn jump(&self, direction: Direction) -> Option<Timespan> {
        if self.is_live() {
            debug!("navigation ignored while live");
            return None;
        }

        let props = self.props();
        let ticket = self.shared.navigation.issue(props.tag);
        let window = props.timespan();
        let found = match direction {
            Direction::Before => {
                self.shared
                    .navigator
                    .before(props.filter, window.start())
                    .await
            }
            Direction::After => self.shared.navigator.after(props.filter, window.end()).await,
        };

        if let Err(err) = self
            .shared
            .navigation
            .accept(&ticket, &self.shared.tag.get())
        {
            debug!(error = %err, "navigation result discarded");
            return None;
        }

        let target = Timespan::centered_on(found?, window.duration());
        match self.set_timespan(target).await {
            Ok(()) => Some(target),
            Err(err) => {
                debug!(error = %err, "navigation not applied");
                None
            }
        }
    }

    /// Loads the next table page. Stale or unavailable pages add nothing.
    pub async fn load_more(&self) -> usize {
        let props = self.props();
        match self.shared.table.load_more(&props).await {
            Ok(added) => added,
            Err(err) => {
                settle(Err(err));
                0
            }
        }
    }

    pub fn hover_row(&self, span: Option<Span>) {
        self.shared.selection.set_hovered_row(span);
    }

    pub fn select_row(&self, span: Option<Span>) {
        self.shared.selection.set_selected_row(span);
    }

    fn edit_columns<R>(
        &self,
        edit: impl FnOnce(&mut ColumnLayout) -> Result<R, ScreenError>,
    ) -> Result<R, ScreenError> {
        let mut layout = self.shared.columns.get();
        let outcome = edit(&mut layout)?;
        self.shared.columns.set(layout);
        Ok(outcome)
    }

    pub fn column_update(&self, index: usize, def: ColumnDef) -> Result<(), ScreenError> {
        self.edit_columns(|layout| layout.update(index, def))
    }

    pub fn column_update_width(
        &self,
        index: usize,
        width: impl Into<String>,
    ) -> Result<(), ScreenError> {
        self.edit_columns(|layout| layout.update_width(index, width))
    }

    pub fn column_move(&self, index: usize, to: usize) -> Result<(), ScreenError> {
        self.edit_columns(|layout| layout.move_column(index, to))
    }

    pub fn column_insert(&self, index: ColumnIndex, def: ColumnDef) -> Result<usize, ScreenError> {
        self.edit_columns(|layout| layout.insert(index, def))
    }

    pub fn column_remove(&self, index: usize) -> Result<ColumnDef, ScreenError> {
        self.edit_columns(|layout| layout.remove(index))
    }

    /// Parses `text` as a column and appends it.
    pub fn add_column(&self, text: &str) -> Result<(), ScreenError> {
        let def = parse_span_column(text)?;
        let position = self.column_insert(ColumnIndex::Append, def)?;
        info!(column = text, position, "column added");
        Ok(())
    }

    pub fn header_frame(&self) -> HeaderFrame {
        let live = self.is_live();
        HeaderFrame {
            timespan: self.timespan(),
            live,
            count: CountBadge::new(self.count(), self.shared.config.count_thresholds),
            time_controls_enabled: !live,
        }
    }

    pub fn graph_frame(&self) -> GraphFrame {
        self.with_frame_props(|props| self.shared.graph.frame(props))
    }

    pub fn table_frame(&self) -> TableFrame {
        self.with_frame_props(|props| self.shared.table.frame(props))
    }

    pub fn detail_frame(&self) -> Option<DetailFrame> {
        self.with_frame_props(|props| self.shared.detail.frame(props))
    }

    fn with_frame_props<R>(&self, render: impl FnOnce(&FrameProps<'_>) -> R) -> R {
        let filter = self.filter();
        let hovered = self.hovered_row();
        let selected = self.selected_row();
        let columns = self.columns();
        render(&FrameProps {
            timespan: self.timespan(),
            filter: &filter,
            hovered: hovered.as_ref(),
            selected: selected.as_ref(),
            columns: &columns,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Before,
    After,
}

fn settle(result: Result<(), ScreenError>) {
    match result {
        Ok(()) => {}
        Err(ScreenError::StaleResult { slot }) => debug!(%slot, "discarded stale result"),
        Err(ScreenError::QueryUnavailable { slot }) => warn!(%slot, "query returned no data"),
        Err(err) => warn!(error = %err, "view refresh failed"),
    }
}
