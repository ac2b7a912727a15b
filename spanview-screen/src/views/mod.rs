//! The three views composed by the screen: graph, table and detail pane.
//!
//! Views keep only the latest result of their own queries. Everything shared
//! lives in the coordinator and is reached through the callbacks handed to
//! each view at construction.

mod detail;
mod graph;
mod table;

use std::sync::Arc;

use futures::future::BoxFuture;
use spanview_protocol::filter::FilterPredicate;
use spanview_protocol::query::Counts;
use spanview_protocol::span::Span;
use spanview_protocol::timespan::Timespan;

use crate::columns::ColumnLayout;
use crate::error::ScreenError;
use crate::slot::QueryTag;

pub use detail::{DetailCallbacks, DetailField, DetailFrame, DetailPane};
pub use graph::{GraphCallbacks, GraphFrame, GraphView};
pub use table::{TableCallbacks, TableFrame, TableRow, TableView};

pub type SpanCallback = Arc<dyn Fn(Option<Span>) + Send + Sync>;
pub type CountCallback = Arc<dyn Fn(Counts) + Send + Sync>;
pub type ColumnCallback = Arc<dyn Fn(String) -> Result<(), ScreenError> + Send + Sync>;
pub type AsyncCallback<T> =
    Arc<dyn Fn(T) -> BoxFuture<'static, Result<(), ScreenError>> + Send + Sync>;

/// State snapshot a view queries against.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewProps {
    pub filter: Vec<FilterPredicate>,
    pub tag: QueryTag,
    pub live: bool,
}

impl ViewProps {
    pub fn timespan(&self) -> Timespan {
        self.tag.timespan
    }
}

/// State snapshot a view renders from.
#[derive(Debug, Clone, Copy)]
pub struct FrameProps<'a> {
    pub timespan: Timespan,
    pub filter: &'a [FilterPredicate],
    pub hovered: Option<&'a Span>,
    pub selected: Option<&'a Span>,
    pub columns: &'a ColumnLayout,
}
