//! Coordination logic of the spans screen.
//!
//! [`ScreenCoordinator`] owns the filter, the time window, live tail, selection
//! and column state, and keeps the graph, table and detail views consistent
//! with them while queries resolve out of order.

pub mod columns;
pub mod error;
pub mod filter;
pub mod header;
pub mod navigator;
pub mod screen;
pub mod selection;
pub mod slot;
pub mod state;
pub mod views;
pub mod window;

pub use columns::{parse_span_column, ColumnDef, ColumnIndex, ColumnLayout, InherentColumn};
pub use error::ScreenError;
pub use filter::{FilterCoordinator, FilterSnapshot};
pub use header::{CountBadge, CountLevel, HeaderFrame};
pub use navigator::TimeWindowNavigator;
pub use screen::{ScreenBuilder, ScreenCoordinator};
pub use selection::SelectionHub;
pub use slot::{QuerySlot, QueryTag, SlotKind, Ticket};
pub use state::Observable;
pub use views::{
    DetailFrame, DetailPane, GraphFrame, GraphView, TableFrame, TableRow, TableView, ViewProps,
};
pub use window::{Clock, ManualClock, SystemClock, TimeWindowState};
