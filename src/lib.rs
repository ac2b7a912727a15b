//! SpanView: browse recorded spans by filter and time window.
//!
//! The workspace is split by concern:
//!
//! * `spanview-core`: canonical error type, configuration, logging setup
//! * `spanview-protocol`: span model and the query interfaces
//! * `spanview-filter`: filter predicate grammar and evaluation
//! * `spanview-store`: in-memory span store answering screen queries
//! * `spanview-screen`: coordination of filter, window, selection and views
//!
//! This crate re-exports them and wires the default pieces together.

use std::path::Path;
use std::sync::Arc;

pub use spanview_core::{CountThresholds, ScreenConfig, SpanViewError};
pub use spanview_filter as filter;
pub use spanview_protocol as protocol;
pub use spanview_screen as screen;
pub use spanview_store as store;

use spanview_filter::SpanFilterParser;
use spanview_screen::{ScreenBuilder, ScreenCoordinator};
use spanview_store::MemoryStore;

pub type Result<T> = std::result::Result<T, SpanViewError>;

/// Screen builder over `store` using the built-in filter grammar.
pub fn memory_screen(store: MemoryStore, config: ScreenConfig) -> ScreenBuilder {
    ScreenCoordinator::builder(Arc::new(store), Arc::new(SpanFilterParser)).config(config)
}

/// Loads spans from an NDJSON file and builds a screen over them.
pub async fn open_screen(path: impl AsRef<Path>, config: ScreenConfig) -> Result<ScreenCoordinator> {
    let store = MemoryStore::from_ndjson_file(path, config.count_cap).await?;
    Ok(memory_screen(store, config).build())
}
