use std::sync::Arc;

use spanview_protocol::filter::{FilterPredicate, Input};
use spanview_protocol::source::FilterParser;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::ScreenError;
use crate::state::Observable;

/// Raw and parsed filter lists as of one change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSnapshot {
    pub raw: Vec<Input>,
    pub parsed: Vec<FilterPredicate>,
    pub generation: u64,
}

/// Owns the raw and parsed filter lists and keeps them in lockstep.
///
/// `generation` advances only when the parsed list actually changes, which is
/// what decides whether in-flight queries are still current.
pub struct FilterCoordinator {
    parser: Arc<dyn FilterParser>,
    state: Observable<FilterSnapshot>,
}

impl FilterCoordinator {
    pub fn new(parser: Arc<dyn FilterParser>, initial: Vec<Input>) -> Self {
        let coordinator = Self {
            parser,
            state: Observable::default(),
        };
        coordinator.set_filter(initial);
        coordinator
    }

    pub fn raw_filter(&self) -> Vec<Input> {
        self.state.with(|state| state.raw.clone())
    }

    pub fn filter(&self) -> Vec<FilterPredicate> {
        self.state.with(|state| state.parsed.clone())
    }

    pub fn generation(&self) -> u64 {
        self.state.with(|state| state.generation)
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.state.get()
    }

    /// Receiver woken whenever the raw or parsed list changes.
    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.state.subscribe()
    }

    /// Replaces the raw list. The parsed list follows only if every entry is valid.
    ///
    /// Returns whether the parsed filter changed. Setting the same filter twice
    /// is a no-op.
    pub fn set_filter(&self, inputs: Vec<Input>) -> bool {
        let parsed: Option<Vec<FilterPredicate>> = inputs
            .iter()
            .map(|input| input.predicate().cloned())
            .collect();

        let mut parsed_changed = false;
        self.state.update(|state| {
            let raw_changed = state.raw != inputs;
            state.raw = inputs;

            if let Some(parsed) = parsed {
                if state.parsed != parsed {
                    state.parsed = parsed;
                    state.generation += 1;
                    parsed_changed = true;
                }
            } else {
                debug!("filter has invalid entries, keeping previous predicates");
            }
            raw_changed || parsed_changed
        });

        if parsed_changed {
            info!(predicates = self.state.with(|s| s.parsed.len()), "filter replaced");
        }
        parsed_changed
    }

    /// Parses `text` and appends the predicates to both lists, or changes nothing.
    ///
    /// Returns the number of predicates appended.
    pub async fn add_to_filter(&self, text: &str) -> Result<usize, ScreenError> {
        let predicates = self.parser.parse_span_filter(text).await?;
        if predicates.is_empty() {
            return Ok(0);
        }

        let added = predicates.len();
        self.state.update(|state| {
            state
                .raw
                .extend(predicates.iter().cloned().map(Input::valid));
            state.parsed.extend(predicates);
            state.generation += 1;
            true
        });

        info!(added, "predicates appended to filter");
        Ok(added)
    }
}
