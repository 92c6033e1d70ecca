//! Debounced incremental search over a `SegmentSource`.
//!
//! Raw keystrokes re-arm a single timer. When the quiet interval passes, the
//! last value is committed: empty clears the candidates, anything else issues
//! one search. Committing the value already in effect does nothing. Every
//! other commit bumps a generation counter and a reply is applied only if its
//! generation is still the latest one, so out-of-order replies never
//! overwrite newer results.

pub mod debounce;

pub use debounce::Debouncer;

use crate::catalog::{Segment, SegmentSource};
use crate::request::RequestState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub raw_input: String,
    pub debounced_input: String,
    pub candidates: Vec<Segment>,
    /// Incremented whenever a commit changes `debounced_input`.
    pub generation: u64,
}

impl SearchState {
    /// True while nothing has been typed; callers show their prompt instead of a list.
    pub fn needs_input(&self) -> bool {
        self.raw_input.is_empty()
    }
}

/// How a search session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExit {
    Selected(Segment),
    Cancelled,
}

struct Shared<S> {
    source: S,
    state: watch::Sender<SearchState>,
    session_id: Uuid,
    runtime: Handle,
}

impl<S: SegmentSource + 'static> Shared<S> {
    /// A value equal to the current `debounced_input` is not a change: no
    /// new generation, no request.
    fn commit(self: &Arc<Self>, value: String) {
        let mut generation = None;
        self.state.send_if_modified(|state| {
            if state.debounced_input == value {
                return false;
            }
            state.generation += 1;
            generation = Some(state.generation);
            state.debounced_input = value.clone();
            if value.is_empty() {
                state.candidates.clear();
            }
            true
        });

        let Some(generation) = generation else {
            debug!(session = %self.session_id, query = %value, "debounced input unchanged, nothing to do");
            return;
        };

        if value.is_empty() {
            debug!(session = %self.session_id, generation, "empty commit, candidates cleared");
            return;
        }

        debug!(session = %self.session_id, generation, query = %value, "dispatching search");
        let shared = Arc::clone(self);
        self.runtime
            .spawn(async move { shared.dispatch(generation, value).await });
    }

    async fn dispatch(&self, generation: u64, query: String) {
        let result = self.source.search(&query).await;

        match result {
            Ok(Some(list)) => {
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.candidates = list;
                    true
                });
                if !applied {
                    debug!(session = %self.session_id, generation, query = %query, "discarding superseded reply");
                }
            }
            Ok(None) => {
                debug!(session = %self.session_id, generation, "reply carried no data, candidates kept");
            }
            Err(e) => {
                warn!(session = %self.session_id, source = self.source.name(), error = %e, "search failed, candidates kept");
            }
        }
    }

    /// Retire every in-flight reply.
    fn retire(&self) {
        self.state.send_modify(|state| state.generation += 1);
    }
}

/// One search session. Owns its source handle, and with it its own request state.
pub struct DebouncedSearch<S: SegmentSource + 'static> {
    shared: Arc<Shared<S>>,
    debouncer: Debouncer,
    closed: bool,
}

impl<S: SegmentSource + 'static> DebouncedSearch<S> {
    /// Runs on the current runtime. Panics outside of one.
    pub fn new(source: S, quiet: Duration) -> Self {
        Self::with_runtime(source, quiet, Handle::current())
    }

    /// Timers and requests run on `runtime`; the search can then be driven
    /// from any thread.
    pub fn with_runtime(source: S, quiet: Duration, runtime: Handle) -> Self {
        let (state, _rx) = watch::channel(SearchState::default());
        let session_id = Uuid::new_v4();
        debug!(session = %session_id, source = source.name(), ?quiet, "search session opened");

        Self {
            shared: Arc::new(Shared {
                source,
                state,
                session_id,
                runtime: runtime.clone(),
            }),
            debouncer: Debouncer::with_runtime(quiet, runtime),
            closed: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    pub fn quiet_interval(&self) -> Duration {
        self.debouncer.delay()
    }

    /// Feed one raw edit.
    pub fn input(&mut self, raw: impl Into<String>) {
        if self.closed {
            debug!(session = %self.shared.session_id, "input after close ignored");
            return;
        }

        let raw = raw.into();
        self.shared.state.send_modify(|state| state.raw_input = raw.clone());

        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(async move { shared.commit(raw) });
    }

    /// Empty the input and the candidates right away, without a request.
    pub fn clear(&mut self) {
        if self.closed {
            return;
        }
        self.debouncer.cancel();
        self.shared.state.send_modify(|state| state.raw_input.clear());
        self.shared.commit(String::new());
    }

    /// Commit `segment` as the user's choice. Terminal: later input is ignored.
    pub fn select(&mut self, segment: Segment) -> SearchExit {
        info!(session = %self.shared.session_id, id = %segment.id, description = %segment.description, "segment selected");
        self.close();
        SearchExit::Selected(segment)
    }

    /// Leave without choosing.
    pub fn cancel(&mut self) -> SearchExit {
        debug!(session = %self.shared.session_id, "search cancelled");
        self.close();
        SearchExit::Cancelled
    }

    fn close(&mut self) {
        self.debouncer.cancel();
        self.shared.retire();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    pub fn candidates(&self) -> Vec<Segment> {
        self.shared.state.borrow().candidates.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn request_state(&self) -> RequestState {
        self.shared.source.state()
    }
}
