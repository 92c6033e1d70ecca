use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Loading/error flags of one client instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestState {
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Counters {
    in_flight: usize,
    latest_call: u64,
}

/// Drives `RequestState` from overlapping calls.
///
/// Loading stays set while any call is in flight and only the most recently
/// started call may record an error.
pub(crate) struct StateTracker {
    counters: Mutex<Counters>,
    tx: watch::Sender<RequestState>,
}

impl StateTracker {
    pub(crate) fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(RequestState::default());
        Arc::new(Self {
            counters: Mutex::new(Counters::default()),
            tx,
        })
    }

    pub(crate) fn snapshot(&self) -> RequestState {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.tx.subscribe()
    }

    pub(crate) fn begin(self: &Arc<Self>) -> CallGuard {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.in_flight += 1;
        counters.latest_call += 1;
        let call = counters.latest_call;

        self.tx.send_replace(RequestState {
            is_loading: true,
            error: None,
        });

        CallGuard {
            tracker: Arc::clone(self),
            call,
        }
    }
}

/// Held for the lifetime of one call. Dropping it ends the call, whichever
/// way the call exits.
pub(crate) struct CallGuard {
    tracker: Arc<StateTracker>,
    call: u64,
}

impl CallGuard {
    pub(crate) fn fail(&self, message: String) {
        let counters = self.tracker.counters.lock().unwrap_or_else(PoisonError::into_inner);
        if counters.latest_call == self.call {
            self.tracker.tx.send_modify(|state| state.error = Some(message));
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let mut counters = self.tracker.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.in_flight = counters.in_flight.saturating_sub(1);
        if counters.in_flight == 0 {
            self.tracker.tx.send_modify(|state| state.is_loading = false);
        }
    }
}
