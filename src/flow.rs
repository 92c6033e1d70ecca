//! Confirm-or-change flow around a single selected segment.

use crate::catalog::{Segment, SegmentSource};
use crate::config::Config;
use crate::request::RequestState;
use crate::search::{DebouncedSearch, SearchExit};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Confirming,
    Searching,
}

/// Entry whose description is exactly `"<label>."`.
///
/// The trailing period is how the catalog labels the default entry. An entry
/// without it does not match.
pub fn find_default(list: &[Segment], label: &str) -> Option<Segment> {
    let expected = format!("{}.", label);
    list.iter().find(|s| s.description == expected).cloned()
}

pub struct SelectionFlow<S: SegmentSource + 'static> {
    source: S,
    quiet: Duration,
    selected: Option<Segment>,
    search: Option<DebouncedSearch<S>>,
}

impl<S: SegmentSource + 'static> SelectionFlow<S> {
    pub fn new(source: S, quiet: Duration) -> Self {
        Self {
            source,
            quiet,
            selected: None,
            search: None,
        }
    }

    /// Build the flow and preselect the default segment for `config.initial_label`.
    pub async fn start(source: S, config: &Config) -> Self {
        let mut flow = Self::new(source, config.debounce());
        flow.lookup_default(&config.initial_label).await;
        flow
    }

    /// Search for `label` and select its default entry if there is one.
    /// A miss or a failed request leaves the selection unset.
    #[instrument(skip(self))]
    pub async fn lookup_default(&mut self, label: &str) -> Option<&Segment> {
        match self.source.search(label).await {
            Ok(Some(list)) => {
                self.selected = find_default(&list, label);
                match &self.selected {
                    Some(segment) => info!(id = %segment.id, "default segment preselected"),
                    None => debug!(candidates = list.len(), "no default segment for label"),
                }
            }
            Ok(None) => debug!("initial lookup returned no data"),
            Err(e) => warn!(error = %e, "initial lookup failed"),
        }
        self.selected.as_ref()
    }

    pub fn state(&self) -> FlowState {
        if self.search.is_some() {
            FlowState::Searching
        } else {
            FlowState::Confirming
        }
    }

    pub fn selected(&self) -> Option<&Segment> {
        self.selected.as_ref()
    }

    /// Confirming → Searching. Opens a new search session with its own request state.
    pub fn edit(&mut self) -> &mut DebouncedSearch<S> {
        let (source, quiet) = (&self.source, self.quiet);
        self.search
            .get_or_insert_with(|| DebouncedSearch::new(source.session(), quiet))
    }

    pub fn search(&self) -> Option<&DebouncedSearch<S>> {
        self.search.as_ref()
    }

    /// Forward a raw edit to the active search. Ignored while confirming.
    pub fn input(&mut self, raw: impl Into<String>) -> bool {
        match self.search.as_mut() {
            Some(search) => {
                search.input(raw);
                true
            }
            None => false,
        }
    }

    /// Commit `segment` and return to confirming.
    pub fn choose(&mut self, segment: Segment) -> bool {
        let Some(mut search) = self.search.take() else {
            return false;
        };
        if let SearchExit::Selected(segment) = search.select(segment) {
            self.selected = Some(segment);
        }
        true
    }

    /// Leave the search unchanged. No-op while confirming.
    pub fn back(&mut self) -> bool {
        match self.search.take() {
            Some(mut search) => {
                search.cancel();
                true
            }
            None => false,
        }
    }

    /// Request state of the flow's own calls (the initial lookup).
    pub fn request_state(&self) -> RequestState {
        self.source.state()
    }

    pub fn is_loading(&self) -> bool {
        self.source.state().is_loading
    }
}
