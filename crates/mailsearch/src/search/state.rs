//! Published search state

use crate::models::MessageSummary;

/// Snapshot of the coordinator's results, as seen by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Generation of the search that produced this state
    pub generation: u64,
    pub query: String,
    /// One entry per hit of the latest completed search, in API order
    pub results: Vec<MessageSummary>,
    /// `true` while the search call itself is in flight
    pub is_loading: bool,
}

impl SearchState {
    /// Entries still waiting for their detail fetch
    pub fn pending_count(&self) -> usize {
        self.results.iter().filter(|m| !m.is_loaded).count()
    }

    /// Search finished and every entry is hydrated
    pub fn is_settled(&self) -> bool {
        !self.is_loading && self.pending_count() == 0
    }
}

/// Notification delivered to subscribers
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// The published state changed
    State(SearchState),
    /// A search failed; meant for a non-blocking notification
    Failed { query: String, message: String },
}
