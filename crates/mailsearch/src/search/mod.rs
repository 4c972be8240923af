//! Query execution and result hydration
//!
//! [`SearchCoordinator`] owns the current query, runs the search call and
//! the per-message detail fetches, and publishes [`SearchState`] snapshots to
//! subscribers.

mod coordinator;
mod state;

pub use coordinator::{SearchCoordinator, SearchTask};
pub use state::{SearchEvent, SearchState};
