//! Search coordinator
//!
//! Runs the two-phase search: one search call, then one detail fetch per hit.
//! Every `search()` starts a new generation and cancels the previous one.
//! All state mutations happen under a single lock together with the
//! generation check, so work belonging to a superseded generation can never
//! touch the published results.

use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use super::state::{SearchEvent, SearchState};
use crate::cancel::CancelToken;
use crate::config::SearchSettings;
use crate::gmail::MailApi;
use crate::models::{MessageId, MessageSummary, SearchHit};

/// Owns the current query and publishes its results
pub struct SearchCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    api: Arc<dyn MailApi>,
    max_concurrent_fetches: Option<usize>,
    inner: Mutex<Inner>,
}

struct Inner {
    generation: u64,
    cancel: CancelToken,
    state: SearchState,
    subscribers: Vec<Sender<SearchEvent>>,
}

impl Inner {
    fn publish(&mut self) {
        let event = SearchEvent::State(self.state.clone());
        self.broadcast(event);
    }

    fn broadcast(&mut self, event: SearchEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Cancel the active token and start a new generation
    fn supersede(&mut self) -> (u64, CancelToken) {
        self.cancel.cancel();
        self.generation += 1;
        self.cancel = CancelToken::new();
        self.state.generation = self.generation;
        (self.generation, self.cancel.clone())
    }
}

/// Handle to one `search()` invocation
pub struct SearchTask {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl SearchTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the search call and all of its detail fetches to finish
    pub fn join(self) {
        if let Some(handle) = self.handle
            && handle.join().is_err()
        {
            error!("Search worker for generation {} panicked", self.generation);
        }
    }
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn MailApi>, settings: SearchSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                max_concurrent_fetches: settings.max_concurrent_fetches,
                inner: Mutex::new(Inner {
                    generation: 0,
                    cancel: CancelToken::new(),
                    state: SearchState::default(),
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Start a search for `query`, superseding any search in progress
    ///
    /// Previous results stay published (with `is_loading` set) until the new
    /// search call returns.
    pub fn search(&self, query: impl Into<String>) -> SearchTask {
        let query = query.into();

        let (generation, cancel) = {
            let mut inner = self.shared.lock();
            let (generation, cancel) = inner.supersede();
            inner.state.query = query.clone();
            inner.state.is_loading = true;
            inner.publish();
            (generation, cancel)
        };
        debug!("Search generation {} for {:?}", generation, query);

        let shared = self.shared.clone();
        let worker_query = query.clone();
        let spawned = thread::Builder::new()
            .name(format!("search-{}", generation))
            .spawn(move || shared.run(generation, worker_query, cancel));

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.shared
                    .fail(generation, &query, &format!("Failed to start search: {}", e));
                None
            }
        };

        SearchTask { generation, handle }
    }

    /// Abandon the current search and its detail fetches
    pub fn cancel(&self) {
        let mut inner = self.shared.lock();
        inner.supersede();
        if inner.state.is_loading {
            inner.state.is_loading = false;
            inner.publish();
        }
    }

    /// Receive every state change and failure from now on
    ///
    /// The current state is delivered first.
    pub fn subscribe(&self) -> Receiver<SearchEvent> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.shared.lock();
        if tx.send(SearchEvent::State(inner.state.clone())).is_ok() {
            inner.subscribers.push(tx);
        }
        rx
    }

    pub fn snapshot(&self) -> SearchState {
        self.shared.lock().state.clone()
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.shared.lock().cancel.cancel();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, generation: u64, query: String, cancel: CancelToken) {
        let hits = match cancel
            .check()
            .and_then(|()| self.api.authorize(&cancel))
            .and_then(|()| cancel.check())
            .and_then(|()| self.api.search(&query, &cancel))
        {
            Ok(hits) => hits,
            Err(e) if e.is_cancelled() => {
                debug!("Search generation {} cancelled", generation);
                return;
            }
            Err(e) => {
                self.fail(generation, &query, &e.to_string());
                return;
            }
        };

        if self.publish_placeholders(generation, &hits) {
            info!("Search {:?} returned {} results", query, hits.len());
            self.hydrate(generation, &hits, &cancel);
        }
    }

    /// Replace the results with one placeholder per hit; `false` if superseded
    fn publish_placeholders(&self, generation: u64, hits: &[SearchHit]) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("Discarding hits of superseded generation {}", generation);
            return false;
        }
        inner.state.results = hits
            .iter()
            .map(|hit| MessageSummary::placeholder(hit.id.clone()))
            .collect();
        inner.state.is_loading = false;
        inner.publish();
        true
    }

    /// Fetch every hit's details concurrently; returns once all have settled
    fn hydrate(&self, generation: u64, hits: &[SearchHit], cancel: &CancelToken) {
        if hits.is_empty() {
            return;
        }

        let workers = self
            .max_concurrent_fetches
            .unwrap_or(hits.len())
            .clamp(1, hits.len());
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("hydrate-{}-{}", generation, i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to start hydration workers: {}", e);
                return;
            }
        };

        pool.scope(|scope| {
            for (index, hit) in hits.iter().enumerate() {
                scope.spawn(move |_| self.hydrate_one(generation, index, &hit.id, cancel));
            }
        });
    }

    fn hydrate_one(&self, generation: u64, index: usize, id: &MessageId, cancel: &CancelToken) {
        if cancel.is_cancelled() {
            return;
        }
        match self.api.get_message(id, cancel) {
            Ok(summary) => self.apply_hydration(generation, index, id, summary),
            Err(e) if e.is_cancelled() => {}
            // Stays a placeholder; there is no per-entry retry
            Err(e) => warn!("Failed to load message {}: {}", id, e),
        }
    }

    /// Replace entry `index` if it still belongs to `generation` and is unloaded
    fn apply_hydration(&self, generation: u64, index: usize, id: &MessageId, summary: MessageSummary) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("Discarding message {} from superseded generation {}", id, generation);
            return;
        }
        let Some(entry) = inner.state.results.get_mut(index) else {
            return;
        };
        if entry.id != *id || entry.is_loaded {
            return;
        }
        *entry = MessageSummary {
            id: id.clone(),
            ..summary
        };
        inner.publish();
    }

    /// Publish an empty result list and notify subscribers, unless superseded
    fn fail(&self, generation: u64, query: &str, message: &str) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        error!("Search {:?} failed: {}", query, message);
        inner.state.results.clear();
        inner.state.is_loading = false;
        inner.publish();
        inner.broadcast(SearchEvent::Failed {
            query: query.to_string(),
            message: message.to_string(),
        });
    }
}
