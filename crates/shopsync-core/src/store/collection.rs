// ── Single-collection resource cache ──
//
// Holds one named remote collection in memory with explicit
// loading/error/data fields. One instance per collection, created at
// process start and mutated only by its own operations; consumers read
// snapshots or subscribe via `watch`.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use shopsync_api::Error;

use crate::stream::StateStream;

/// One page of a remote collection, as the backend reports it.
#[derive(Debug, Clone)]
pub struct CollectionPage<T> {
    pub items: Vec<T>,
    pub count: u64,
}

/// Loader for a collection. Injected into the store so tests can stub
/// the backend and the store never reaches for ambient global state.
pub trait CollectionSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    fn load(&self) -> impl Future<Output = Result<CollectionPage<Self::Item>, Error>> + Send;
}

/// The observable state of a collection.
///
/// Invariant: `loading == true` implies `error == None`. A completed
/// fetch sets exactly one of (`items` populated, `error` set).
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    pub items: Arc<Vec<T>>,
    pub count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            count: 0,
            loading: false,
            error: None,
        }
    }
}

/// In-memory cache for one remote collection.
///
/// `fetch()` is deliberately not guarded against overlapping calls: two
/// concurrent fetches race and the entry reflects whichever response
/// resolves last. The keyed query cache provides the stronger coalescing
/// guarantee for resources that need it.
pub struct CollectionStore<S: CollectionSource> {
    source: S,
    state: watch::Sender<CollectionState<S::Item>>,
}

impl<S: CollectionSource> CollectionStore<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(CollectionState::default());
        Self { source, state }
    }

    /// Refresh the collection from the backend.
    ///
    /// Sets `loading=true, error=None` synchronously — all subscribers
    /// observe the transition before the request is issued. On success
    /// the response's items and count replace the current ones; on
    /// failure the collection is emptied and `error` carries the
    /// failure's message (or a fixed fallback when it has none).
    pub async fn fetch(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.source.load().await {
            Ok(page) => {
                debug!(count = page.count, "collection fetch complete");
                self.state.send_modify(|s| {
                    s.items = Arc::new(page.items);
                    s.count = page.count;
                    s.loading = false;
                    s.error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, "collection fetch failed");
                let message = e.cache_message();
                self.state.send_modify(|s| {
                    s.items = Arc::new(Vec::new());
                    s.count = 0;
                    s.loading = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Clear the error field without touching items, count, or loading.
    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Overwrite the items directly, bypassing the network. Used for
    /// optimistic or externally-sourced updates.
    pub fn set_items(&self, items: Vec<S::Item>) {
        self.state.send_modify(|s| s.items = Arc::new(items));
    }

    // ── Snapshot selectors ───────────────────────────────────────────

    /// The full current state (cheap clone — items are behind an `Arc`).
    pub fn state(&self) -> CollectionState<S::Item> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Arc<Vec<S::Item>> {
        Arc::clone(&self.state.borrow().items)
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> StateStream<CollectionState<S::Item>> {
        StateStream::new(self.state.subscribe())
    }
}
