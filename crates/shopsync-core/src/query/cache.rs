// ── Keyed query cache ──
//
// One entry per (family, normalized-parameters) key, each with its own
// freshness timer. Concurrent requests for one key are coalesced onto a
// single in-flight future; entries with no subscribers are garbage
// collected after a grace period.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use shopsync_api::Error;

use crate::query::key::{QueryKey, QueryParams};
use crate::stream::StateStream;

/// How a stale entry is refreshed when a consumer requests it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Serve the stale value immediately and refresh in the background.
    #[default]
    StaleWhileRevalidate,
    /// Make the consumer wait for a fresh value.
    Block,
}

/// Per-key-family cache tuning.
#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// How long a completed fetch counts as fresh.
    pub fresh_for: Duration,
    /// How long an entry with zero subscribers is retained.
    pub gc_grace: Duration,
    pub refresh: RefreshMode,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fresh_for: Duration::from_secs(5 * 60),
            gc_grace: Duration::from_secs(5 * 60),
            refresh: RefreshMode::default(),
        }
    }
}

/// Backend fetch for one key family.
pub trait QuerySource: Send + Sync + 'static {
    type Params: QueryParams;
    type Output: Send + Sync + 'static;

    fn fetch(
        &self,
        params: &Self::Params,
    ) -> impl Future<Output = Result<Self::Output, Error>> + Send;
}

/// The observable state of one cache entry.
///
/// Unlike the hand-rolled store, errors keep the original error object
/// (for finer-grained handling) and a failed refresh keeps any
/// previously cached data.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<Arc<Error>>,
    /// When the data was last successfully fetched. Not advanced on
    /// failure, so stale entries keep retrying on demand.
    pub fetched_at: Option<Instant>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> QueryState<T> {
    fn is_fresh(&self, window: Duration) -> bool {
        self.data.is_some() && self.fetched_at.is_some_and(|t| t.elapsed() < window)
    }
}

// ── Entry bookkeeping ────────────────────────────────────────────────

type InflightFuture = Shared<BoxFuture<'static, ()>>;

struct Entry<T> {
    state: watch::Sender<QueryState<T>>,
    /// The in-flight registry slot: one shared pending future per key,
    /// joined by every concurrent caller until resolution.
    inflight: Mutex<Option<InflightFuture>>,
    subscribers: AtomicUsize,
    last_used: Mutex<Instant>,
}

impl<T> Entry<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            state,
            inflight: Mutex::new(None),
            subscribers: AtomicUsize::new(0),
            last_used: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *lock(&self.last_used) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        lock(&self.last_used).elapsed()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct EntryTable<T> {
    entries: DashMap<QueryKey, Arc<Entry<T>>>,
    gc_grace: Duration,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> EntryTable<T> {
    /// Start the grace timer for a key. The entry is re-checked when the
    /// timer fires, so a key that gets used again in the meantime stays.
    fn schedule_gc(self: &Arc<Self>, key: QueryKey) {
        let table = Arc::clone(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(table.gc_grace) => table.collect(&key),
            }
        });
    }

    fn collect(&self, key: &QueryKey) {
        // The predicate runs under the shard lock, so it cannot
        // interleave with a subscriber registering on the same entry.
        let removed = self.entries.remove_if(key, |_, entry| {
            entry.subscribers.load(Ordering::SeqCst) == 0
                && entry.idle_for() >= self.gc_grace
                && lock(&entry.inflight).is_none()
        });
        if removed.is_some() {
            debug!(%key, "query cache entry discarded");
        }
    }
}

// ── Cache ────────────────────────────────────────────────────────────

/// Declarative cache for one key family (e.g. top-selling products).
///
/// Cheaply cloneable; all clones share the same entry table. Entries are
/// created lazily on first request for a key and evicted after the GC
/// grace period once unused.
pub struct QueryCache<S: QuerySource> {
    source: Arc<S>,
    config: QueryConfig,
    table: Arc<EntryTable<S::Output>>,
}

impl<S: QuerySource> Clone for QueryCache<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config,
            table: Arc::clone(&self.table),
        }
    }
}

impl<S: QuerySource> QueryCache<S> {
    pub fn new(source: S, config: QueryConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            table: Arc::new(EntryTable {
                entries: DashMap::new(),
                gc_grace: config.gc_grace,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// The state for this parameter set, fetching as needed.
    ///
    /// Fresh entry: returns cached data, no network call. Absent entry
    /// (or stale under [`RefreshMode::Block`]): joins the single
    /// in-flight request for the key and awaits it. Stale under
    /// [`RefreshMode::StaleWhileRevalidate`]: returns the stale data
    /// immediately and triggers one background refresh.
    pub async fn resource(&self, params: &S::Params) -> QueryState<S::Output> {
        let key = params.cache_key();
        let entry = self.entry(&key);
        entry.touch();

        let state = entry.state.borrow().clone();
        if state.is_fresh(self.config.fresh_for) {
            debug!(%key, "query cache hit");
            self.reap_later(&key, &entry);
            return state;
        }

        if state.data.is_some() && self.config.refresh == RefreshMode::StaleWhileRevalidate {
            debug!(%key, "query cache stale, revalidating in background");
            // The spawned driver owns the fetch; no need to hold the handle.
            drop(self.ensure_fetch(&key, &entry, params));
            self.reap_later(&key, &entry);
            return entry.state.borrow().clone();
        }

        debug!(%key, "query cache miss");
        self.ensure_fetch(&key, &entry, params).await;
        self.reap_later(&key, &entry);
        entry.state.borrow().clone()
    }

    /// Imperatively revalidate, joining any request already in flight.
    pub async fn refresh(&self, params: &S::Params) -> QueryState<S::Output> {
        let key = params.cache_key();
        let entry = self.entry(&key);
        entry.touch();

        self.ensure_fetch(&key, &entry, params).await;
        self.reap_later(&key, &entry);
        entry.state.borrow().clone()
    }

    /// Subscribe to state transitions for this parameter set.
    ///
    /// Holding the subscription pins the entry: garbage collection only
    /// considers entries whose last subscription has been dropped.
    /// Subscribing does not itself trigger a fetch — pair it with
    /// [`resource()`](Self::resource).
    pub fn subscribe(&self, params: &S::Params) -> QuerySubscription<S::Output> {
        let key = params.cache_key();
        let entry = self.entry_with_subscriber(&key);
        entry.touch();

        QuerySubscription {
            stream: StateStream::new(entry.state.subscribe()),
            _guard: SubscriberGuard {
                key,
                entry,
                table: Arc::clone(&self.table),
            },
        }
    }

    /// Cancel in-flight refreshes and pending GC timers.
    pub fn shutdown(&self) {
        self.table.cancel.cancel();
    }

    /// Number of live cache entries.
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn entry(&self, key: &QueryKey) -> Arc<Entry<S::Output>> {
        Arc::clone(
            self.table
                .entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Entry::new()))
                .value(),
        )
    }

    /// Get-or-create the entry and register the subscriber while the
    /// map guard is still held, so eviction cannot slip in between.
    fn entry_with_subscriber(&self, key: &QueryKey) -> Arc<Entry<S::Output>> {
        let entry_ref = self
            .table
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Entry::new()));
        entry_ref.subscribers.fetch_add(1, Ordering::SeqCst);
        Arc::clone(entry_ref.value())
    }

    /// Register (or join) the single in-flight fetch for a key.
    ///
    /// The `loading` flag is raised before the future is handed out, so
    /// every subscriber observes the transition in the same tick. The
    /// returned future is shared: awaiting it joins the fetch, and a
    /// spawned driver guarantees completion even with no awaiters.
    fn ensure_fetch(
        &self,
        key: &QueryKey,
        entry: &Arc<Entry<S::Output>>,
        params: &S::Params,
    ) -> InflightFuture {
        let mut slot = lock(&entry.inflight);
        if let Some(fut) = slot.as_ref() {
            return fut.clone();
        }

        entry.state.send_modify(|s| s.loading = true);

        let source = Arc::clone(&self.source);
        let params = params.clone();
        let owner = Arc::clone(entry);
        let key = key.clone();

        let fut: InflightFuture = async move {
            let result = source.fetch(&params).await;
            match result {
                Ok(data) => {
                    debug!(%key, "query fetch complete");
                    owner.state.send_modify(|s| {
                        s.data = Some(Arc::new(data));
                        s.error = None;
                        s.loading = false;
                        s.fetched_at = Some(Instant::now());
                    });
                }
                Err(e) => {
                    warn!(%key, error = %e, "query fetch failed");
                    owner.state.send_modify(|s| {
                        // Keep stale data; consumers get the error object.
                        s.error = Some(Arc::new(e));
                        s.loading = false;
                    });
                }
            }
            *lock(&owner.inflight) = None;
        }
        .boxed()
        .shared();

        *slot = Some(fut.clone());
        drop(slot);

        // Drive the fetch to completion even if every awaiter detaches.
        let driver = fut.clone();
        let cancel = self.table.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = driver => {}
            }
        });

        fut
    }

    fn reap_later(&self, key: &QueryKey, entry: &Entry<S::Output>) {
        if entry.subscribers.load(Ordering::SeqCst) == 0 {
            self.table.schedule_gc(key.clone());
        }
    }
}

// ── Subscriptions ────────────────────────────────────────────────────

/// RAII subscription to one cache entry.
pub struct QuerySubscription<T: Send + Sync + 'static> {
    stream: StateStream<QueryState<T>>,
    _guard: SubscriberGuard<T>,
}

impl<T: Send + Sync + 'static> QuerySubscription<T> {
    pub fn current(&self) -> &QueryState<T> {
        self.stream.current()
    }

    pub fn latest(&self) -> QueryState<T> {
        self.stream.latest()
    }

    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.stream.changed().await
    }
}

struct SubscriberGuard<T: Send + Sync + 'static> {
    key: QueryKey,
    entry: Arc<Entry<T>>,
    table: Arc<EntryTable<T>>,
}

impl<T: Send + Sync + 'static> Drop for SubscriberGuard<T> {
    fn drop(&mut self) {
        let before = self.entry.subscribers.fetch_sub(1, Ordering::SeqCst);
        if before == 1 {
            // Last subscriber gone — start the grace timer.
            self.entry.touch();
            self.table.schedule_gc(self.key.clone());
        }
    }
}
