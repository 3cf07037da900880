// ── Reactive state streams ──
//
// Subscription handles for consuming cache state transitions. The caches
// notify through `watch` channels; consumers hold a `StateStream` and
// either poll `latest()` or await `changed()`.

use tokio::sync::watch;

/// A subscription to a cache's state.
///
/// Provides both point-in-time snapshot access and change notification.
/// Every mutation of the owning cache produces a new snapshot here; the
/// cache is the single writer, streams are read-only observers.
pub struct StateStream<S: Clone + Send + Sync + 'static> {
    current: S,
    receiver: watch::Receiver<S>,
}

impl<S: Clone + Send + Sync + 'static> StateStream<S> {
    pub(crate) fn new(receiver: watch::Receiver<S>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &S {
        &self.current
    }

    /// The latest snapshot (may have changed since `current`).
    pub fn latest(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state transition, returning the new snapshot.
    /// Returns `None` if the owning cache has been dropped.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
