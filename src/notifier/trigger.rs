use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

use crate::system::ChangeCallback;

/// Coalescing wake-up shared between change notifiers and the reconcile loop.
///
/// Any number of `signal` calls made while the loop is busy collapse into a
/// single pending wake-up, so at most one follow-up cycle is queued.
#[derive(Clone, Default)]
pub struct ChangeTrigger {
    inner: Arc<TriggerInner>,
}

#[derive(Default)]
struct TriggerInner {
    notify: Notify,
    signals: AtomicU64,
}

impl ChangeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a "devices possibly changed" signal. Callable from any thread.
    pub fn signal(&self) {
        self.inner.signals.fetch_add(1, Ordering::Relaxed);
        self.inner.notify.notify_one();
    }

    /// Wait for the next (possibly coalesced) signal
    pub async fn wait(&self) {
        self.inner.notify.notified().await;
    }

    /// Total signals received, before coalescing
    pub fn signal_count(&self) -> u64 {
        self.inner.signals.load(Ordering::Relaxed)
    }

    pub fn callback(&self) -> ChangeCallback {
        let trigger = self.clone();
        Arc::new(move || trigger.signal())
    }
}
