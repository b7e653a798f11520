// ── Single-flight refresh gate ──
//
// Serializes refreshes of one resource and lets late arrivals piggyback
// on a refresh that started after they asked for one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

pub(crate) struct RefreshGate {
    lock: Mutex<()>,
    /// Tickets handed out so far. Only incremented under `lock`.
    started: AtomicU64,
    /// Ticket of the most recent refresh that finished, either way.
    finished: AtomicU64,
    /// Ticket of the most recent refresh that finished successfully.
    succeeded: AtomicU64,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            started: AtomicU64::new(0),
            finished: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
        }
    }

    /// Run `refresh` unless a refresh that was in flight or started after
    /// this call has meanwhile succeeded. Returns whether `refresh` ran.
    pub(crate) async fn run<F, Fut, E>(&self, refresh: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let finished_before = self.finished.load(Ordering::Acquire);
        let _guard = self.lock.lock().await;

        if self.succeeded.load(Ordering::Acquire) > finished_before {
            return Ok(false);
        }

        let ticket = self.started.fetch_add(1, Ordering::AcqRel) + 1;
        let outcome = refresh().await;
        self.finished.store(ticket, Ordering::Release);
        outcome?;
        self.succeeded.store(ticket, Ordering::Release);
        Ok(true)
    }
}
