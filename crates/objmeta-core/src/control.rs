//! Batch cancellation: a shared abort token and the one-shot latch behind it.
//!
//! A `CancelToken` is handed to the dispatcher, every worker and every client
//! connection. The CLI cancels it on Ctrl-C; the dispatcher stops enqueueing,
//! workers stop dequeueing, retry waits are cut short and in-flight HTTP
//! transfers abort through the curl progress callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// One-shot signal usable inside `crossbeam_channel::select!`.
///
/// Releasing drops the only sender, so every receiver observes a
/// disconnected channel from then on.
#[derive(Debug)]
pub(crate) struct Latch {
    tx: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

impl Latch {
    pub(crate) fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Release the latch. Returns true for the call that actually released it.
    pub(crate) fn release(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub(crate) fn is_released(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (with `Err`) once the latch is released.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

#[derive(Debug)]
struct Inner {
    flag: AtomicBool,
    latch: Latch,
}

/// Shared abort token for one batch run. Cloning is cheap; all clones
/// observe the same cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                latch: Latch::new(),
            }),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::Release);
        if self.inner.latch.release() {
            tracing::info!("batch cancellation requested");
        }
    }

    /// Cheap check, safe to call from the curl progress callback.
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Sleep for up to `timeout`. Returns true if cancelled before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        crossbeam_channel::select! {
            recv(self.inner.latch.receiver()) -> _ => true,
            default(timeout) => self.is_cancelled(),
        }
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        self.inner.latch.receiver()
    }
}

/// Cancels the batch if dropped while the owning thread is panicking.
pub(crate) struct CancelOnPanic<'a>(pub(crate) &'a CancelToken);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!("thread panicked; cancelling batch");
            self.0.cancel();
        }
    }
}
