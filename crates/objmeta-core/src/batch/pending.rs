//! Outstanding-work counter that decides when a batch is complete.
//!
//! Starts at the key count. A resubmission adds one item before the failed
//! attempt is released, so the count can only reach zero once every key has a
//! terminal outcome, even if the job queue closed long before.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::Receiver;

use crate::control::Latch;

#[derive(Debug)]
pub(crate) struct PendingWork {
    remaining: AtomicUsize,
    done: Latch,
}

impl PendingWork {
    pub(crate) fn new(items: usize) -> Self {
        let done = Latch::new();
        if items == 0 {
            done.release();
        }
        Self {
            remaining: AtomicUsize::new(items),
            done,
        }
    }

    /// Track a resubmitted item. Call before `complete_one` for the attempt it replaces.
    pub(crate) fn add_one(&self) {
        self.remaining.fetch_add(1, Ordering::AcqRel);
    }

    /// Release one item; the last release signals completion.
    pub(crate) fn complete_one(&self) {
        let prev = self.remaining.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "pending work released more often than tracked");
        if prev == 1 {
            self.done.release();
        }
    }

    /// Give up on the remaining items (a worker or the dispatcher died) so idle workers exit.
    pub(crate) fn abandon(&self) {
        if self.done.release() {
            tracing::warn!(remaining = self.remaining(), "abandoning pending work");
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.is_released()
    }

    /// Becomes ready once no work is pending.
    pub(crate) fn done(&self) -> &Receiver<()> {
        self.done.receiver()
    }
}

/// Abandons pending work if dropped while the owning thread is panicking.
pub(super) struct AbandonOnPanic<'a>(pub(super) &'a PendingWork);

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abandon();
        }
    }
}
