//! Job queue, retry channel and the dispatcher that feeds them.
//!
//! The dispatcher owns the only sender of the bounded job queue, so the queue
//! is closed exactly once: when the dispatcher returns. Resubmissions never go
//! back into it; they use the pool's unbounded retry channel, which stays open
//! as long as any worker is alive.

use crossbeam_channel::{Receiver, Sender};

use crate::control::CancelToken;
use crate::key_source::Key;

use super::outcome::FetchOutcome;

/// One unit of work: a key and the attempt number about to be made (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Job {
    pub(crate) key: Key,
    pub(crate) attempt: u32,
}

impl Job {
    pub(crate) fn first(key: Key) -> Self {
        Self { key, attempt: 1 }
    }

    pub(crate) fn next_attempt(self) -> Self {
        Self {
            key: self.key,
            attempt: self.attempt + 1,
        }
    }
}

/// The channel ends a worker holds.
#[derive(Debug, Clone)]
pub(crate) struct WorkerChannels {
    pub(crate) jobs: Receiver<Job>,
    pub(crate) retries: Receiver<Job>,
    pub(crate) resubmit: Sender<Job>,
    pub(crate) results: Sender<FetchOutcome>,
}

/// Push every key into the job queue, then close it by dropping the sender.
///
/// Blocks while the queue is full. Stops early on cancellation or when every
/// worker has gone away. Returns the number of keys enqueued.
pub(crate) fn dispatch(keys: Vec<Key>, jobs: Sender<Job>, cancel: &CancelToken) -> usize {
    let total = keys.len();
    let mut sent = 0usize;
    for key in keys {
        if cancel.is_cancelled() {
            break;
        }
        crossbeam_channel::select! {
            send(jobs, Job::first(key)) -> res => {
                if res.is_err() {
                    tracing::warn!(sent, total, "no workers left; dispatch stopped");
                    break;
                }
                sent += 1;
            }
            recv(cancel.receiver()) -> _ => break,
        }
    }
    if sent < total {
        tracing::debug!(sent, total, "dispatch ended early");
    } else {
        tracing::debug!(sent, "all keys enqueued; closing job queue");
    }
    sent
}
