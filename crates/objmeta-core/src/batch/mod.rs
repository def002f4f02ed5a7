//! The batch engine: a bounded worker pool fed by a dispatcher, draining into
//! a single aggregator.
//!
//! ```text
//! dispatcher ──jobs (bounded)──▶ workers ──results (bounded)──▶ aggregator ──▶ sink
//!                                  ▲   │
//!                                  └───┘ retries (unbounded)
//! ```
//!
//! All threads are scoped to one `run_batch` call. The job queue is closed by
//! the dispatcher returning; retries travel on their own channel; a pending
//! counter decides when workers may stop waiting for resubmissions.

mod aggregate;
mod outcome;
mod pending;
mod queue;
mod worker;

pub use outcome::{BatchResult, FetchOutcome};

use std::thread;
use std::time::Instant;

use crate::control::CancelToken;
use crate::error::{BatchError, ConfigError};
use crate::key_source::Key;
use crate::object_store::ObjectStore;
use crate::retry::RetryPolicy;
use crate::sink::OutcomeSink;

use pending::{AbandonOnPanic, PendingWork};
use queue::WorkerChannels;
use worker::Worker;

/// Default pool size when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 20;

/// Pool configuration for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub bucket: String,
    /// Upper bound on concurrent workers; the pool never exceeds the key count.
    pub worker_count: usize,
    /// `None` is fail-fast: every failed fetch is terminal.
    pub retry: Option<RetryPolicy>,
}

impl BatchConfig {
    pub fn new(bucket: impl Into<String>, worker_count: usize) -> Self {
        Self {
            bucket: bucket.into(),
            worker_count,
            retry: None,
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::EmptyBucket);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if matches!(self.retry, Some(p) if p.max_attempts == 0) {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Number of workers actually spawned for `key_count` keys.
    pub fn effective_workers(&self, key_count: usize) -> usize {
        self.worker_count.min(key_count)
    }
}

/// Fetch metadata for every key, forwarding each terminal outcome to `sink`
/// as it arrives.
///
/// Keys and configuration are validated before any thread starts, so an empty
/// key anywhere in the list means no fetch is made. Per-key failures never
/// abort the batch; they become `FetchOutcome::Failure` records. Returns once
/// every key has a terminal outcome, or once the batch has been cancelled and
/// in-flight work has wound down.
///
/// A failing `sink` cancels the batch and is reported as `BatchError::Output`.
pub fn run_batch<S, I, T>(
    store: &S,
    config: &BatchConfig,
    keys: I,
    sink: &mut dyn OutcomeSink,
    cancel: &CancelToken,
) -> Result<BatchResult, BatchError>
where
    S: ObjectStore,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    config.validate()?;
    let keys = Key::parse_all(keys)?;
    let started = Instant::now();
    let total = keys.len();
    let workers = config.effective_workers(total);

    tracing::info!(
        bucket = %config.bucket,
        keys = total,
        workers,
        retry = config.retry.is_some(),
        "starting batch"
    );

    if total == 0 {
        sink.finish().map_err(BatchError::Output)?;
        return Ok(BatchResult {
            outcomes: Vec::new(),
            workers: 0,
            cancelled: cancel.is_cancelled(),
            elapsed: started.elapsed(),
        });
    }

    let pending = PendingWork::new(total);
    let pending = &pending;
    let (job_tx, job_rx) = crossbeam_channel::bounded(workers);
    let (retry_tx, retry_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::bounded(workers);
    let channels = WorkerChannels {
        jobs: job_rx,
        retries: retry_rx,
        resubmit: retry_tx,
        results: result_tx,
    };
    let bucket = config.bucket.as_str();
    let retry = config.retry;

    let (collected, attempts) = thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let name = format!("objmeta-worker-{id}");
            let channels = channels.clone();
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn_scoped(s, move || {
                    Worker::connect(id, store, bucket, retry, channels, pending, cancel).run()
                });
            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    // Workers already running exit once the latch is released.
                    pending.abandon();
                    return Err(BatchError::Spawn { name, source });
                }
            }
        }
        // Only worker-held ends remain, so the aggregator sees disconnection
        // exactly when the last worker exits.
        drop(channels);

        let dispatcher = thread::Builder::new()
            .name("objmeta-dispatch".to_string())
            .spawn_scoped(s, move || {
                let _abandon = AbandonOnPanic(pending);
                queue::dispatch(keys, job_tx, cancel)
            })
            .map_err(|source| {
                pending.abandon();
                BatchError::Spawn {
                    name: "objmeta-dispatch".to_string(),
                    source,
                }
            })?;

        let collected = aggregate::collect(result_rx, sink, total, cancel);

        let mut attempts = 0usize;
        let mut panicked = None;
        for (id, handle) in handles {
            match handle.join() {
                Ok(n) => attempts += n,
                Err(_) => {
                    tracing::error!(worker = id, "worker panicked");
                    panicked.get_or_insert(id);
                }
            }
        }
        let dispatched = dispatcher
            .join()
            .map_err(|_| BatchError::DispatcherPanicked)?;
        if let Some(id) = panicked {
            return Err(BatchError::WorkerPanicked(id));
        }
        tracing::debug!(dispatched, "dispatcher finished");
        Ok((collected, attempts))
    })?;
    if let Some(e) = collected.sink_error {
        return Err(BatchError::Output(e));
    }
    let outcomes = collected.outcomes;

    let result = BatchResult {
        outcomes,
        workers,
        cancelled: cancel.is_cancelled(),
        elapsed: started.elapsed(),
    };
    if !result.cancelled && result.len() != total {
        tracing::warn!(
            expected = total,
            received = result.len(),
            "batch ended with missing outcomes"
        );
    }
    tracing::info!(
        succeeded = result.success_count(),
        failed = result.failure_count(),
        attempts,
        cancelled = result.cancelled,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "batch finished"
    );
    Ok(result)
}
