//! A single pool worker: dequeue, fetch, report, maybe resubmit.

use crate::control::{CancelOnPanic, CancelToken};
use crate::object_store::{MetadataClient, ObjectStore};
use crate::retry::{classify, FetchError, RetryDecision, RetryPolicy};

use super::outcome::FetchOutcome;
use super::pending::{AbandonOnPanic, PendingWork};
use super::queue::{Job, WorkerChannels};

pub(super) struct Worker<'a, C> {
    id: usize,
    /// `Err` holds the connect failure; every job then fails with it.
    client: Result<C, String>,
    bucket: &'a str,
    retry: Option<RetryPolicy>,
    channels: WorkerChannels,
    pending: &'a PendingWork,
    cancel: &'a CancelToken,
}

impl<'a, C: MetadataClient> Worker<'a, C> {
    pub(super) fn connect<S>(
        id: usize,
        store: &S,
        bucket: &'a str,
        retry: Option<RetryPolicy>,
        channels: WorkerChannels,
        pending: &'a PendingWork,
        cancel: &'a CancelToken,
    ) -> Self
    where
        S: ObjectStore<Client = C>,
    {
        let client = store.connect(cancel).map_err(|e| {
            tracing::error!(worker = id, "client setup failed: {}", e);
            format!("client setup failed: {e}")
        });
        Self {
            id,
            client,
            bucket,
            retry,
            channels,
            pending,
            cancel,
        }
    }

    /// Run until no work is pending or the batch is cancelled. Returns the
    /// number of fetch attempts made.
    pub(super) fn run(mut self) -> usize {
        let _abandon = AbandonOnPanic(self.pending);
        let _cancel = CancelOnPanic(self.cancel);
        let span = tracing::debug_span!("worker", id = self.id);
        let _enter = span.enter();

        let mut jobs = self.channels.jobs.clone();
        let retries = self.channels.retries.clone();
        let mut attempts = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let job = crossbeam_channel::select! {
                recv(jobs) -> msg => match msg {
                    Ok(job) => job,
                    Err(_) => {
                        // Closed and drained; retries may still arrive.
                        jobs = crossbeam_channel::never();
                        continue;
                    }
                },
                recv(retries) -> msg => match msg {
                    Ok(job) => job,
                    Err(_) => break,
                },
                recv(self.pending.done()) -> _ => break,
                recv(self.cancel.receiver()) -> _ => break,
            };
            attempts += 1;
            self.process(job);
        }
        tracing::debug!(attempts, drained = self.pending.is_done(), "worker exiting");
        attempts
    }

    fn process(&mut self, job: Job) {
        let result = match self.client.as_mut() {
            Ok(client) => client.fetch(self.bucket, &job.key),
            Err(cause) => Err(FetchError::Other(cause.clone())),
        };
        match result {
            Ok(meta) => {
                tracing::trace!(key = %job.key, attempt = job.attempt, size = meta.size, "fetched");
                self.finish(FetchOutcome::success(job.key, meta, job.attempt));
            }
            Err(err) => {
                let decision = match self.retry {
                    Some(policy) => policy.decide(job.attempt, classify(&err)),
                    None => RetryDecision::NoRetry,
                };
                let job = match decision {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::debug!(
                            key = %job.key,
                            attempt = job.attempt,
                            "fetch failed, retrying in {:?}: {}",
                            delay,
                            err
                        );
                        match self.resubmit(job, delay) {
                            Ok(()) => return,
                            Err(job) => job,
                        }
                    }
                    RetryDecision::NoRetry => job,
                };
                tracing::warn!(key = %job.key, attempts = job.attempt, "fetch failed: {}", err);
                self.finish(FetchOutcome::failure(job.key, err.to_string(), job.attempt));
            }
        }
    }

    /// Wait out the retry delay, then hand the key to the retry channel.
    /// Gives the job back if the batch was cancelled meanwhile.
    fn resubmit(&self, job: Job, delay: std::time::Duration) -> Result<(), Job> {
        if self.cancel.wait_timeout(delay) {
            return Err(job);
        }
        self.pending.add_one();
        match self.channels.resubmit.send(job.next_attempt()) {
            Ok(()) => {
                self.pending.complete_one();
                Ok(())
            }
            Err(returned) => {
                self.pending.complete_one();
                let mut job = returned.into_inner();
                job.attempt -= 1;
                Err(job)
            }
        }
    }

    /// Report a terminal outcome, then release its pending slot.
    fn finish(&self, outcome: FetchOutcome) {
        if self.channels.results.send(outcome).is_err() {
            tracing::warn!("result collector gone; outcome dropped");
        }
        self.pending.complete_one();
    }
}

