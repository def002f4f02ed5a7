//! Fan-in: drain the result channel on the caller's thread.

use std::io;

use crossbeam_channel::Receiver;

use crate::control::CancelToken;
use crate::sink::OutcomeSink;

use super::outcome::FetchOutcome;

pub(super) struct Collected {
    pub(super) outcomes: Vec<FetchOutcome>,
    /// First sink failure, if any.
    pub(super) sink_error: Option<io::Error>,
}

/// Collect outcomes until every worker has dropped its result sender,
/// forwarding each to `sink` as it arrives.
///
/// The first sink failure cancels the batch. Outcomes still arriving are
/// collected but not written.
pub(super) fn collect(
    results: Receiver<FetchOutcome>,
    sink: &mut dyn OutcomeSink,
    expected: usize,
    cancel: &CancelToken,
) -> Collected {
    let mut outcomes = Vec::with_capacity(expected);
    let mut sink_error = None;
    for outcome in results.iter() {
        if sink_error.is_none() {
            if let Err(e) = sink.record(&outcome) {
                tracing::error!("output sink failed, cancelling batch: {}", e);
                cancel.cancel();
                sink_error = Some(e);
            }
        }
        outcomes.push(outcome);
    }
    if sink_error.is_none() {
        if let Err(e) = sink.finish() {
            tracing::error!("output sink flush failed: {}", e);
            sink_error = Some(e);
        }
    }
    Collected {
        outcomes,
        sink_error,
    }
}
