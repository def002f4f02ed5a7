use std::time::Duration;

/// High-level classification of a fetch error for retry purposes.
///
/// Client implementations map their own failures (HTTP status codes, curl
/// errors) into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read, or HTTP 408).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Object does not exist. Never retried.
    NotFound,
    /// Batch was cancelled. Never retried.
    Cancelled,
    /// Any other error (not retried).
    Other,
}

impl ErrorKind {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::Connection | ErrorKind::Throttled | ErrorKind::Http5xx(_)
        )
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Surface the failure as the key's terminal outcome.
    NoRetry,
    /// Resubmit the key after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay resubmission with a hard attempt bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of fetch attempts per key (including the first).
    pub max_attempts: u32,
    /// Delay before a failed key is resubmitted. The worker that saw the
    /// failure sleeps through it, so each pending retry holds one worker.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_transient() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay)
    }
}
