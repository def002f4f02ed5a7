//! Retry policy for per-key fetches.
//!
//! This module classifies fetch errors (timeouts, throttling, connection
//! failures, permanent HTTP errors) and decides whether a failed key is
//! resubmitted, so the worker pool and the HTTP client share one policy.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
