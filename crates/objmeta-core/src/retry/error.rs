//! Per-key fetch error type.

use thiserror::Error;

/// Error returned by a single metadata fetch. Classified by
/// [`classify`](super::classify) before the worker decides whether to retry.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The object does not exist (HTTP 404).
    #[error("not found")]
    NotFound,
    /// Response had a non-2xx status other than 404.
    #[error("HTTP {0}")]
    Http(u32),
    /// 2xx response without a usable `Content-Length`.
    #[error("response has no Content-Length")]
    MissingSize,
    /// Bucket/key could not be turned into a request URL.
    #[error("invalid object URL: {0}")]
    InvalidUrl(String),
    /// The batch was cancelled while this fetch was in flight.
    #[error("cancelled")]
    Cancelled,
    /// Anything else a client implementation wants to surface.
    #[error("{0}")]
    Other(String),
}
