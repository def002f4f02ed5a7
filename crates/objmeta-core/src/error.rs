//! Error types shared across the core crate.
//!
//! Per-key fetch failures live in [`crate::retry::FetchError`]; everything here
//! is fatal for a batch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid input detected before any fetch is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A key list entry was empty. `position` is 1-based (line number for files).
    #[error("empty key at position {position}")]
    EmptyKey { position: usize },

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("bucket name must not be empty")]
    EmptyBucket,

    #[error("retry max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Failure while reading a key list.
#[derive(Debug, Error)]
pub enum KeySourceError {
    #[error("reading key list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading key list: {0}")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// A batch that could not run to completion.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("dispatcher panicked")]
    DispatcherPanicked,

    /// The output sink failed; the batch was cancelled.
    #[error("writing results: {0}")]
    Output(#[source] io::Error),
}
