//! Object store access: one metadata fetch per key.
//!
//! The batch engine only sees the two traits here. `ObjectStore` holds the
//! shared configuration and hands each worker its own `MetadataClient`, so no
//! per-call state is ever shared between workers.

mod http;
mod parse;

pub use http::{HttpClient, HttpObjectStore};

use serde::Serialize;

use crate::control::CancelToken;
use crate::key_source::Key;
use crate::retry::FetchError;

/// Metadata reported for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,
    /// Server-side encryption attribute (e.g. `AES256`, `aws:kms`); `None` when unencrypted.
    pub encoding: Option<String>,
}

/// Shared, config-holding side of an object store. One client is created per worker.
pub trait ObjectStore: Send + Sync {
    type Client: MetadataClient;

    /// Create an independent client. `cancel` lets the client abort in-flight calls.
    fn connect(&self, cancel: &CancelToken) -> Result<Self::Client, FetchError>;
}

/// A single worker's connection to the store.
pub trait MetadataClient {
    /// Fetch metadata for `key` in `bucket`. Any per-call resource must be
    /// released before this returns, on both the success and error paths.
    fn fetch(&mut self, bucket: &str, key: &Key) -> Result<ObjectMetadata, FetchError>;
}
