pub mod config;
pub mod logging;

pub mod batch;
pub mod control;
pub mod error;
pub mod key_source;
pub mod object_store;
pub mod retry;
pub mod sink;

pub use batch::{run_batch, BatchConfig, BatchResult, FetchOutcome};
pub use control::CancelToken;
pub use error::{BatchError, ConfigError, KeySourceError};
pub use key_source::Key;
pub use object_store::{HttpObjectStore, MetadataClient, ObjectMetadata, ObjectStore};
pub use retry::{FetchError, RetryPolicy};
