//! Terminal per-key results and the batch summary built from them.

use std::time::Duration;

use serde::Serialize;

use crate::key_source::Key;
use crate::object_store::ObjectMetadata;

/// The terminal record for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success {
        key: Key,
        size: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        encoding: Option<String>,
        attempts: u32,
    },
    Failure {
        key: Key,
        cause: String,
        attempts: u32,
    },
}

impl FetchOutcome {
    pub(crate) fn success(key: Key, meta: ObjectMetadata, attempts: u32) -> Self {
        FetchOutcome::Success {
            key,
            size: meta.size,
            encoding: meta.encoding,
            attempts,
        }
    }

    pub(crate) fn failure(key: Key, cause: impl Into<String>, attempts: u32) -> Self {
        FetchOutcome::Failure {
            key,
            cause: cause.into(),
            attempts,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            FetchOutcome::Success { key, .. } | FetchOutcome::Failure { key, .. } => key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Number of fetch calls made for this key.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. } | FetchOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Everything one batch run produced, in arrival order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Terminal outcomes in the order the aggregator received them (not key order).
    pub outcomes: Vec<FetchOutcome>,
    /// Number of workers actually spawned.
    pub workers: usize,
    /// True if the batch was cancelled; some keys may then have no outcome.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_success())
    }

    /// Find the outcome for `key` (first match when the list held duplicates).
    pub fn get(&self, key: &str) -> Option<&FetchOutcome> {
        self.outcomes.iter().find(|o| o.key().as_str() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Key {
        Key::new(s, 1).unwrap()
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let o = FetchOutcome::success(
            key("a"),
            ObjectMetadata {
                size: 10,
                encoding: Some("AES256".to_string()),
            },
            1,
        );
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["key"], "a");
        assert_eq!(v["size"], 10);
        assert_eq!(v["encoding"], "AES256");

        let f = FetchOutcome::failure(key("b"), "not found", 2);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["status"], "failure");
        assert_eq!(v["cause"], "not found");
        assert_eq!(v["attempts"], 2);
    }

    #[test]
    fn unencrypted_success_omits_encoding() {
        let o = FetchOutcome::success(
            key("a"),
            ObjectMetadata {
                size: 1,
                encoding: None,
            },
            1,
        );
        let v = serde_json::to_value(&o).unwrap();
        assert!(v.get("encoding").is_none());
    }

    #[test]
    fn batch_result_counts() {
        let result = BatchResult {
            outcomes: vec![
                FetchOutcome::failure(key("c"), "boom", 1),
                FetchOutcome::success(
                    key("a"),
                    ObjectMetadata {
                        size: 1,
                        encoding: None,
                    },
                    1,
                ),
            ],
            workers: 2,
            cancelled: false,
            elapsed: Duration::ZERO,
        };
        assert_eq!(result.len(), 2);
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 1);
        assert!(result.has_failures());
        assert!(result.get("c").is_some_and(|o| !o.is_success()));
        assert!(result.get("zzz").is_none());
    }
}
