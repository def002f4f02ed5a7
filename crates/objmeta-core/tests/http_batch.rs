//! Integration test: full batches against a local HEAD server over real HTTP.

mod common;

use std::io::Write;
use std::time::Duration;

use common::head_server::{self, TestObject};
use objmeta_core::config::Addressing;
use objmeta_core::key_source::load_keys;
use objmeta_core::sink::{LineSink, ReportField};
use objmeta_core::{
    run_batch, BatchConfig, CancelToken, FetchOutcome, HttpObjectStore, RetryPolicy,
};

fn store(endpoint: &str) -> HttpObjectStore {
    HttpObjectStore::new(endpoint, Addressing::Path)
        .unwrap()
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
}

#[test]
fn batch_reports_size_and_encryption() {
    let server = head_server::start([
        ("media/a.bin", TestObject::sized(10)),
        ("media/dir/b.bin", TestObject::encrypted(2048, "aws:kms")),
    ]);
    let keys = ["a.bin", "dir/b.bin", "missing.bin"];
    let mut sink: Vec<FetchOutcome> = Vec::new();
    let result = run_batch(
        &store(&server.endpoint),
        &BatchConfig::new("media", 2),
        keys,
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.workers, 2);
    assert!(matches!(
        result.get("a.bin"),
        Some(FetchOutcome::Success { size: 10, encoding: None, .. })
    ));
    assert!(matches!(
        result.get("dir/b.bin"),
        Some(FetchOutcome::Success { size: 2048, encoding: Some(e), .. }) if e == "aws:kms"
    ));
    assert!(matches!(
        result.get("missing.bin"),
        Some(FetchOutcome::Failure { cause, attempts: 1, .. }) if cause == "not found"
    ));
    assert_eq!(server.requests(), 3);
}

#[test]
fn throttled_object_succeeds_with_retry() {
    let server = head_server::start([("b/slow", TestObject::flaky(7, 2))]);
    let config =
        BatchConfig::new("b", 4).with_retry(RetryPolicy::new(3, Duration::from_millis(10)));
    let mut sink: Vec<FetchOutcome> = Vec::new();
    let result = run_batch(
        &store(&server.endpoint),
        &config,
        ["slow"],
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();
    assert!(matches!(
        result.get("slow"),
        Some(FetchOutcome::Success { size: 7, attempts: 3, .. })
    ));
    assert_eq!(server.hits("b/slow"), 3);
}

#[test]
fn throttled_object_fails_fast_without_retry() {
    let server = head_server::start([("b/slow", TestObject::flaky(7, 1))]);
    let mut sink: Vec<FetchOutcome> = Vec::new();
    let result = run_batch(
        &store(&server.endpoint),
        &BatchConfig::new("b", 4),
        ["slow"],
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();
    assert!(matches!(
        result.get("slow"),
        Some(FetchOutcome::Failure { cause, .. }) if cause == "HTTP 503"
    ));
    assert_eq!(server.hits("b/slow"), 1);
}

#[test]
fn key_list_file_to_text_lines() {
    let objects: Vec<(String, TestObject)> = (0..40)
        .map(|i| (format!("logs/part-{i:03}"), TestObject::sized(i)))
        .collect();
    let server = head_server::start(objects);

    let mut list = tempfile::NamedTempFile::new().unwrap();
    for i in 0..40 {
        writeln!(list, "part-{i:03}\r").unwrap();
    }
    list.flush().unwrap();
    let keys = load_keys(list.path()).unwrap();
    assert_eq!(keys.len(), 40);

    let mut sink = LineSink::new(Vec::new(), ReportField::Size);
    let result = run_batch(
        &store(&server.endpoint),
        &BatchConfig::new("logs", 8),
        keys.into_iter().map(String::from),
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(result.success_count(), 40);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines.len(), 40);
    assert_eq!(lines[0], "Key: part-000 - Size: 0");
    assert_eq!(lines[39], "Key: part-039 - Size: 39");
}

#[test]
fn unreachable_endpoint_fails_every_key() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let endpoint = format!("http://127.0.0.1:{port}");
    let mut sink: Vec<FetchOutcome> = Vec::new();
    let result = run_batch(
        &store(&endpoint),
        &BatchConfig::new("b", 2),
        ["x", "y", "z"],
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(result.failure_count(), 3);
}

#[test]
fn dot_segments_reach_the_server_verbatim() {
    let server = head_server::start([
        ("b/a/%2E%2E/b", TestObject::sized(11)),
        ("b/a/b", TestObject::sized(22)),
        ("b/%2E/x", TestObject::sized(33)),
    ]);
    let mut sink: Vec<FetchOutcome> = Vec::new();
    let result = run_batch(
        &store(&server.endpoint),
        &BatchConfig::new("b", 2),
        ["a/../b", "./x"],
        &mut sink,
        &CancelToken::new(),
    )
    .unwrap();
    assert!(matches!(
        result.get("a/../b"),
        Some(FetchOutcome::Success { size: 11, .. })
    ));
    assert!(matches!(
        result.get("./x"),
        Some(FetchOutcome::Success { size: 33, .. })
    ));
    assert_eq!(server.hits("b/a/b"), 0);
}
