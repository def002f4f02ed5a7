//! `objmeta fetch` – run one metadata batch and stream results to stdout.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use objmeta_core::config::{Addressing, ObjmetaConfig};
use objmeta_core::key_source::load_keys;
use objmeta_core::sink::{JsonLinesSink, LineSink, ReportField};
use objmeta_core::{run_batch, BatchConfig, BatchResult, CancelToken, HttpObjectStore};

use crate::cli::FetchArgs;

/// Exit status when at least one key ended in failure.
const EXIT_FAILURES: u8 = 2;
/// Exit status after Ctrl-C (128 + SIGINT).
const EXIT_CANCELLED: u8 = 130;

/// Merge command-line flags over the config file.
pub(crate) fn resolve(args: &FetchArgs, file: &ObjmetaConfig) -> (ObjmetaConfig, BatchConfig) {
    let mut cfg = file.clone();
    if let Some(endpoint) = &args.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if args.path_style {
        cfg.addressing = Addressing::Path;
    } else if args.virtual_style {
        cfg.addressing = Addressing::Virtual;
    }
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }

    let retry_requested = args.retry || args.max_attempts.is_some() || args.retry_delay_ms.is_some();
    if args.no_retry {
        cfg.retry = None;
    } else if retry_requested || cfg.retry.is_some() {
        let mut retry = cfg.retry.take().unwrap_or_default();
        if let Some(n) = args.max_attempts {
            retry.max_attempts = n;
        }
        if let Some(ms) = args.retry_delay_ms {
            retry.delay_ms = ms;
        }
        cfg.retry = Some(retry);
    }

    let mut batch = BatchConfig::new(args.bucket.clone(), cfg.workers);
    if let Some(retry) = &cfg.retry {
        batch = batch.with_retry(retry.to_policy());
    }
    (cfg, batch)
}

pub(crate) fn exit_status(result: &BatchResult) -> u8 {
    if result.cancelled {
        EXIT_CANCELLED
    } else if result.has_failures() {
        EXIT_FAILURES
    } else {
        0
    }
}

pub async fn run_fetch(args: FetchArgs, file_cfg: &ObjmetaConfig) -> Result<ExitCode> {
    let (cfg, batch) = resolve(&args, file_cfg);
    batch.validate()?;
    let keys = load_keys(&args.list)?;
    let store = HttpObjectStore::from_config(&cfg)?;
    tracing::debug!(endpoint = %store.endpoint(), addressing = ?cfg.addressing, "object store ready");

    let cancel = CancelToken::new();
    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupted; waiting for in-flight requests");
                cancel.cancel();
            }
        }
    });

    let json = args.json;
    let field = ReportField::from(args.show);
    let result = tokio::task::spawn_blocking(move || {
        let keys = keys.into_iter().map(String::from);
        let stdout = io::stdout().lock();
        if json {
            run_batch(&store, &batch, keys, &mut JsonLinesSink::new(stdout), &cancel)
        } else {
            run_batch(&store, &batch, keys, &mut LineSink::new(stdout, field), &cancel)
        }
    })
    .await
    .context("batch task failed")??;
    signal.abort();

    print_summary(&result);
    Ok(ExitCode::from(exit_status(&result)))
}

fn print_summary(result: &BatchResult) {
    let secs = result.elapsed.as_secs_f64();
    let rate = if result.elapsed > Duration::ZERO {
        result.len() as f64 / secs
    } else {
        0.0
    };
    eprintln!(
        "{} key(s): {} ok, {} failed in {:.1}s ({:.0}/s, {} workers){}",
        result.len(),
        result.success_count(),
        result.failure_count(),
        secs,
        rate,
        result.workers,
        if result.cancelled { " [cancelled]" } else { "" }
    );
}
