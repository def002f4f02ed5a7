use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of fetch attempts per key (including the first).
    pub max_attempts: u32,
    /// Delay in milliseconds before a failed key is resubmitted.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: policy.delay.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

/// How the bucket appears in object URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// `https://{bucket}.{endpoint host}/{key}`
    #[default]
    Virtual,
    /// `{endpoint}/{bucket}/{key}` (MinIO, LocalStack, IP endpoints).
    Path,
}

/// Global configuration loaded from `~/.config/objmeta/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjmetaConfig {
    /// Number of concurrent fetch workers (capped at the key count per batch).
    pub workers: usize,
    /// Object store endpoint URL.
    pub endpoint: String,
    /// Bucket addressing style: "virtual" (default) or "path".
    pub addressing: Addressing,
    /// TCP/TLS connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request, in seconds.
    pub request_timeout_secs: u64,
    /// Retry policy; when present, failed keys are resubmitted by default.
    pub retry: Option<RetryConfig>,
}

impl Default for ObjmetaConfig {
    fn default() -> Self {
        Self {
            workers: crate::batch::DEFAULT_WORKERS,
            endpoint: "https://s3.amazonaws.com".to_string(),
            addressing: Addressing::Virtual,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            retry: None,
        }
    }
}

impl ObjmetaConfig {
    /// Render as the TOML written to `config.toml`.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("objmeta")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ObjmetaConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ObjmetaConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<ObjmetaConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: ObjmetaConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
