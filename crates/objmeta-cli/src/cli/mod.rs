//! CLI for objmeta: batch object metadata lookups.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use objmeta_core::config::{self, ObjmetaConfig};
use objmeta_core::sink::ReportField;

use commands::{run_completions, run_config, run_fetch, run_man};

/// Top-level CLI for objmeta.
#[derive(Debug, Parser)]
#[command(name = "objmeta", version)]
#[command(about = "objmeta: fetch size and encryption metadata for many object-store keys", long_about = None)]
pub struct Cli {
    /// Read configuration from FILE instead of ~/.config/objmeta/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch metadata for every key in a list, one HEAD request per key.
    Fetch(FetchArgs),

    /// Show the config file path and the effective configuration.
    Config,

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Bucket holding the keys.
    #[arg(short, long)]
    pub bucket: String,

    /// File with one key per line.
    #[arg(short = 'l', long = "list", value_name = "FILE")]
    pub list: PathBuf,

    /// Number of concurrent workers (capped at the number of keys).
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Resubmit keys that fail with a transient error.
    #[arg(long, conflicts_with = "no_retry")]
    pub retry: bool,

    /// Never resubmit, even if the config file has a [retry] section.
    #[arg(long)]
    pub no_retry: bool,

    /// Attempts per key including the first (implies --retry).
    #[arg(long, value_name = "N", conflicts_with = "no_retry")]
    pub max_attempts: Option<u32>,

    /// Delay before a failed key is resubmitted (implies --retry).
    #[arg(long, value_name = "MS", conflicts_with = "no_retry")]
    pub retry_delay_ms: Option<u64>,

    /// Object store endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Address objects as {endpoint}/{bucket}/{key}.
    #[arg(long, conflicts_with = "virtual_style")]
    pub path_style: bool,

    /// Address objects as {bucket}.{endpoint host}/{key}.
    #[arg(long)]
    pub virtual_style: bool,

    /// Attribute printed for successful keys.
    #[arg(long, value_enum, default_value_t = Show::Size)]
    pub show: Show,

    /// Print one JSON object per key instead of text lines.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Show {
    Size,
    Encryption,
}

impl From<Show> for ReportField {
    fn from(show: Show) -> Self {
        match show {
            Show::Size => ReportField::Size,
            Show::Encryption => ReportField::Encryption,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ObjmetaConfig> {
    let cfg = match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch(args) => {
                let cfg = load_config(cli.config.as_ref())?;
                run_fetch(args, &cfg).await
            }
            CliCommand::Config => {
                let cfg = load_config(cli.config.as_ref())?;
                run_config(cli.config.as_deref(), &cfg)?;
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Completions { shell } => {
                run_completions(shell);
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Man => {
                run_man()?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

#[cfg(test)]
mod tests;
