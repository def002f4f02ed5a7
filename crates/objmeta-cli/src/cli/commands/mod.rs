//! CLI command handlers, one file per command.

mod completions;
mod config;
mod fetch;
mod man;

pub use completions::run_completions;
pub use config::run_config;
pub use fetch::run_fetch;
pub(crate) use fetch::{exit_status, resolve};
pub use man::run_man;
