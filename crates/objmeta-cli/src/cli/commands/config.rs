//! `objmeta config` – show where the config lives and what it resolves to.

use std::path::Path;

use anyhow::Result;
use objmeta_core::config::{self, ObjmetaConfig};

pub fn run_config(explicit: Option<&Path>, cfg: &ObjmetaConfig) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
