use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::{Config, DEFAULT_CONFIG_FILE};

/// Write the commented starter configuration file.
pub fn init_config(force: bool) -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, Config::starter_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}
