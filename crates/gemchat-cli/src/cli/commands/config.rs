//! Config subcommands.

use anyhow::{Context, Result};
use gemchat_core::config::{default_config_template, paths};

pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

pub fn init() -> Result<()> {
    let path = paths::config_path();
    if path.exists() {
        anyhow::bail!("Config already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, default_config_template())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created config at {}", path.display());
    Ok(())
}
