//! Init command implementation
//!
//! Handles `breach init`: writes a starter `.breach.toml`.

use anyhow::{Context, Result};
use std::path::Path;

use breach_config::{CONFIG_FILE_NAME, ConfigFile};

/// Write a default configuration file; an existing file is left untouched
pub fn execute_init_command(explicit_path: Option<&Path>) -> Result<()> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .context("Failed to read the current directory")?
            .join(CONFIG_FILE_NAME),
    };

    if path.exists() {
        println!("  ⚠ Configuration already exists: {}", path.display());
        println!("  Delete it first to start over, or use `breach add` to extend it");
        return Ok(());
    }

    ConfigFile::starter()
        .save(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    println!("  ✓ Created {}", path.display());
    println!("\nNext steps:");
    println!("  breach add <owner/repo>   track a repository");
    println!("  breach build              assemble context.md");

    Ok(())
}
