//! Add command implementation
//!
//! Handles `breach add`: appends a `[[repos]]` entry to the configuration file.

use anyhow::Result;
use std::path::Path;

use breach_config::{ConfigFile, RepoConfig, Selectors, parse_repo_spec};
use breach_utils::error::BreachError;

use super::common::config_file_path;

/// Add a repository, skipping it with a warning if its URL is already configured
pub fn execute_add_command(
    explicit_path: Option<&Path>,
    repo: &str,
    paths: Vec<String>,
    reference: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
) -> Result<()> {
    let spec = parse_repo_spec(repo).map_err(BreachError::from)?;
    let selectors = Selectors {
        paths,
        include,
        exclude,
    };
    selectors.validate()?;

    let path = config_file_path(explicit_path)?;
    let mut file = if path.exists() {
        ConfigFile::load(&path)?
    } else {
        ConfigFile::starter()
    };

    let entry = RepoConfig {
        url: spec.url.clone(),
        reference,
        selectors,
    };

    if !file.add_repo(entry.clone()) {
        println!(
            "  ⚠ {}/{} is already configured in {}",
            spec.owner,
            spec.repo,
            path.display()
        );
        return Ok(());
    }

    file.save(&path)?;

    println!("  ✓ Added {}/{}", spec.owner, spec.repo);
    if let Some(reference) = &entry.reference {
        println!("    ref: {reference}");
    }
    if !entry.selectors.paths.is_empty() {
        println!("    paths: {}", entry.selectors.paths.join(", "));
    }
    if !entry.selectors.include.is_empty() {
        println!("    include: {}", entry.selectors.include.join(", "));
    }
    if !entry.selectors.exclude.is_empty() {
        println!("    exclude: {}", entry.selectors.exclude.join(", "));
    }
    println!("  Config: {}", path.display());

    Ok(())
}
