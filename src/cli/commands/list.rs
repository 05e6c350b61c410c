//! List command implementation
//!
//! Handles `breach list` / `breach ls`.

use anyhow::Result;

use breach_packet::with_thousands;

use crate::Config;

/// Print configured repositories and the output settings
pub fn execute_list_command(config: &Config, verbose: bool) -> Result<()> {
    match &config.config_path {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: (none found, using defaults)"),
    }

    if config.repos.is_empty() {
        println!("\nNo repositories configured.");
        println!("  Use `breach add <owner/repo>` to add one");
    } else {
        println!("\nRepositories ({}):", config.repos.len());
        for repo in &config.repos {
            println!("  {}", repo.url);
            if let Some(reference) = &repo.reference {
                println!("    ref: {reference}");
            }
            if !repo.selectors.paths.is_empty() {
                println!("    paths: {}", repo.selectors.paths.join(", "));
            }
            if !repo.selectors.include.is_empty() {
                println!("    include: {}", repo.selectors.include.join(", "));
            }
            if !repo.selectors.exclude.is_empty() {
                println!("    exclude: {}", repo.selectors.exclude.join(", "));
            }
        }
    }

    println!(
        "\nOutput: {} · {} tokens · tests {} · {}",
        config.format(),
        with_thousands(config.max_tokens()),
        if config.include_tests() {
            "included"
        } else {
            "excluded"
        },
        config.policy()
    );

    if verbose {
        println!("\nEffective configuration:");
        for (key, (value, source)) in config.effective_config() {
            println!("  {key} = {value}  [{source}]");
        }
    }

    Ok(())
}
