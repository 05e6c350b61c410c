//! Build command implementation
//!
//! Handles `breach build`: every configured repository, one shared budget.

use anyhow::{Context, Result};
use std::path::PathBuf;

use breach_config::parse_repo_spec;
use breach_packet::{ContextBuilder, GroupIdentity, GroupRequest, with_thousands};
use breach_utils::error::{BreachError, ConfigError};
use breach_utils::logging::Logger;
use breach_utils::source::{SourceRequest, SourceResolver};

use crate::Config;

use super::common::{OutputTarget, group_line};

/// Flags of `breach build` that are not configuration values
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub output: Option<PathBuf>,
    /// Walk dot-prefixed entries
    pub hidden: bool,
    /// Print the report as JSON on stdout
    pub json: bool,
}

/// Resolve every configured repository and write one document
pub fn execute_build_command(config: &Config, options: &BuildOptions, verbose: bool) -> Result<()> {
    let mut logger = Logger::new(verbose);

    if config.repos.is_empty() {
        return Err(BreachError::Config(ConfigError::NoRepositories).into());
    }

    let format = config.format();
    let default_name = format!("context.{}", format.extension());
    let target = OutputTarget::from_arg(options.output.as_deref(), &default_name)?;
    if options.json && target.is_stdout() {
        return Err(BreachError::Config(ConfigError::InvalidValue {
            key: "output".to_string(),
            value: "'-' cannot be combined with --json; stdout carries the report".to_string(),
        })
        .into());
    }

    // Every spec is checked before the first clone
    let specs = config
        .repos
        .iter()
        .map(|repo| parse_repo_spec(&repo.url).map_err(BreachError::from))
        .collect::<Result<Vec<_>, _>>()?;

    let resolver = SourceResolver::new(config.cache_dir().map_err(BreachError::from)?);
    logger.verbose(&format!("Cache: {}", resolver.cache().root()));

    logger.start_timing("resolve");
    let mut requests = Vec::with_capacity(specs.len());
    for (repo, spec) in config.repos.iter().zip(specs) {
        logger.info(&format!("Fetching {}/{}", spec.owner, spec.repo));
        let resolved = resolver
            .resolve(&SourceRequest::Remote {
                spec,
                reference: repo.reference.clone(),
            })
            .map_err(BreachError::from)?;

        requests.push(
            GroupRequest::new(
                GroupIdentity::new(resolved.owner, resolved.name).with_revision(resolved.revision),
                resolved.path,
            )
            .selectors(repo.selectors.clone())
            .include_tests(config.include_tests()),
        );
    }
    logger.end_timing("resolve");

    logger.start_timing("assemble");
    let document = ContextBuilder::new(config.max_tokens(), format)
        .policy(config.policy())
        .include_hidden(options.hidden)
        .build(&requests)
        .context("Failed to assemble context")?;
    logger.end_timing("assemble");

    for group in &document.report.groups {
        logger.info(&group_line(group));
    }

    target.write(&document)?;

    logger.success(&format!(
        "Wrote {} files (~{} / {} tokens) to {}",
        document.report.total_files,
        with_thousands(document.report.total_tokens),
        with_thousands(document.report.budget),
        target.describe()
    ));
    logger.verbose(&format!("BLAKE3: {}", document.blake3_hash));

    if options.json {
        let report = serde_json::to_string_pretty(&document.report)
            .context("Failed to serialize build report")?;
        println!("{report}");
    }

    Ok(())
}
