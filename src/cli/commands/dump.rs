//! Dump command implementation
//!
//! Handles `breach dump`: a single repository or directory, no configuration file.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::path::PathBuf;

use breach_config::{Config, OutputFormat, Selectors, parse_repo_spec};
use breach_packet::{Category, ContextBuilder, GroupIdentity, GroupRequest, with_thousands};
use breach_utils::error::BreachError;
use breach_utils::logging::Logger;
use breach_utils::source::{SourceRequest, SourceResolver};

use super::common::{OutputTarget, group_line};

/// Arguments of `breach dump`
#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub repo: String,
    pub output: Option<PathBuf>,
    pub budget: usize,
    pub format: OutputFormat,
    pub paths: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_tests: bool,
    /// Walk dot-prefixed entries
    pub hidden: bool,
    /// `repo` is a directory on disk
    pub local: bool,
    pub reference: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Build a document from one source and report its category breakdown
pub fn execute_dump_command(options: &DumpOptions, verbose: bool) -> Result<()> {
    let mut logger = Logger::new(verbose);

    // Budget and cache location go through the same validation as the config file
    let mut builder = Config::builder()
        .max_tokens(options.budget)
        .format(options.format)
        .include_tests(options.include_tests);
    if let Some(dir) = &options.cache_dir {
        builder = builder.cache_dir(dir);
    }
    let config = builder.build()?;

    let selectors = Selectors {
        paths: options.paths.clone(),
        include: options.include.clone(),
        exclude: options.exclude.clone(),
    };
    selectors.validate()?;

    logger.start_timing("resolve");
    let resolved = if options.local {
        SourceResolver::resolve_local(&Utf8PathBuf::from(options.repo.as_str()))
            .map_err(BreachError::from)?
    } else {
        let spec = parse_repo_spec(&options.repo).map_err(BreachError::from)?;
        logger.info(&format!("Fetching {}/{}", spec.owner, spec.repo));
        SourceResolver::new(config.cache_dir().map_err(BreachError::from)?)
            .resolve(&SourceRequest::Remote {
                spec,
                reference: options.reference.clone(),
            })
            .map_err(BreachError::from)?
    };
    logger.end_timing("resolve");

    let default_name = format!("{}-context.{}", resolved.name, config.format().extension());
    let target = OutputTarget::from_arg(options.output.as_deref(), &default_name)?;

    let request = GroupRequest::new(
        GroupIdentity::new(resolved.owner, resolved.name).with_revision(resolved.revision),
        resolved.path,
    )
    .selectors(selectors)
    .include_tests(config.include_tests());

    logger.start_timing("assemble");
    let document = ContextBuilder::new(config.max_tokens(), config.format())
        .include_hidden(options.hidden)
        .build(std::slice::from_ref(&request))
        .context("Failed to assemble context")?;
    logger.end_timing("assemble");

    target.write(&document)?;

    if let Some(group) = document.report.groups.first() {
        logger.info(&group_line(group));
        for category in Category::ALL {
            if let Some(count) = group.categories.get(&category) {
                logger.info(&format!("  {category}: {count}"));
            }
        }
    }

    logger.success(&format!(
        "Wrote {} files (~{} / {} tokens) to {}",
        document.report.total_files,
        with_thousands(document.report.total_tokens),
        with_thousands(document.report.budget),
        target.describe()
    ));

    Ok(())
}
