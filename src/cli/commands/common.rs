//! Common helper functions used across CLI commands
//!
//! Output sinks, config file location and the console lines shared by
//! `build` and `dump`.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::io::Write;
use std::path::{Path, PathBuf};

use breach_config::CONFIG_FILE_NAME;
use breach_packet::{ContextDocument, GroupReport, with_thousands};
use breach_utils::error::BreachError;

use crate::Config;

/// Where a rendered document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(Utf8PathBuf),
}

impl OutputTarget {
    /// `-` means stdout; no value means `default_name` in the working directory
    pub fn from_arg(output: Option<&Path>, default_name: &str) -> Result<Self, BreachError> {
        match output {
            Some(path) if path.as_os_str() == "-" => Ok(Self::Stdout),
            Some(path) => Utf8PathBuf::try_from(path.to_path_buf())
                .map(Self::File)
                .map_err(|e| BreachError::Sink {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(Self::File(Utf8PathBuf::from(default_name))),
        }
    }

    #[must_use]
    pub fn is_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    pub fn write(&self, document: &ContextDocument) -> Result<(), BreachError> {
        match self {
            Self::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(document.content.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|e| BreachError::Sink {
                        path: "<stdout>".to_string(),
                        reason: e.to_string(),
                    })
            }
            Self::File(path) => document.write_to(path),
        }
    }

    /// Human-readable destination
    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            Self::Stdout => "stdout",
            Self::File(path) => path.as_str(),
        }
    }
}

/// Config file to edit: the explicit path, the discovered file, or a new
/// `.breach.toml` in the working directory
pub fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(Config::discover_config_file_from(&cwd).unwrap_or_else(|| cwd.join(CONFIG_FILE_NAME)))
}

/// `owner/name: selected/discovered files (~tokens tokens)`
#[must_use]
pub fn group_line(group: &GroupReport) -> String {
    format!(
        "{}: {}/{} files (~{} tokens)",
        group.identity.display_name(),
        group.selected,
        group.discovered,
        with_thousands(group.tokens)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use breach_packet::GroupIdentity;
    use std::collections::BTreeMap;

    #[test]
    fn test_output_target_from_arg() {
        assert_eq!(
            OutputTarget::from_arg(Some(Path::new("-")), "context.md").unwrap(),
            OutputTarget::Stdout
        );
        assert_eq!(
            OutputTarget::from_arg(None, "context.md").unwrap(),
            OutputTarget::File(Utf8PathBuf::from("context.md"))
        );
        assert_eq!(
            OutputTarget::from_arg(Some(Path::new("out/ctx.xml")), "context.md").unwrap(),
            OutputTarget::File(Utf8PathBuf::from("out/ctx.xml"))
        );
    }

    #[test]
    fn test_group_line() {
        let group = GroupReport {
            identity: GroupIdentity::new("sveltejs", "svelte"),
            discovered: 120,
            selected: 40,
            tokens: 48_210,
            sub_budget: 50_000,
            categories: BTreeMap::new(),
        };
        assert_eq!(group_line(&group), "sveltejs/svelte: 40/120 files (~48,210 tokens)");
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = config_file_path(Some(Path::new("/tmp/custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }
}
