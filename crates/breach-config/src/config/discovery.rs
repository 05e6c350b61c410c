use anyhow::Context;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use breach_utils::atomic_write::write_file_atomic;
use breach_utils::error::{BreachError, ConfigError};

use super::{CONFIG_FILE_NAME, CacheConfig, CliArgs, Config, ConfigSource, OutputConfig, RepoConfig};

/// On-disk form of `.breach.toml`.
///
/// Unlike [`Config`], absent values stay absent so that `add` can rewrite
/// the file without baking defaults into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

impl ConfigFile {
    /// File written by `breach init`: the default output settings, no repositories
    #[must_use]
    pub fn starter() -> Self {
        Self {
            output: Some(OutputConfig::default()),
            cache: None,
            repos: Vec::new(),
        }
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, BreachError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(BreachError::Io(e)),
        };

        toml::from_str(&content).map_err(|e| {
            BreachError::Config(ConfigError::InvalidFile(format!("{}: {e}", path.display())))
        })
    }

    /// Serialize to TOML and write atomically
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let path = Utf8PathBuf::try_from(path.to_path_buf())
            .context("Configuration path is not valid UTF-8")?;
        write_file_atomic(&path, &content)
            .with_context(|| format!("Failed to write configuration file: {path}"))?;
        Ok(())
    }

    /// Append a repository unless one with the same URL is already present.
    ///
    /// Returns `false` for a duplicate.
    pub fn add_repo(&mut self, repo: RepoConfig) -> bool {
        if self.repos.iter().any(|existing| existing.url == repo.url) {
            return false;
        }
        self.repos.push(repo);
        true
    }
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, BreachError> {
        let start_dir = std::env::current_dir()?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, BreachError> {
        let mut source_attribution = HashMap::new();

        let mut output = OutputConfig::default();
        let mut cache = CacheConfig::default();
        let mut repos = Vec::new();

        for key in ["format", "max_tokens", "include_tests", "policy", "cache_dir"] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        // An explicit path must exist; a discovered one always does
        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file = ConfigFile::load(path)?;
            debug!(path = %path.display(), repos = file.repos.len(), "Loaded configuration file");
            let config_source = ConfigSource::Config;

            if let Some(file_output) = file.output {
                if file_output.format.is_some() {
                    output.format = file_output.format;
                    source_attribution.insert("format".to_string(), config_source);
                }
                if file_output.max_tokens.is_some() {
                    output.max_tokens = file_output.max_tokens;
                    source_attribution.insert("max_tokens".to_string(), config_source);
                }
                if file_output.include_tests.is_some() {
                    output.include_tests = file_output.include_tests;
                    source_attribution.insert("include_tests".to_string(), config_source);
                }
                if file_output.policy.is_some() {
                    output.policy = file_output.policy;
                    source_attribution.insert("policy".to_string(), config_source);
                }
            }

            if let Some(file_cache) = file.cache
                && file_cache.dir.is_some()
            {
                cache.dir = file_cache.dir;
                source_attribution.insert("cache_dir".to_string(), config_source);
            }

            if !file.repos.is_empty() {
                repos = file.repos;
                source_attribution.insert("repos".to_string(), config_source);
            }
        }

        // Apply CLI overrides (highest precedence)
        if cli_args.format.is_some() {
            output.format = cli_args.format;
            source_attribution.insert("format".to_string(), ConfigSource::Cli);
        }
        if cli_args.max_tokens.is_some() {
            output.max_tokens = cli_args.max_tokens;
            source_attribution.insert("max_tokens".to_string(), ConfigSource::Cli);
        }
        if cli_args.include_tests.is_some() {
            output.include_tests = cli_args.include_tests;
            source_attribution.insert("include_tests".to_string(), ConfigSource::Cli);
        }
        if cli_args.policy.is_some() {
            output.policy = cli_args.policy;
            source_attribution.insert("policy".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.cache_dir {
            cache.dir = Some(dir.display().to_string());
            source_attribution.insert("cache_dir".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            output,
            cache,
            repos,
            config_path,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Search upward from `start_dir` for `.breach.toml`, stopping at
    /// repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                return None;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => return None,
            }
        }
    }
}
