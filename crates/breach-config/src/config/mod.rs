//! Configuration management for breach
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. The TOML file carries `[output]`, `[cache]` and
//! `[[repos]]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use breach_selectors::Selectors;
pub use breach_utils::types::ConfigSource;
pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::ConfigFile;
pub use model::*;
pub use validation::parse_repo_spec;

use breach_utils::source::{CacheDir, DEFAULT_CACHE_DIR_NAME};
use breach_utils::error::SourceError;
use camino::Utf8PathBuf;

impl Config {
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.output.format.unwrap_or_default()
    }

    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.output.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    #[must_use]
    pub fn include_tests(&self) -> bool {
        self.output.include_tests.unwrap_or(true)
    }

    #[must_use]
    pub fn policy(&self) -> AllocationPolicy {
        self.output.policy.unwrap_or_default()
    }

    /// Cache location: the configured directory, or `<home>/.breach-cache`.
    ///
    /// A leading `~/` in the configured value expands to the home directory.
    pub fn cache_dir(&self) -> Result<CacheDir, SourceError> {
        let Some(dir) = &self.cache.dir else {
            return CacheDir::default_location();
        };

        if let Some(rest) = dir.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| SourceError::CacheDirUnavailable {
                reason: "home directory could not be determined".to_string(),
            })?;
            let home =
                Utf8PathBuf::try_from(home).map_err(|e| SourceError::CacheDirUnavailable {
                    reason: e.to_string(),
                })?;
            let rest = if rest.is_empty() {
                DEFAULT_CACHE_DIR_NAME
            } else {
                rest
            };
            return Ok(CacheDir::new(home.join(rest)));
        }

        Ok(CacheDir::new(Utf8PathBuf::from(dir.as_str())))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a default Config for tests that don't need discovery
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Config {
            output: OutputConfig::default(),
            cache: CacheConfig::default(),
            repos: Vec::new(),
            config_path: None,
            source_attribution: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breach_utils::error::{BreachError, ConfigError};
    use breach_utils::test_support::write_tree;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_from(temp.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.format(), OutputFormat::Markdown);
        assert_eq!(config.max_tokens(), 100_000);
        assert!(config.include_tests());
        assert_eq!(config.policy(), AllocationPolicy::FixedDenominator);
        assert!(config.repos.is_empty());
        assert!(config.config_path.is_none());
        assert_eq!(
            config.source_attribution.get("max_tokens"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_config_discovery_with_cli_override() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
[output]
format = "xml"
max_tokens = 2000
include_tests = false

[[repos]]
url = "https://github.com/sveltejs/svelte.git"
ref = "main"
paths = ["packages/svelte/src"]

[[repos]]
url = "https://github.com/tokio-rs/tokio.git"
exclude = ["**/benches/**"]
"#,
        );

        let cli_args = CliArgs {
            max_tokens: Some(500),
            policy: Some(AllocationPolicy::RemainingCount),
            ..CliArgs::default()
        };

        let config = Config::discover_from(temp.path(), &cli_args).unwrap();

        assert_eq!(config.max_tokens(), 500);
        assert_eq!(config.format(), OutputFormat::Xml);
        assert!(!config.include_tests());
        assert_eq!(config.policy(), AllocationPolicy::RemainingCount);

        assert_eq!(config.repos.len(), 2);
        assert_eq!(config.repos[0].reference.as_deref(), Some("main"));
        assert_eq!(config.repos[0].selectors.paths, vec!["packages/svelte/src"]);
        assert_eq!(config.repos[1].selectors.exclude, vec!["**/benches/**"]);

        assert_eq!(
            config.source_attribution.get("max_tokens"),
            Some(&ConfigSource::Cli)
        );
        assert_eq!(
            config.source_attribution.get("format"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("policy"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn test_discovery_walks_upward_and_stops_at_repo_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_config(root, "[output]\nmax_tokens = 42\n");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_config_file_from(&nested);
        assert_eq!(found, Some(root.join(CONFIG_FILE_NAME)));

        // A repository root between the start dir and the file stops the search
        std::fs::create_dir(root.join("a").join(".git")).unwrap();
        assert_eq!(Config::discover_config_file_from(&nested), None);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cli_args = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(temp.path(), &cli_args).unwrap_err();
        assert!(matches!(err, BreachError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[output\nformat = ");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(err, BreachError::Config(ConfigError::InvalidFile(_))));
    }

    #[test]
    fn test_unknown_format_in_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[output]\nformat = \"yaml\"\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(err, BreachError::Config(ConfigError::InvalidFile(_))));
    }

    #[test]
    fn test_validation_rejects_zero_budget() {
        let cli_args = CliArgs {
            max_tokens: Some(0),
            ..CliArgs::default()
        };
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();

        let err = Config::discover_from(temp.path(), &cli_args).unwrap_err();
        assert!(matches!(
            err,
            BreachError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "output.max_tokens"
        ));
    }

    #[test]
    fn test_validation_rejects_escaping_path_restriction() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "[[repos]]\nurl = \"owner/repo\"\npaths = [\"../outside\"]\n",
        );

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(
            err,
            BreachError::Config(ConfigError::InvalidPathRestriction { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_repo_url() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[[repos]]\nurl = \"not-a-repo\"\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default()).unwrap_err();
        assert!(matches!(
            err,
            BreachError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "repo"
        ));
    }

    #[test]
    fn test_config_file_round_trip_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        let mut file = ConfigFile::starter();
        let mut repo = RepoConfig::new("https://github.com/owner/repo.git");
        repo.reference = Some("v1.0.0".to_string());
        repo.selectors.include = vec!["**/*.rs".to_string()];

        assert!(file.add_repo(repo.clone()));
        assert!(!file.add_repo(repo.clone()));
        file.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, file);
        assert_eq!(loaded.repos, vec![repo]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("ref = \"v1.0.0\""));
    }

    #[test]
    fn test_builder_attributes_programmatic_values() {
        let config = Config::builder()
            .format(OutputFormat::Xml)
            .max_tokens(50_000)
            .include_tests(false)
            .build()
            .unwrap();

        assert_eq!(config.format(), OutputFormat::Xml);
        assert_eq!(config.policy(), AllocationPolicy::FixedDenominator);
        assert_eq!(
            config.source_attribution.get("max_tokens"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("policy"),
            Some(&ConfigSource::Default)
        );

        assert!(Config::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn test_effective_config_labels() {
        let config = Config::builder().max_tokens(10).build().unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective.get("max_tokens"),
            Some(&("10".to_string(), "programmatic".to_string()))
        );
        assert_eq!(
            effective.get("format"),
            Some(&("markdown".to_string(), "default".to_string()))
        );
    }

    #[test]
    fn test_cache_dir_resolution() {
        let temp = TempDir::new().unwrap();
        let config = Config::builder().cache_dir(temp.path()).build().unwrap();
        let cache = config.cache_dir().unwrap();
        assert_eq!(cache.root().as_std_path(), temp.path());

        let mut tilde = Config::minimal_for_testing();
        tilde.cache.dir = Some("~/custom-cache".to_string());
        if let Ok(cache) = tilde.cache_dir() {
            assert!(cache.root().ends_with("custom-cache"));
        }
    }

    #[test]
    fn test_parse_repo_spec_variants() {
        let spec = parse_repo_spec("github.com/owner/name").unwrap();
        assert_eq!((spec.owner.as_str(), spec.repo.as_str()), ("owner", "name"));
        assert!(parse_repo_spec("single").is_err());
    }

    #[test]
    fn test_policy_and_format_parsing() {
        assert_eq!(
            "remaining-count".parse::<AllocationPolicy>().unwrap(),
            AllocationPolicy::RemainingCount
        );
        assert_eq!("XML".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert!("json".parse::<OutputFormat>().is_err());
        assert!("even".parse::<AllocationPolicy>().is_err());
        assert_eq!(OutputFormat::Xml.extension(), "xml");
    }

    #[test]
    fn test_discovery_from_nested_project_dir() {
        let temp = TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        write_tree(
            &root,
            &[
                (CONFIG_FILE_NAME, "[output]\npolicy = \"remaining-count\"\n"),
                ("pkg/src/lib.rs", ""),
            ],
        )
        .unwrap();

        let config =
            Config::discover_from(root.join("pkg").join("src").as_std_path(), &CliArgs::default())
                .unwrap();
        assert_eq!(config.policy(), AllocationPolicy::RemainingCount);
        assert_eq!(
            config.config_path.as_deref(),
            Some(root.join(CONFIG_FILE_NAME).as_std_path())
        );
    }
}
