use std::collections::HashMap;
use std::path::PathBuf;

use breach_utils::error::BreachError;

use super::{
    AllocationPolicy, CacheConfig, Config, ConfigSource, OutputConfig, OutputFormat, RepoConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when a configuration file must not influence the run, as
    /// `breach dump` does.
    ///
    /// # Example
    ///
    /// ```rust
    /// use breach_config::{Config, OutputFormat};
    ///
    /// let config = Config::builder()
    ///     .format(OutputFormat::Xml)
    ///     .max_tokens(50_000)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.max_tokens(), 50_000);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// # Source Attribution
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`
/// in the resulting `Config`'s source attribution map.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    format: Option<OutputFormat>,
    max_tokens: Option<usize>,
    include_tests: Option<bool>,
    policy: Option<AllocationPolicy>,
    cache_dir: Option<PathBuf>,
    repos: Vec<RepoConfig>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = Some(include_tests);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn repo(mut self, repo: RepoConfig) -> Self {
        self.repos.push(repo);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config, BreachError> {
        let mut source_attribution = HashMap::new();
        let defaults = OutputConfig::default();

        let mut pick = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        pick("format", self.format.is_some());
        pick("max_tokens", self.max_tokens.is_some());
        pick("include_tests", self.include_tests.is_some());
        pick("policy", self.policy.is_some());
        pick("cache_dir", self.cache_dir.is_some());
        if !self.repos.is_empty() {
            pick("repos", true);
        }

        let config = Config {
            output: OutputConfig {
                format: self.format.or(defaults.format),
                max_tokens: self.max_tokens.or(defaults.max_tokens),
                include_tests: self.include_tests.or(defaults.include_tests),
                policy: self.policy.or(defaults.policy),
            },
            cache: CacheConfig {
                dir: self.cache_dir.map(|d| d.display().to_string()),
            },
            repos: self.repos,
            config_path: None,
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
