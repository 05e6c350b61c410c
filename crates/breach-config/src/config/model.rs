use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use breach_selectors::Selectors;
use breach_utils::error::ConfigError;
use breach_utils::types::ConfigSource;

/// Name of the configuration file searched for during discovery
pub const CONFIG_FILE_NAME: &str = ".breach.toml";

/// Token budget used by `build` when nothing else is configured
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Rendered document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Headings and fenced code blocks
    #[default]
    Markdown,
    /// Tagged elements with CDATA file bodies
    Xml,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Xml => "xml",
        }
    }

    /// File extension used for default output names
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "xml" => Ok(Self::Xml),
            _ => Err(ConfigError::InvalidValue {
                key: "format".to_string(),
                value: format!("Unknown output format: {s}"),
            }),
        }
    }
}

/// How the global budget is divided between groups of a multi-repository build.
///
/// Both policies visit groups in configuration order and subtract what each
/// group actually consumed from the remaining budget `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    /// Sub-budget is `R / N` with `N` the total group count
    #[default]
    FixedDenominator,
    /// Sub-budget is `R / k` with `k` the groups not yet processed
    RemainingCount,
}

impl AllocationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedDenominator => "fixed-denominator",
            Self::RemainingCount => "remaining-count",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed-denominator" | "fixed" => Ok(Self::FixedDenominator),
            "remaining-count" | "fair" => Ok(Self::RemainingCount),
            _ => Err(ConfigError::InvalidValue {
                key: "policy".to_string(),
                value: format!("Unknown budget policy: {s}"),
            }),
        }
    }
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tests: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<AllocationPolicy>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: Some(OutputFormat::Markdown),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            include_tests: Some(true),
            policy: Some(AllocationPolicy::FixedDenominator),
        }
    }
}

/// `[cache]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache root; a leading `~/` expands to the home directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// One `[[repos]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoConfig {
    pub url: String,
    /// Branch, tag or commit to check out
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub selectors: Selectors,
}

impl RepoConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference: None,
            selectors: Selectors::default(),
        }
    }
}

/// Effective configuration for one breach invocation.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > `.breach.toml` > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI behavior that searches for
/// `.breach.toml` upward from the current directory, stopping at a
/// repository root marker.
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `config`, `programmatic`, or `default`)
/// for `breach list --verbose`.
///
/// # Example
///
/// ```rust,no_run
/// use breach_config::{CliArgs, Config};
///
/// let config = Config::discover(&CliArgs::default())?;
/// println!("Budget: {}", config.max_tokens());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub output: OutputConfig,
    pub cache: CacheConfig,
    pub repos: Vec<RepoConfig>,
    /// File the configuration was loaded from, if any
    pub config_path: Option<PathBuf>,
    pub source_attribution: HashMap<String, ConfigSource>,
}
