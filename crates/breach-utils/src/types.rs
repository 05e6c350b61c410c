//! Small shared types

use serde::{Deserialize, Serialize};

/// Where an effective setting came from, as shown by `breach list --verbose`
///
/// Precedence runs `Cli` > `Config` > `Programmatic` > `Default`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    /// `.breach.toml`
    Config,
    /// Set through `Config::builder()`
    Programmatic,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
