use breach_utils::error::{BreachError, ConfigError, SourceError};
use breach_utils::source::RepoSpec;

use super::Config;

/// Parse a repository reference given on the command line or in `[[repos]]`.
///
/// Accepts `owner/repo`, `github.com/owner/repo` and full https URLs.
pub fn parse_repo_spec(input: &str) -> Result<RepoSpec, ConfigError> {
    RepoSpec::parse(input).map_err(|e| match e {
        SourceError::InvalidRepoSpec { input } => ConfigError::InvalidValue {
            key: "repo".to_string(),
            value: format!("'{input}' is not in owner/repo format"),
        },
        other => ConfigError::InvalidValue {
            key: "repo".to_string(),
            value: other.to_string(),
        },
    })
}

impl Config {
    /// Validate configuration values before any scanning begins
    pub fn validate(&self) -> Result<(), BreachError> {
        if self.output.max_tokens == Some(0) {
            return Err(BreachError::Config(ConfigError::InvalidValue {
                key: "output.max_tokens".to_string(),
                value: "must be greater than 0".to_string(),
            }));
        }

        for repo in &self.repos {
            parse_repo_spec(&repo.url)?;

            if let Some(reference) = &repo.reference
                && reference.trim().is_empty()
            {
                return Err(BreachError::Config(ConfigError::InvalidValue {
                    key: "repos.ref".to_string(),
                    value: format!("empty ref for {}", repo.url),
                }));
            }

            repo.selectors.validate()?;
        }

        Ok(())
    }
}
