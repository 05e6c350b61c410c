use std::fmt;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `BreachError` is the error type surfaced by breach operations that the
/// caller must act on. Per-file failures during discovery never reach this
/// type: they are recovered locally by dropping the file.
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file, path restriction, or CLI argument errors |
/// | `Source` | A source tree could not be resolved to a local directory |
/// | `Sink` | The rendered document could not be written |
/// | `Io` | Other I/O failures |
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 3 | Source resolution errors |
/// | 4 | Sink write errors |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use breach_utils::error::{BreachError, ConfigError};
/// use breach_utils::exit_codes::ExitCode;
///
/// let err = BreachError::Config(ConfigError::InvalidFile("bad toml".to_string()));
/// assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
/// assert!(err.display_for_user().contains("Suggestions"));
/// ```
#[derive(Error, Debug)]
pub enum BreachError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source resolution error: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to write output to {path}: {reason}")]
    Sink { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    FileSystem,
    Output,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Source => write!(f, "Source"),
            Self::FileSystem => write!(f, "File System"),
            Self::Output => write!(f, "Output"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Invalid path restriction '{path}': {reason}")]
    InvalidPathRestriction { path: String, reason: String },

    #[error("No repositories configured")]
    NoRepositories,
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::InvalidPathRestriction { path, reason } => {
                format!("Path restriction '{path}' cannot be used: {reason}")
            }
            Self::NoRepositories => "No repositories are configured".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [output], [cache] and [[repos]] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => None,
            Self::InvalidValue { key, value: _ } => Some(format!(
                "The '{key}' option has specific format requirements."
            )),
            Self::NotFound { path: _ } => Some(
                "breach searches for .breach.toml starting from the current directory upward."
                    .to_string(),
            ),
            Self::InvalidPathRestriction { .. } => Some(
                "Path restrictions are relative to the repository root and may not leave it."
                    .to_string(),
            ),
            Self::NoRepositories => Some(
                "The build command assembles context from the [[repos]] entries of .breach.toml."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Run 'breach init' in an empty directory to see the default layout".to_string(),
            ],
            Self::MissingRequired(key) => vec![format!("Provide '{key}' and retry")],
            Self::InvalidValue { key, value: _ } => match key.as_str() {
                "format" | "output.format" => {
                    vec!["Use 'markdown' or 'xml' as the output format".to_string()]
                }
                "policy" | "output.policy" => vec![
                    "Use 'fixed-denominator' or 'remaining-count' as the budget policy".to_string(),
                ],
                "budget" | "output.max_tokens" => {
                    vec!["Use a positive integer token budget (e.g., 50000)".to_string()]
                }
                "repo" => vec![
                    "Use the 'owner/repo' format or a full GitHub URL".to_string(),
                    "Pass --local to treat the input as a directory path".to_string(),
                ],
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { path: _ } => vec![
                "Run 'breach init' to create .breach.toml".to_string(),
                "Use --config to point at an explicit configuration file".to_string(),
            ],
            Self::InvalidPathRestriction { .. } => vec![
                "Use a relative path such as 'src' or 'packages/core'".to_string(),
                "Remove '..' components from the path".to_string(),
            ],
            Self::NoRepositories => vec![
                "Run 'breach add <owner/repo>' to add a repository".to_string(),
                "Use 'breach dump <repo>' for a one-off bundle without configuration"
                    .to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors raised while resolving a source tree to a local directory
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Local path does not exist: {path}")]
    NotFound { path: String },

    #[error("Local path is not a directory: {path}")]
    NotDirectory { path: String },

    #[error("Invalid repository '{input}': use owner/repo format")]
    InvalidRepoSpec { input: String },

    #[error("Failed to clone {url}: {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("git is not available: {reason}")]
    GitUnavailable { reason: String },

    #[error("Cache directory unavailable: {reason}")]
    CacheDirUnavailable { reason: String },
}

impl UserFriendlyError for SourceError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { path } => format!("The directory '{path}' does not exist"),
            Self::NotDirectory { path } => format!("'{path}' is a file, not a directory"),
            Self::InvalidRepoSpec { input } => {
                format!("Could not parse '{input}' as a repository")
            }
            Self::CloneFailed { url, reason } => {
                format!("Could not clone {url}: {reason}")
            }
            Self::GitUnavailable { reason } => format!("git could not be executed: {reason}"),
            Self::CacheDirUnavailable { reason } => {
                format!("The repository cache could not be prepared: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::CloneFailed { .. } | Self::GitUnavailable { .. } => Some(
                "Remote repositories are shallow-cloned with the git CLI into the cache directory."
                    .to_string(),
            ),
            Self::CacheDirUnavailable { .. } => Some(
                "The cache directory is created on first use and reused across runs.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } | Self::NotDirectory { .. } => vec![
                "Check the path and try again".to_string(),
                "Use an absolute path if the working directory is unclear".to_string(),
            ],
            Self::InvalidRepoSpec { .. } => vec![
                "Example: breach dump sveltejs/svelte".to_string(),
                "Pass --local for directories on disk".to_string(),
            ],
            Self::CloneFailed { .. } => vec![
                "Verify the repository exists and is accessible".to_string(),
                "Check your network connection and git credentials".to_string(),
            ],
            Self::GitUnavailable { .. } => {
                vec!["Install git and make sure it is on PATH".to_string()]
            }
            Self::CacheDirUnavailable { .. } => vec![
                "Pass --cache-dir to use a writable location".to_string(),
                "Set [cache] dir in .breach.toml".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Source
    }
}

impl UserFriendlyError for BreachError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Source(err) => err.user_message(),
            Self::Sink { path, reason } => format!("Could not write output to {path}: {reason}"),
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Source(err) => err.context(),
            Self::Sink { .. } => Some(
                "The context document was assembled in memory; only the write failed.".to_string(),
            ),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Source(err) => err.suggestions(),
            Self::Sink { .. } => vec![
                "Check that the output directory exists and is writable".to_string(),
                "Use -o - to write the document to stdout".to_string(),
            ],
            Self::Io(_) => vec!["Check file and directory permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Source(err) => err.category(),
            Self::Sink { .. } => ErrorCategory::Output,
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl BreachError {
    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for CLI exit codes.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Source(_) => ExitCode::SOURCE_UNAVAILABLE,
            Self::Sink { .. } => ExitCode::SINK_FAILED,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;

    #[test]
    fn test_config_error_maps_to_cli_args() {
        let err = BreachError::Config(ConfigError::InvalidValue {
            key: "format".to_string(),
            value: "yaml".to_string(),
        });
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_sink_error_reports_in_memory_document() {
        let err = BreachError::Sink {
            path: "out/context.md".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.to_exit_code(), ExitCode::SINK_FAILED);

        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: Could not write output to out/context.md"));
        assert!(rendered.contains("assembled in memory"));
        assert!(rendered.contains("  • Use -o - to write the document to stdout"));
    }

    #[test]
    fn test_source_error_suggestions() {
        let err = SourceError::InvalidRepoSpec {
            input: "justone".to_string(),
        };
        assert!(err.user_message().contains("justone"));
        assert!(err.suggestions().iter().any(|s| s.contains("--local")));

        let wrapped: BreachError = err.into();
        assert_eq!(wrapped.to_exit_code(), ExitCode::SOURCE_UNAVAILABLE);
    }

    #[test]
    fn test_path_restriction_error_message() {
        let err = ConfigError::InvalidPathRestriction {
            path: "../etc".to_string(),
            reason: "escapes the repository root".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid path restriction '../etc': escapes the repository root"
        );
        assert!(err.context().is_some());
    }
}
