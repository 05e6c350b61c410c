//! Exit code constants for breach.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `SOURCE_UNAVAILABLE` | A source tree could not be resolved |
//! | 4 | `SINK_FAILED` | The output document could not be written |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// # Example
///
/// ```rust
/// use breach_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::SINK_FAILED, ExitCode::from_i32(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Source unavailable - a repository could not be cloned or a local path is missing
    pub const SOURCE_UNAVAILABLE: ExitCode = ExitCode(3);

    /// Sink failed - the rendered document could not be written
    pub const SINK_FAILED: ExitCode = ExitCode(4);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::SOURCE_UNAVAILABLE.as_i32(), 3);
        assert_eq!(ExitCode::SINK_FAILED.as_i32(), 4);
    }

    #[test]
    fn test_exit_code_conversions() {
        let code: ExitCode = 3.into();
        assert_eq!(code, ExitCode::SOURCE_UNAVAILABLE);
        assert_eq!(i32::from(ExitCode::CLI_ARGS), 2);
        assert_eq!(ExitCode::SINK_FAILED.to_string(), "4");
    }
}
