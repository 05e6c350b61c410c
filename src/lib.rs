//! breach - assemble source trees into a single token-budgeted context document
//!
//! breach walks one or more source trees, keeps the files a language model is
//! most likely to need (type declarations, entry points, tests, manifests,
//! READMEs), and packs as many of them as fit a token budget into one Markdown
//! or XML document.
//!
//! breach can be used in two ways:
//! - **CLI**: run `breach build` against the repositories listed in `.breach.toml`,
//!   or `breach dump <repo>` for a one-off document
//! - **Library**: use [`ContextBuilder`] over directories you have already resolved
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Write a starter .breach.toml
//! breach init
//!
//! # Track repositories
//! breach add sveltejs/svelte -p packages/svelte/src
//! breach add withastro/astro -r main
//!
//! # Build context.md with a 100k token budget
//! breach build
//!
//! # One local directory, XML, streamed to stdout
//! breach dump ./my-project --local -f xml -o -
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use breach::{ContextBuilder, GroupIdentity, GroupRequest, OutputFormat};
//!
//! let request = GroupRequest::new(GroupIdentity::new("local", "app"), "./app");
//! let document = ContextBuilder::new(50_000, OutputFormat::Markdown).build(&[request])?;
//! println!("{} files, {} tokens", document.report.total_files, document.report.total_tokens);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Stable Public API
//!
//! - [`Config`] and [`ConfigBuilder`] - Configuration management
//! - [`ContextBuilder`] - Discovery, allocation and rendering
//! - [`BreachError`] - Library error type
//! - [`ExitCode`] - CLI exit codes

// ============================================================================
// Stable Public API - covered by semver guarantees for 1.x
// ============================================================================

/// Configuration for breach operations.
///
/// Use [`Config::discover()`] for CLI-like behavior or [`Config::builder()`]
/// for programmatic configuration.
pub use breach_config::Config;

/// Builder for programmatic configuration.
pub use breach_config::ConfigBuilder;

/// CLI argument structure for configuration override.
pub use breach_config::CliArgs;

pub use breach_config::{AllocationPolicy, OutputFormat};

/// Library-level error type.
///
/// Library code returns `BreachError` and does NOT call `std::process::exit()`.
pub use breach_utils::error::BreachError;

/// Exit codes matching the documented exit code table.
pub use breach_utils::exit_codes::ExitCode;

/// Trait for providing user-friendly error reporting.
pub use breach_utils::error::UserFriendlyError;

pub use breach_packet::{
    Category, ContextBuilder, ContextDocument, ContextReport, GroupIdentity, GroupReport,
    GroupRequest, ParsedFile, parse_document,
};

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub use breach_utils::test_support;

#[doc(hidden)]
pub use breach_utils::{atomic_write, error, exit_codes, logging, source, types};

#[doc(hidden)]
pub use breach_config as config;

#[doc(hidden)]
pub use breach_packet as packet;

#[doc(hidden)]
pub use breach_selectors as selectors;

// Exported with #[doc(hidden)] to allow white-box testing of CLI flag parsing
#[doc(hidden)]
pub mod cli;
