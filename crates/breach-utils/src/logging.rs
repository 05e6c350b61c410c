//! Logging and observability infrastructure for breach
//!
//! Structured logging goes through `tracing`; the [`Logger`] helper adds
//! verbose console output and operation timings for CLI commands. All
//! console output is written to stderr so a document streamed to stdout
//! stays clean.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence when set. Otherwise the filter is
/// `breach=info,warn`, or `breach=debug,info` in verbose mode.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("breach=debug,info")
            } else {
                EnvFilter::try_new("breach=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one group of a context build
pub fn group_span(group: &str) -> tracing::Span {
    tracing::info_span!("group", group = %group)
}

/// Logger for verbose output and operation timings
pub struct Logger {
    verbose: bool,
    start_time: Instant,
    pending: HashMap<String, Instant>,
    operation_timings: HashMap<String, Duration>,
}

impl Logger {
    /// Create a new logger instance
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            start_time: Instant::now(),
            pending: HashMap::new(),
            operation_timings: HashMap::new(),
        }
    }

    /// Check if verbose mode is enabled
    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Log a message if verbose mode is enabled
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            let elapsed = self.start_time.elapsed();
            debug!(duration_ms = %elapsed.as_millis(), message = %message, "Verbose log");
            eprintln!("[{:>8.3}s] {}", elapsed.as_secs_f64(), message);
        }
    }

    /// Log an info message
    pub fn info(&self, message: &str) {
        info!(message = %message);
        eprintln!("ℹ {message}");
    }

    /// Log a success message
    pub fn success(&self, message: &str) {
        info!(message = %message);
        eprintln!("✓ {message}");
    }

    /// Log a warning message
    pub fn warn(&self, message: &str) {
        warn!(message = %message);
        eprintln!("⚠ {message}");
    }

    /// Start timing an operation
    pub fn start_timing(&mut self, operation: &str) {
        self.pending.insert(operation.to_string(), Instant::now());
        self.verbose(&format!("Starting: {operation}"));
    }

    /// End timing an operation and record the duration
    pub fn end_timing(&mut self, operation: &str) -> Duration {
        let duration = self
            .pending
            .remove(operation)
            .map_or_else(|| self.start_time.elapsed(), |started| started.elapsed());
        self.operation_timings
            .insert(operation.to_string(), duration);

        self.verbose(&format!(
            "Completed: {} ({:.3}s)",
            operation,
            duration.as_secs_f64()
        ));

        duration
    }

    /// Recorded duration of a finished operation
    #[must_use]
    pub fn timing(&self, operation: &str) -> Option<Duration> {
        self.operation_timings.get(operation).copied()
    }

    /// Total elapsed time since the logger was created
    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
