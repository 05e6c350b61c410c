//! Foundation utilities shared by the breach crates
//!
//! Error taxonomy and exit codes, tracing setup, atomic sink writes and
//! source-tree resolution.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
