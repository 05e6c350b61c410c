//! Configuration management for breach
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > `.breach.toml` > built-in defaults.

mod config;

pub use config::*;
