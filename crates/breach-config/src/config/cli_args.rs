use std::path::PathBuf;

use super::{AllocationPolicy, OutputFormat};

/// CLI arguments that override configuration file values
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub max_tokens: Option<usize>,
    pub include_tests: Option<bool>,
    pub policy: Option<AllocationPolicy>,
}
