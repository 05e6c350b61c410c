//! Candidate discovery under a scan root.
//!
//! Per-file failures (stat, read, invalid UTF-8) drop the file and are logged
//! at debug level; they never fail the walk.

use breach_selectors::{
    Selectors, build_glob_set, directory_prune_patterns, is_binary_path,
};
use breach_utils::error::{BreachError, SourceError};
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobSet;
use std::fs;
use tracing::debug;

use crate::model::CandidateFile;

/// Files larger than this are dropped, never truncated
pub const MAX_FILE_SIZE: u64 = 100 * 1024;

/// Inputs for discovering one source tree
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub selectors: Selectors,
    pub include_tests: bool,
    /// Descend into and match entries whose name starts with `.`
    pub include_hidden: bool,
    pub max_file_size: u64,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            include_tests: true,
            include_hidden: false,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Compiled include/exclude sets for one source tree
#[derive(Debug, Clone)]
pub struct Discoverer {
    include: GlobSet,
    exclude: GlobSet,
    prune: GlobSet,
    include_hidden: bool,
    /// Normalized path restrictions; hidden entries on these paths are still walked
    restrictions: Vec<String>,
    max_file_size: u64,
}

impl Discoverer {
    /// Validate and compile the selectors. Pattern and path-restriction
    /// errors surface here, before anything is scanned.
    pub fn new(options: &DiscoveryOptions) -> Result<Self, BreachError> {
        options.selectors.validate()?;

        let exclude_patterns = options.selectors.effective_exclude(options.include_tests);

        Ok(Self {
            include: build_glob_set(&options.selectors.effective_include(), "selectors.include")?,
            exclude: build_glob_set(&exclude_patterns, "selectors.exclude")?,
            prune: build_glob_set(
                &directory_prune_patterns(&exclude_patterns),
                "selectors.exclude",
            )?,
            include_hidden: options.include_hidden,
            restrictions: options.selectors.restriction_paths(),
            max_file_size: options.max_file_size,
        })
    }

    /// Check if a relative path passes the include and exclude sets
    #[must_use]
    pub fn should_include(&self, relative_path: &str) -> bool {
        if self.exclude.is_match(relative_path) {
            return false;
        }
        self.include.is_match(relative_path)
    }

    /// Whether `relative_path` is a path restriction or one of its ancestors
    fn is_on_restriction(&self, relative_path: &str) -> bool {
        self.restrictions.iter().any(|restriction| {
            restriction == relative_path
                || restriction
                    .strip_prefix(relative_path)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Walk `root` and return every surviving candidate with its content.
    ///
    /// Entries are visited in name order, so the result is stable across runs.
    pub fn discover(&self, root: &Utf8Path) -> Result<Vec<CandidateFile>, BreachError> {
        if !root.exists() {
            return Err(SourceError::NotFound {
                path: root.to_string(),
            }
            .into());
        }
        if !root.is_dir() {
            return Err(SourceError::NotDirectory {
                path: root.to_string(),
            }
            .into());
        }

        let mut candidates = Vec::new();
        self.walk_directory(root, "", &mut candidates);
        Ok(candidates)
    }

    fn walk_directory(&self, dir: &Utf8Path, prefix: &str, out: &mut Vec<CandidateFile>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir, error = %e, "Skipping unreadable directory");
                return;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let Ok(name) = entry.file_name().into_string() else {
                debug!(dir = %dir, "Skipping entry with non UTF-8 name");
                continue;
            };
            if name.chars().any(char::is_control) {
                debug!(
                    dir = %dir,
                    name = %name.escape_debug(),
                    "Skipping entry with a control character in its name"
                );
                continue;
            }

            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            let hidden = name.starts_with('.');
            if hidden && !self.include_hidden && !self.is_on_restriction(&relative) {
                continue;
            }

            // file_type() does not follow symlinks
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                continue;
            }

            let path = dir.join(&name);

            if file_type.is_dir() {
                if self.prune.is_match(&relative) {
                    continue;
                }
                self.walk_directory(&path, &relative, out);
            } else if file_type.is_file() && self.should_include(&relative) {
                if let Some(candidate) = self.read_candidate(path, relative) {
                    out.push(candidate);
                }
            }
        }
    }

    fn read_candidate(&self, path: Utf8PathBuf, relative_path: String) -> Option<CandidateFile> {
        if is_binary_path(&path) {
            return None;
        }

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping file: stat failed");
                return None;
            }
        };

        if metadata.len() > self.max_file_size {
            debug!(
                path = %path,
                size = metadata.len(),
                limit = self.max_file_size,
                "Skipping large file"
            );
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(content) => Some(CandidateFile {
                path,
                relative_path,
                content,
            }),
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping file: read failed");
                None
            }
        }
    }
}
