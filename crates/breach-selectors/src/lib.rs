use breach_utils::error::{BreachError, ConfigError};
use camino::{Utf8Component, Utf8Path};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Paths that never reach the candidate set, whatever the include patterns say.
///
/// # Patterns
///
/// - dependency and build output directories (`node_modules`, `dist`, `build`, `coverage`, ...)
/// - version-control and editor metadata (`.git`, `.idea`, `.vscode`)
/// - lockfiles, minified bundles and sourcemaps
/// - license and changelog files
/// - internal, fixture and mock directories
pub const BUILTIN_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/.git/**",
    "**/.next/**",
    "**/.svelte-kit/**",
    "**/coverage/**",
    "**/*.lock",
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/*.min.js",
    "**/*.map",
    "**/*.d.ts.map",
    "**/CHANGELOG.md",
    "**/LICENSE*",
    "**/.DS_Store",
    "**/.idea/**",
    "**/.vscode/**",
    "**/internal/**",
    "**/_internal/**",
    "**/__fixtures__/**",
    "**/__mocks__/**",
];

/// Extensions (lowercase, without the dot) that are never read as text
pub const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "svg", "avif", // images
    "woff", "woff2", "ttf", "otf", "eot", // fonts
    "pdf", // documents
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "iso", // archives
    "mp3", "mp4", "wav", "webm", "ogg", // media
];

/// Include set used when neither a path restriction nor include patterns are given
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["**/*.{ts,tsx,js,jsx,svelte,vue,json,md}"];

/// Test and spec naming conventions, excluded when tests are turned off
pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.*",
    "**/*.spec.*",
    "**/__tests__/**",
    "**/tests/**",
    "**/test/**",
];

/// Content selection for one source tree
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Selectors {
    /// Subdirectories to scan; each expands to everything beneath it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Extra excludes on top of [`BUILTIN_EXCLUDE_PATTERNS`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Selectors {
    /// Include patterns in effect.
    ///
    /// # Precedence
    ///
    /// - A non-empty path restriction wins: each path becomes `<path>/**`.
    /// - Otherwise non-empty include patterns are used as given.
    /// - Otherwise [`DEFAULT_INCLUDE_PATTERNS`].
    #[must_use]
    pub fn effective_include(&self) -> Vec<String> {
        if !self.paths.is_empty() {
            return self
                .paths
                .iter()
                .map(|p| restriction_pattern(&normalize_restriction(p)))
                .collect();
        }
        if !self.include.is_empty() {
            return self.include.clone();
        }
        DEFAULT_INCLUDE_PATTERNS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    /// Path restrictions with `./` and trailing slashes removed; the root itself is dropped
    #[must_use]
    pub fn restriction_paths(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|p| normalize_restriction(p))
            .filter(|p| !p.is_empty() && p != ".")
            .collect()
    }

    /// Built-in excludes, then caller excludes, then test patterns when tests are off
    #[must_use]
    pub fn effective_exclude(&self, include_tests: bool) -> Vec<String> {
        let mut exclude: Vec<String> = BUILTIN_EXCLUDE_PATTERNS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        exclude.extend(self.exclude.iter().cloned());
        if !include_tests {
            exclude.extend(TEST_FILE_PATTERNS.iter().map(|s| (*s).to_string()));
        }
        exclude
    }

    /// Validate glob patterns and path restrictions
    pub fn validate(&self) -> Result<(), BreachError> {
        for path in &self.paths {
            validate_path_restriction(path)?;
        }

        for pattern in &self.include {
            compile_glob(pattern).map_err(|e| invalid_pattern("selectors.include", pattern, &e))?;
        }

        for pattern in &self.exclude {
            compile_glob(pattern).map_err(|e| invalid_pattern("selectors.exclude", pattern, &e))?;
        }

        Ok(())
    }
}

/// Reject restrictions that are absolute or climb out of the scan root
pub fn validate_path_restriction(path: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidPathRestriction {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid("path must be relative to the repository root"));
    }

    for component in Utf8Path::new(path).components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => {
                return Err(invalid("path must be relative to the repository root"));
            }
            Utf8Component::ParentDir => {
                return Err(invalid("path may not contain '..'"));
            }
            Utf8Component::CurDir | Utf8Component::Normal(_) => {}
        }
    }

    Ok(())
}

/// Compile a glob where `*` stays within one path segment and `**` crosses them
pub fn compile_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

/// Build a [`GlobSet`], reporting the first bad pattern under `key`
pub fn build_glob_set<S: AsRef<str>>(patterns: &[S], key: &str) -> Result<GlobSet, BreachError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        builder.add(compile_glob(pattern).map_err(|e| invalid_pattern(key, pattern, &e))?);
    }
    builder.build().map_err(|e| {
        BreachError::Config(ConfigError::InvalidValue {
            key: key.to_string(),
            value: e.to_string(),
        })
    })
}

/// Directory patterns that can be pruned during traversal.
///
/// An exclude of the form `<dir>/**` rejects every file beneath a directory
/// matching `<dir>`, so the walker never needs to descend into it.
#[must_use]
pub fn directory_prune_patterns<S: AsRef<str>>(exclude: &[S]) -> Vec<String> {
    exclude
        .iter()
        .filter_map(|p| p.as_ref().strip_suffix("/**"))
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the path's extension is in [`BINARY_EXTENSIONS`] (case-insensitive)
#[must_use]
pub fn is_binary_path(path: &Utf8Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_ascii_lowercase();
        BINARY_EXTENSIONS.contains(&ext.as_str())
    })
}

fn normalize_restriction(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.to_string()
}

fn restriction_pattern(path: &str) -> String {
    if path.is_empty() || path == "." {
        "**".to_string()
    } else {
        format!("{path}/**")
    }
}

fn invalid_pattern(key: &str, pattern: &str, e: &globset::Error) -> BreachError {
    BreachError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value: format!("Invalid glob pattern '{pattern}': {e}"),
    })
}
