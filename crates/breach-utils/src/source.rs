//! Source resolution: turning a repository reference into a local directory
//!
//! The context pipeline only ever sees a resolved directory. Remote
//! repositories are shallow-cloned with the git CLI into a [`CacheDir`]
//! that the caller passes in; the cache is created on first use and never
//! invalidated automatically.

pub use crate::error::SourceError;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Name of the cache directory created under the user's home directory
pub const DEFAULT_CACHE_DIR_NAME: &str = ".breach-cache";

/// A parsed GitHub repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub owner: String,
    pub repo: String,
    /// Clone URL, always `https://github.com/<owner>/<repo>.git`
    pub url: String,
}

impl RepoSpec {
    /// Parse `owner/repo`, `github.com/owner/repo` or a full https URL.
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let trimmed = input.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let without_host = without_scheme
            .strip_prefix("github.com/")
            .unwrap_or(without_scheme);
        let cleaned = without_host.strip_suffix(".git").unwrap_or(without_host);

        let mut parts = cleaned.split('/');
        let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
            return Err(SourceError::InvalidRepoSpec {
                input: input.to_string(),
            });
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(SourceError::InvalidRepoSpec {
                input: input.to_string(),
            });
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            url: format!("https://github.com/{owner}/{repo}.git"),
        })
    }
}

/// Location of cached clones, injected by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDir {
    root: Utf8PathBuf,
}

impl CacheDir {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<home>/.breach-cache`
    pub fn default_location() -> Result<Self, SourceError> {
        let home = dirs::home_dir().ok_or_else(|| SourceError::CacheDirUnavailable {
            reason: "home directory could not be determined".to_string(),
        })?;
        let home =
            Utf8PathBuf::try_from(home).map_err(|e| SourceError::CacheDirUnavailable {
                reason: format!("home directory is not valid UTF-8: {e}"),
            })?;
        Ok(Self::new(home.join(DEFAULT_CACHE_DIR_NAME)))
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Create the cache directory if it does not exist yet
    pub fn ensure(&self) -> Result<&Utf8Path, SourceError> {
        std::fs::create_dir_all(&self.root).map_err(|e| SourceError::CacheDirUnavailable {
            reason: format!("{}: {e}", self.root),
        })?;
        Ok(&self.root)
    }

    /// Checkout location for a repository: `<root>/<owner>--<repo>`
    #[must_use]
    pub fn repo_path(&self, owner: &str, repo: &str) -> Utf8PathBuf {
        self.root.join(format!("{owner}--{repo}"))
    }
}

/// What to resolve
#[derive(Debug, Clone)]
pub enum SourceRequest {
    /// A directory on disk, used as-is
    Local { path: Utf8PathBuf },
    /// A GitHub repository, cloned or updated in the cache
    Remote {
        spec: RepoSpec,
        reference: Option<String>,
    },
}

/// A source tree available on disk, with its display identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub path: Utf8PathBuf,
    pub owner: String,
    pub name: String,
    pub revision: Option<String>,
}

/// Resolves [`SourceRequest`]s against an injected cache directory
#[derive(Debug, Clone)]
pub struct SourceResolver {
    cache: CacheDir,
    git: String,
}

impl SourceResolver {
    #[must_use]
    pub fn new(cache: CacheDir) -> Self {
        Self {
            cache,
            git: "git".to_string(),
        }
    }

    /// Use a specific git executable
    #[must_use]
    pub fn with_git_binary(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    #[must_use]
    pub fn cache(&self) -> &CacheDir {
        &self.cache
    }

    pub fn resolve(&self, request: &SourceRequest) -> Result<ResolvedSource, SourceError> {
        match request {
            SourceRequest::Local { path } => Self::resolve_local(path),
            SourceRequest::Remote { spec, reference } => {
                self.resolve_remote(spec, reference.as_deref())
            }
        }
    }

    /// Validate a local directory; its identity is `local/<dir name>`
    pub fn resolve_local(path: &Utf8Path) -> Result<ResolvedSource, SourceError> {
        if !path.exists() {
            return Err(SourceError::NotFound {
                path: path.to_string(),
            });
        }
        if !path.is_dir() {
            return Err(SourceError::NotDirectory {
                path: path.to_string(),
            });
        }

        info!(path = %path, "Using local path");

        let name = path
            .canonicalize_utf8()
            .ok()
            .and_then(|p| p.file_name().map(str::to_string))
            .or_else(|| path.file_name().map(str::to_string))
            .unwrap_or_else(|| path.to_string());

        Ok(ResolvedSource {
            path: path.to_path_buf(),
            owner: "local".to_string(),
            name,
            revision: None,
        })
    }

    fn resolve_remote(
        &self,
        spec: &RepoSpec,
        reference: Option<&str>,
    ) -> Result<ResolvedSource, SourceError> {
        self.cache.ensure()?;
        let repo_path = self.cache.repo_path(&spec.owner, &spec.repo);

        if repo_path.exists() {
            info!(repo = %format!("{}/{}", spec.owner, spec.repo), "Updating cached repository");
            if let Err(reason) = self.update(&repo_path, reference) {
                warn!(
                    repo = %format!("{}/{}", spec.owner, spec.repo),
                    reason = %reason,
                    "Could not update, using cached version"
                );
            }
        } else {
            info!(repo = %format!("{}/{}", spec.owner, spec.repo), "Cloning repository");
            self.clone_into(spec, &repo_path, reference)?;
        }

        Ok(ResolvedSource {
            path: repo_path,
            owner: spec.owner.clone(),
            name: spec.repo.clone(),
            revision: reference.map(str::to_string),
        })
    }

    fn update(&self, repo_path: &Utf8Path, reference: Option<&str>) -> Result<(), String> {
        self.run_git(Some(repo_path), &["fetch", "--all"])
            .map_err(|e| e.to_string())?;

        if let Some(reference) = reference {
            self.run_git(Some(repo_path), &["checkout", reference])
                .map_err(|e| e.to_string())?;
            // A detached ref (tag or commit) has nothing to pull
            if let Err(e) =
                self.run_git(Some(repo_path), &["pull", "--rebase", "origin", reference])
            {
                debug!(reason = %e, "Pull after checkout skipped");
            }
        }

        Ok(())
    }

    fn clone_into(
        &self,
        spec: &RepoSpec,
        repo_path: &Utf8Path,
        reference: Option<&str>,
    ) -> Result<(), SourceError> {
        let clone_failed = |e: SourceError| match e {
            SourceError::GitUnavailable { .. } => e,
            other => SourceError::CloneFailed {
                url: spec.url.clone(),
                reason: other.to_string(),
            },
        };

        self.run_git(
            None,
            &["clone", "--depth=1", spec.url.as_str(), repo_path.as_str()],
        )
        .map_err(clone_failed)?;

        if let Some(reference) = reference {
            self.run_git(
                Some(repo_path),
                &["fetch", "origin", reference, "--depth=1"],
            )
            .map_err(clone_failed)?;
            self.run_git(Some(repo_path), &["checkout", reference])
                .map_err(clone_failed)?;
        }

        Ok(())
    }

    fn run_git(&self, cwd: Option<&Utf8Path>, args: &[&str]) -> Result<(), SourceError> {
        let mut command = Command::new(&self.git);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        debug!(git = %self.git, args = ?args, "Running git");

        let output = command.output().map_err(|e| SourceError::GitUnavailable {
            reason: e.to_string(),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SourceError::CloneFailed {
                url: args.join(" "),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_owner_repo() {
        let spec = RepoSpec::parse("sveltejs/svelte").unwrap();
        assert_eq!(spec.owner, "sveltejs");
        assert_eq!(spec.repo, "svelte");
        assert_eq!(spec.url, "https://github.com/sveltejs/svelte.git");
    }

    #[test]
    fn test_parse_urls() {
        for input in [
            "https://github.com/tokio-rs/tokio",
            "https://github.com/tokio-rs/tokio.git",
            "github.com/tokio-rs/tokio",
            "http://github.com/tokio-rs/tokio/tree/master",
        ] {
            let spec = RepoSpec::parse(input).unwrap();
            assert_eq!(spec.owner, "tokio-rs", "input: {input}");
            assert_eq!(spec.repo, "tokio", "input: {input}");
        }
    }

    #[test]
    fn test_parse_rejects_single_segment() {
        let err = RepoSpec::parse("justone").unwrap_err();
        assert!(matches!(err, SourceError::InvalidRepoSpec { .. }));
        assert!(RepoSpec::parse("owner/").is_err());
    }

    #[test]
    fn test_cache_repo_path_naming() {
        let cache = CacheDir::new("/tmp/cache");
        assert_eq!(
            cache.repo_path("owner", "repo"),
            Utf8PathBuf::from("/tmp/cache/owner--repo")
        );
    }

    #[test]
    fn test_cache_created_on_first_use() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().join("deep").join("cache")).unwrap();
        let cache = CacheDir::new(root.clone());
        assert!(!root.exists());

        cache.ensure().unwrap();
        assert!(root.is_dir());
        // Idempotent
        cache.ensure().unwrap();
    }

    #[test]
    fn test_resolve_local_directory() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("my-project");
        std::fs::create_dir(&project).unwrap();
        let path = Utf8PathBuf::try_from(project).unwrap();

        let resolved = SourceResolver::resolve_local(&path).unwrap();
        assert_eq!(resolved.owner, "local");
        assert_eq!(resolved.name, "my-project");
        assert_eq!(resolved.revision, None);
        assert_eq!(resolved.path, path);
    }

    #[test]
    fn test_resolve_local_missing_and_file() {
        let temp = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();

        let missing = SourceResolver::resolve_local(&base.join("nope")).unwrap_err();
        assert!(matches!(missing, SourceError::NotFound { .. }));

        let file = base.join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let not_dir = SourceResolver::resolve_local(&file).unwrap_err();
        assert!(matches!(not_dir, SourceError::NotDirectory { .. }));
    }

    #[test]
    fn test_missing_git_binary_is_reported() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let resolver = SourceResolver::new(CacheDir::new(root))
            .with_git_binary("breach-definitely-not-a-git-binary");

        let request = SourceRequest::Remote {
            spec: RepoSpec::parse("owner/repo").unwrap(),
            reference: None,
        };
        let err = resolver.resolve(&request).unwrap_err();
        assert!(matches!(err, SourceError::GitUnavailable { .. }));
    }
}
