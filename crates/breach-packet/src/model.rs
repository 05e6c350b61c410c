use camino::Utf8PathBuf;
use serde::Serialize;
use std::fmt;

/// Closed set of file categories assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Types,
    Exports,
    Tests,
    Examples,
    Config,
    Source,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Types,
        Category::Exports,
        Category::Tests,
        Category::Examples,
        Category::Config,
        Category::Source,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::Exports => "exports",
            Self::Tests => "tests",
            Self::Examples => "examples",
            Self::Config => "config",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that survived discovery, with its text content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path on disk
    pub path: Utf8PathBuf,
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
    pub content: String,
}

/// A candidate annotated with its estimate, score and category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredFile {
    pub path: Utf8PathBuf,
    pub relative_path: String,
    pub content: String,
    pub tokens: usize,
    pub score: u32,
    pub category: Category,
}

/// Display identity of a group: `owner/name` plus an optional revision label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupIdentity {
    pub owner: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl GroupIdentity {
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            revision: None,
        }
    }

    #[must_use]
    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    /// `owner/name`
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One source tree's files, sorted by priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub identity: GroupIdentity,
    /// Score descending, then relative path ascending
    pub files: Vec<ScoredFile>,
}

/// Files chosen for one group: always a prefix of `group.files`
#[derive(Debug, Clone, Copy)]
pub struct GroupSelection<'a> {
    pub group: &'a Group,
    pub files: &'a [ScoredFile],
    /// Sum of the selected files' estimates, never above `sub_budget`
    pub tokens: usize,
    pub sub_budget: usize,
}
