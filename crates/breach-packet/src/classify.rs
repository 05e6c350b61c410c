//! Priority classification.
//!
//! An ordered decision list: the first rule whose predicate holds assigns
//! both score and category. Rules are never combined or re-evaluated.

use crate::model::{CandidateFile, Category, ScoredFile};
use crate::tokens::estimate_tokens;

/// Score and category of a classified file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub score: u32,
    pub category: Category,
}

/// Canonical entry-point file names
const ENTRY_POINTS: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
    "mod.ts",
    "mod.rs",
    "lib.rs",
    "__init__.py",
];

const MANIFESTS: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml", "go.mod"];

const READMES: &[&str] = &["readme.md", "readme", "readme.rst", "readme.txt"];

const SCHEMAS: &[&str] = &["schema.json", "schema.d.ts"];

const TYPE_DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

const TEST_DIRECTORIES: &[&str] = &["__tests__", "tests", "test"];

const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "vue", "svelte", "ripple", "html",
];

const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

const EXPORT_MARKER: &str = "export ";

/// What the rules look at
struct FileFacts<'a> {
    relative_path: &'a str,
    file_name: &'a str,
    /// Everything before the last `/`, empty at the root
    dir: &'a str,
    /// Text after the last `.` of the file name; empty for dotfiles
    extension: &'a str,
    content: &'a str,
}

impl<'a> FileFacts<'a> {
    fn new(relative_path: &'a str, content: &'a str) -> Self {
        let (dir, file_name) = relative_path
            .rsplit_once('/')
            .unwrap_or(("", relative_path));
        let extension = match file_name.rfind('.') {
            Some(0) | None => "",
            Some(i) => &file_name[i + 1..],
        };
        Self {
            relative_path,
            file_name,
            dir,
            extension,
            content,
        }
    }

    fn in_directory_named(&self, names: &[&str]) -> bool {
        self.dir.split('/').any(|segment| names.contains(&segment))
    }
}

struct Rule {
    score: u32,
    category: Category,
    matches: fn(&FileFacts<'_>) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        score: 100,
        category: Category::Types,
        matches: |f| {
            TYPE_DECLARATION_SUFFIXES
                .iter()
                .any(|suffix| f.file_name.ends_with(suffix))
                || f.file_name.contains("types")
                || f.file_name.contains("interface")
        },
    },
    Rule {
        score: 95,
        category: Category::Exports,
        matches: |f| ENTRY_POINTS.contains(&f.file_name),
    },
    Rule {
        score: 92,
        category: Category::Tests,
        matches: |f| {
            f.relative_path.contains(".spec.")
                || f.relative_path.contains(".test.")
                || f.in_directory_named(TEST_DIRECTORIES)
        },
    },
    Rule {
        score: 90,
        category: Category::Config,
        matches: |f| MANIFESTS.contains(&f.file_name),
    },
    Rule {
        score: 85,
        category: Category::Examples,
        matches: |f| READMES.contains(&f.file_name.to_ascii_lowercase().as_str()),
    },
    Rule {
        score: 80,
        category: Category::Types,
        matches: |f| SCHEMAS.contains(&f.file_name),
    },
    Rule {
        score: 75,
        category: Category::Examples,
        matches: |f| f.dir.contains("example") || f.dir.contains("demo"),
    },
    Rule {
        score: 50,
        category: Category::Source,
        matches: |f| SOURCE_EXTENSIONS.contains(&f.extension) && f.content.contains(EXPORT_MARKER),
    },
    Rule {
        score: 40,
        category: Category::Source,
        matches: |f| SOURCE_EXTENSIONS.contains(&f.extension),
    },
    Rule {
        score: 30,
        category: Category::Config,
        matches: |f| CONFIG_EXTENSIONS.contains(&f.extension),
    },
];

const FALLBACK: Classification = Classification {
    score: 10,
    category: Category::Source,
};

/// Classify a file by its relative path and content. Total: every input gets a result.
#[must_use]
pub fn classify(relative_path: &str, content: &str) -> Classification {
    let facts = FileFacts::new(relative_path, content);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&facts))
        .map_or(FALLBACK, |rule| Classification {
            score: rule.score,
            category: rule.category,
        })
}

/// Classify and estimate every candidate, keeping discovery order
#[must_use]
pub fn score_files(candidates: Vec<CandidateFile>) -> Vec<ScoredFile> {
    candidates
        .into_iter()
        .map(|candidate| {
            let Classification { score, category } =
                classify(&candidate.relative_path, &candidate.content);
            ScoredFile {
                tokens: estimate_tokens(&candidate.content),
                path: candidate.path,
                relative_path: candidate.relative_path,
                content: candidate.content,
                score,
                category,
            }
        })
        .collect()
}

/// Sort by score descending, ties broken by relative path ascending
pub fn sort_by_priority(files: &mut [ScoredFile]) {
    files.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
}
