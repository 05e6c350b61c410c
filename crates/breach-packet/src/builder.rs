use anyhow::{Result, anyhow};
use blake3::Hasher;
use breach_config::{AllocationPolicy, OutputFormat};
use breach_selectors::Selectors;
use breach_utils::atomic_write::write_file_atomic;
use breach_utils::error::BreachError;
use breach_utils::logging::group_span;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info};

use crate::budget::allocate;
use crate::classify::{score_files, sort_by_priority};
use crate::discovery::{Discoverer, DiscoveryOptions};
use crate::model::{Category, Group, GroupIdentity, GroupSelection};
use crate::render::render;

/// One source tree to include in a context document
#[derive(Debug, Clone)]
pub struct GroupRequest {
    pub identity: GroupIdentity,
    /// Resolved local directory to scan
    pub root: Utf8PathBuf,
    pub selectors: Selectors,
    pub include_tests: bool,
}

impl GroupRequest {
    #[must_use]
    pub fn new(identity: GroupIdentity, root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            identity,
            root: root.into(),
            selectors: Selectors::default(),
            include_tests: true,
        }
    }

    #[must_use]
    pub fn selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    #[must_use]
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }
}

/// Per-group consumption statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub identity: GroupIdentity,
    /// Files that survived discovery
    pub discovered: usize,
    pub selected: usize,
    pub tokens: usize,
    pub sub_budget: usize,
    /// Selected files per category
    pub categories: BTreeMap<Category, usize>,
}

impl GroupReport {
    fn from_selection(selection: &GroupSelection<'_>) -> Self {
        let mut categories = BTreeMap::new();
        for file in selection.files {
            *categories.entry(file.category).or_insert(0) += 1;
        }
        Self {
            identity: selection.group.identity.clone(),
            discovered: selection.group.files.len(),
            selected: selection.files.len(),
            tokens: selection.tokens,
            sub_budget: selection.sub_budget,
            categories,
        }
    }
}

/// Statistics for a whole build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextReport {
    pub groups: Vec<GroupReport>,
    pub total_files: usize,
    pub total_tokens: usize,
    pub budget: usize,
    pub format: OutputFormat,
    pub policy: AllocationPolicy,
    /// BLAKE3 of the rendered document
    pub blake3: String,
}

/// A rendered document with its hash and statistics
#[derive(Debug, Clone)]
pub struct ContextDocument {
    pub content: String,
    pub blake3_hash: String,
    pub report: ContextReport,
}

impl ContextDocument {
    /// Write the document to `path`, replacing any existing file.
    ///
    /// The in-memory document is untouched on failure, so the write can be retried.
    pub fn write_to(&self, path: &Utf8Path) -> Result<(), BreachError> {
        write_file_atomic(path, &self.content)
            .map(|_| ())
            .map_err(|e| BreachError::Sink {
                path: path.to_string(),
                reason: format!("{e:#}"),
            })
    }
}

/// Builds context documents from one or more source trees under a shared budget
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    budget: usize,
    format: OutputFormat,
    policy: AllocationPolicy,
    include_hidden: bool,
}

impl ContextBuilder {
    #[must_use]
    pub fn new(budget: usize, format: OutputFormat) -> Self {
        Self {
            budget,
            format,
            policy: AllocationPolicy::default(),
            include_hidden: false,
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk entries whose name starts with `.`
    #[must_use]
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Discover, classify and sort every requested group.
    ///
    /// All selectors are compiled before any directory is scanned, so a bad
    /// pattern in the last group fails the run without touching the disk.
    /// Groups are scanned concurrently and returned in request order.
    pub fn collect_groups(&self, requests: &[GroupRequest]) -> Result<Vec<Group>> {
        let discoverers = requests
            .iter()
            .map(|request| {
                Discoverer::new(&DiscoveryOptions {
                    selectors: request.selectors.clone(),
                    include_tests: request.include_tests,
                    include_hidden: self.include_hidden,
                    ..DiscoveryOptions::default()
                })
            })
            .collect::<Result<Vec<_>, BreachError>>()?;

        thread::scope(|s| {
            let handles: Vec<_> = requests
                .iter()
                .zip(&discoverers)
                .map(|(request, discoverer)| {
                    s.spawn(move || -> Result<Group, BreachError> {
                        let _span = group_span(&request.identity.display_name()).entered();
                        let candidates = discoverer.discover(&request.root)?;
                        let mut files = score_files(candidates);
                        sort_by_priority(&mut files);
                        debug!(root = %request.root, files = files.len(), "Scanned group");
                        Ok(Group {
                            identity: request.identity.clone(),
                            files,
                        })
                    })
                })
                .collect();

            let mut groups = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.join() {
                    Ok(group) => groups.push(group?),
                    Err(_) => return Err(anyhow!("Worker thread panicked during discovery")),
                }
            }
            Ok(groups)
        })
    }

    /// Allocate the budget across already-collected groups and render them
    #[must_use]
    pub fn assemble(&self, groups: &[Group]) -> ContextDocument {
        let selections = allocate(groups, self.budget, self.policy);

        for selection in &selections {
            info!(
                group = %selection.group.identity.display_name(),
                selected = selection.files.len(),
                discovered = selection.group.files.len(),
                tokens = selection.tokens,
                sub_budget = selection.sub_budget,
                "Allocated group"
            );
        }

        let content = render(&selections, self.budget, self.format);
        let blake3_hash = calculate_hash(&content);

        let groups: Vec<GroupReport> = selections.iter().map(GroupReport::from_selection).collect();
        let report = ContextReport {
            total_files: groups.iter().map(|g| g.selected).sum(),
            total_tokens: groups.iter().map(|g| g.tokens).sum(),
            groups,
            budget: self.budget,
            format: self.format,
            policy: self.policy,
            blake3: blake3_hash.clone(),
        };

        ContextDocument {
            content,
            blake3_hash,
            report,
        }
    }

    /// Run the whole pipeline over `requests`, allocating in request order
    pub fn build(&self, requests: &[GroupRequest]) -> Result<ContextDocument> {
        let groups = self.collect_groups(requests)?;
        Ok(self.assemble(&groups))
    }
}

fn calculate_hash(content: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::parse_document;
    use breach_utils::error::{ConfigError, SourceError};
    use breach_utils::test_support::{content_with_tokens, temp_tree};

    fn request(owner: &str, name: &str, root: &Utf8Path) -> GroupRequest {
        GroupRequest::new(GroupIdentity::new(owner, name), root)
    }

    #[test]
    fn test_single_group_build() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[
            ("src/types.ts", "export type Id = string;"),
            ("src/index.ts", "export * from './types';"),
            ("src/util.ts", "const x = 1;"),
            ("node_modules/dep/index.ts", "export {}"),
        ])?;

        let doc = ContextBuilder::new(10_000, OutputFormat::Markdown)
            .build(&[request("local", "app", &root)])?;

        let report = &doc.report;
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].discovered, 3);
        assert_eq!(report.groups[0].selected, 3);
        assert_eq!(report.total_files, 3);
        assert_eq!(report.groups[0].categories.get(&Category::Types), Some(&1));
        assert_eq!(report.groups[0].categories.get(&Category::Exports), Some(&1));
        assert_eq!(report.groups[0].categories.get(&Category::Source), Some(&1));

        let parsed = parse_document(&doc.content, OutputFormat::Markdown)?;
        let paths: Vec<&str> = parsed.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["src/types.ts", "src/index.ts", "src/util.ts"]);
        Ok(())
    }

    #[test]
    fn test_multi_group_fixed_denominator() -> anyhow::Result<()> {
        let big = content_with_tokens(400);
        let small = content_with_tokens(100);
        let (_a, root_a) = temp_tree(&[("a1.ts", &big), ("a2.ts", &big), ("a3.ts", &big)])?;
        let (_b, root_b) = temp_tree(&[("b1.ts", &small), ("b2.ts", &small), ("b3.ts", &small)])?;

        let doc = ContextBuilder::new(1000, OutputFormat::Xml).build(&[
            request("o", "a", &root_a),
            request("o", "b", &root_b),
        ])?;

        let groups = &doc.report.groups;
        assert_eq!((groups[0].selected, groups[0].tokens), (1, 400));
        assert_eq!((groups[1].selected, groups[1].tokens), (3, 300));
        assert_eq!(doc.report.total_tokens, 700);
        assert!(doc.content.contains("<summary files=\"4\" tokens=\"700\" budget=\"1000\"/>"));
        Ok(())
    }

    #[test]
    fn test_group_order_is_preserved() -> anyhow::Result<()> {
        let (_a, root_a) = temp_tree(&[("a.ts", "a")])?;
        let (_b, root_b) = temp_tree(&[("b.ts", "b")])?;
        let (_c, root_c) = temp_tree(&[("c.ts", "c")])?;

        let groups = ContextBuilder::new(100, OutputFormat::Markdown).collect_groups(&[
            request("o", "c", &root_c),
            request("o", "a", &root_a),
            request("o", "b", &root_b),
        ])?;

        let names: Vec<&str> = groups.iter().map(|g| g.identity.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        Ok(())
    }

    #[test]
    fn test_invalid_selector_fails_before_scanning() -> anyhow::Result<()> {
        let (_a, root_a) = temp_tree(&[("a.ts", "a")])?;

        let bad = request("o", "bad", Utf8Path::new("/definitely/not/here")).selectors(Selectors {
            paths: vec!["../escape".to_string()],
            ..Selectors::default()
        });
        let err = ContextBuilder::new(100, OutputFormat::Markdown)
            .build(&[request("o", "a", &root_a), bad])
            .unwrap_err();

        // A scan error would be Source(NotFound); config errors come first
        match err.downcast_ref::<BreachError>() {
            Some(BreachError::Config(ConfigError::InvalidPathRestriction { .. })) => {}
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_missing_root_is_a_source_error() {
        let err = ContextBuilder::new(100, OutputFormat::Markdown)
            .build(&[request("o", "gone", Utf8Path::new("/definitely/not/here"))])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BreachError>(),
            Some(BreachError::Source(SourceError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_zero_budget_renders_empty_document() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[("a.ts", "a")])?;

        let doc = ContextBuilder::new(0, OutputFormat::Markdown)
            .build(&[request("o", "r", &root)])?;

        assert_eq!(doc.report.total_files, 0);
        assert_eq!(doc.report.groups[0].discovered, 1);
        assert!(doc.content.contains("_No files selected._"));
        assert!(doc.content.contains("**Summary:** 0 files · 0 / 0 tokens"));
        Ok(())
    }

    #[test]
    fn test_hash_matches_content() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[("a.ts", "export const a = 1;")])?;
        let builder = ContextBuilder::new(100, OutputFormat::Markdown);

        let first = builder.build(&[request("o", "r", &root)])?;
        let second = builder.build(&[request("o", "r", &root)])?;

        assert_eq!(first.content, second.content);
        assert_eq!(first.blake3_hash, second.blake3_hash);
        assert_eq!(first.blake3_hash, blake3::hash(first.content.as_bytes()).to_hex().to_string());
        assert_eq!(first.report.blake3, first.blake3_hash);
        Ok(())
    }

    #[test]
    fn test_write_to_reports_sink_failure() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[("a.ts", "a")])?;
        let doc = ContextBuilder::new(100, OutputFormat::Markdown)
            .build(&[request("o", "r", &root)])?;

        let target = root.join("out").join("context.md");
        doc.write_to(&target)?;
        assert_eq!(std::fs::read_to_string(&target)?, doc.content);

        // A regular file where a parent directory should be
        let blocked = root.join("a.ts").join("context.md");
        let err = doc.write_to(&blocked).unwrap_err();
        assert!(matches!(err, BreachError::Sink { .. }));
        Ok(())
    }

    #[test]
    fn test_report_serializes() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[("README.md", "# hi")])?;
        let doc = ContextBuilder::new(100, OutputFormat::Markdown)
            .policy(AllocationPolicy::RemainingCount)
            .build(&[request("o", "r", &root)])?;

        let json = serde_json::to_value(&doc.report)?;
        assert_eq!(json["format"], "markdown");
        assert_eq!(json["policy"], "remaining-count");
        assert_eq!(json["groups"][0]["identity"]["owner"], "o");
        assert_eq!(json["groups"][0]["categories"]["examples"], 1);
        Ok(())
    }

    #[test]
    fn test_include_hidden_reaches_discovery() -> anyhow::Result<()> {
        let (_dir, root) = temp_tree(&[(".storybook/main.ts", "export {}"), ("a.ts", "")])?;

        let default = ContextBuilder::new(1_000, OutputFormat::Markdown)
            .build(&[request("o", "r", &root)])?;
        assert_eq!(default.report.groups[0].discovered, 1);

        let hidden = ContextBuilder::new(1_000, OutputFormat::Markdown)
            .include_hidden(true)
            .build(&[request("o", "r", &root)])?;
        assert_eq!(hidden.report.groups[0].discovered, 2);
        assert!(hidden.content.contains("### .storybook/main.ts"));
        Ok(())
    }
}
