//! Context assembly with token budgets.
//!
//! This crate turns source trees into a single document sized for a language
//! model's context window: discover candidate files, classify them by
//! priority, select a prefix of each group within its share of the budget,
//! and render the result as Markdown or XML.

mod budget;
mod builder;
mod classify;
mod discovery;
mod model;
mod render;
mod tokens;

pub use budget::{TokenBudget, allocate, greedy_prefix, select_within_budget, total_tokens};
pub use builder::{ContextBuilder, ContextDocument, ContextReport, GroupReport, GroupRequest};
pub use classify::{Classification, classify, score_files, sort_by_priority};
pub use discovery::{Discoverer, DiscoveryOptions, MAX_FILE_SIZE};
pub use model::{CandidateFile, Category, Group, GroupIdentity, GroupSelection, ScoredFile};
pub use render::{ParsedFile, parse_document, render};
pub use tokens::{estimate_tokens, with_thousands};

pub use breach_config::{AllocationPolicy, OutputFormat};
