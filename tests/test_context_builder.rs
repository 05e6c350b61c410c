//! End-to-end tests for context assembly through the public library API

use anyhow::Result;
use breach::{
    AllocationPolicy, Category, ContextBuilder, GroupIdentity, GroupRequest, OutputFormat,
    parse_document,
};
use breach::selectors::Selectors;
use breach_utils::test_support::{content_with_tokens, temp_tree};
use camino::Utf8Path;

fn request(name: &str, root: &Utf8Path) -> GroupRequest {
    GroupRequest::new(GroupIdentity::new("fixture", name), root)
}

#[test]
fn test_priority_order_and_truncation() -> Result<()> {
    let (_dir, root) = temp_tree(&[
        ("src/types.ts", &content_with_tokens(30)),
        ("src/index.ts", &content_with_tokens(30)),
        ("src/big.ts", &format!("export {}", content_with_tokens(500))),
        ("src/small.ts", &content_with_tokens(5)),
        ("package.json", "{}"),
    ])?;

    let doc = ContextBuilder::new(100, OutputFormat::Markdown).build(&[request("app", &root)])?;
    let parsed = parse_document(&doc.content, OutputFormat::Markdown)?;
    let paths: Vec<&str> = parsed.iter().map(|f| f.path.as_str()).collect();

    // big.ts (score 50) blocks small.ts (score 40) even though small.ts would fit
    assert_eq!(paths, vec!["src/types.ts", "src/index.ts", "package.json"]);
    assert_eq!(doc.report.groups[0].discovered, 5);
    assert!(doc.report.total_tokens <= 100);
    Ok(())
}

#[test]
fn test_policies_differ_only_for_later_groups() -> Result<()> {
    let (_a, empty_root) = temp_tree(&[("notes.txt", "ignored by default includes")])?;
    let files: Vec<(String, String)> = (0..10)
        .map(|i| (format!("f{i}.ts"), content_with_tokens(100)))
        .collect();
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let (_b, full_root) = temp_tree(&borrowed)?;

    let requests = [request("empty", &empty_root), request("full", &full_root)];

    let fixed = ContextBuilder::new(1000, OutputFormat::Xml)
        .policy(AllocationPolicy::FixedDenominator)
        .build(&requests)?;
    let fair = ContextBuilder::new(1000, OutputFormat::Xml)
        .policy(AllocationPolicy::RemainingCount)
        .build(&requests)?;

    assert_eq!(fixed.report.groups[1].sub_budget, 500);
    assert_eq!(fixed.report.groups[1].selected, 5);
    assert_eq!(fair.report.groups[1].sub_budget, 1000);
    assert_eq!(fair.report.groups[1].selected, 10);
    Ok(())
}

#[test]
fn test_selectors_and_test_toggle() -> Result<()> {
    let (_dir, root) = temp_tree(&[
        ("packages/core/src/index.ts", "export const core = 1;"),
        ("packages/core/src/core.spec.ts", "it('works')"),
        ("packages/core/legacy/old.ts", "old"),
        ("packages/web/src/index.ts", "export const web = 1;"),
    ])?;

    let selectors = Selectors {
        paths: vec!["packages/core".to_string()],
        exclude: vec!["**/legacy/**".to_string()],
        ..Selectors::default()
    };

    let with_tests = ContextBuilder::new(10_000, OutputFormat::Markdown)
        .build(&[request("mono", &root).selectors(selectors.clone())])?;
    let without_tests = ContextBuilder::new(10_000, OutputFormat::Markdown)
        .build(&[request("mono", &root).selectors(selectors).include_tests(false)])?;

    let parsed = parse_document(&with_tests.content, OutputFormat::Markdown)?;
    let paths: Vec<&str> = parsed.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["packages/core/src/index.ts", "packages/core/src/core.spec.ts"]
    );
    assert_eq!(with_tests.report.groups[0].categories.get(&Category::Tests), Some(&1));

    assert_eq!(without_tests.report.total_files, 1);
    assert_eq!(without_tests.report.groups[0].categories.get(&Category::Tests), None);
    Ok(())
}

#[test]
fn test_documents_are_reproducible() -> Result<()> {
    let (_dir, root) = temp_tree(&[
        ("b.ts", "const b = 2;"),
        ("a.ts", "const a = 1;"),
        ("c.ts", "const c = 3;"),
    ])?;

    for format in [OutputFormat::Markdown, OutputFormat::Xml] {
        let builder = ContextBuilder::new(1_000, format);
        let first = builder.build(&[request("r", &root)])?;
        let second = builder.build(&[request("r", &root)])?;
        assert_eq!(first.content, second.content);
        assert_eq!(first.blake3_hash, second.blake3_hash);

        // Equal scores fall back to path order
        let parsed = parse_document(&first.content, format)?;
        let paths: Vec<&str> = parsed.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts", "c.ts"]);
    }
    Ok(())
}

#[test]
fn test_round_trip_preserves_file_bytes() -> Result<()> {
    let tricky = "line one\r\n```ts\nconst x = `${a}`;\n```\n]]> and </file>\n";
    let (_dir, root) = temp_tree(&[("docs.md", tricky), ("empty.ts", "")])?;

    for format in [OutputFormat::Markdown, OutputFormat::Xml] {
        let doc = ContextBuilder::new(1_000, format).build(&[request("r", &root)])?;
        let parsed = parse_document(&doc.content, format)?;
        let docs = parsed.iter().find(|f| f.path == "docs.md").unwrap();
        assert_eq!(docs.content, tricky);
        let empty = parsed.iter().find(|f| f.path == "empty.ts").unwrap();
        assert_eq!(empty.content, "");
        assert!(parsed.iter().all(|f| f.group == "fixture/r"));
    }
    Ok(())
}

#[test]
fn test_excluding_tests_drops_everything_classified_as_tests() -> Result<()> {
    let (_dir, root) = temp_tree(&[
        ("tests/smoke.ts", "it('boots')"),
        ("packages/ui/test/button.ts", "it('clicks')"),
        ("src/a.ts", "const a = 1;"),
    ])?;

    let with_tests = ContextBuilder::new(10_000, OutputFormat::Markdown)
        .build(&[request("r", &root)])?;
    assert_eq!(with_tests.report.groups[0].categories.get(&Category::Tests), Some(&2));

    let doc = ContextBuilder::new(10_000, OutputFormat::Markdown)
        .build(&[request("r", &root).include_tests(false)])?;
    let group = &doc.report.groups[0];
    assert_eq!(group.discovered, 1);
    assert_eq!(group.categories.get(&Category::Tests), None);
    assert!(!doc.content.contains("### tests/smoke.ts"));
    Ok(())
}
