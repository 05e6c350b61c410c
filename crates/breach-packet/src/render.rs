//! Document rendering and re-parsing.
//!
//! Both formats carry the same information: group headers, one entry per
//! selected file with its verbatim content, and a summary of files and tokens
//! against the requested budget. File bodies are never re-encoded; they are
//! escaped only as far as the format's syntax requires, so `parse_document`
//! recovers them byte for byte.

use anyhow::{Context, Result, anyhow, bail};
use breach_config::OutputFormat;
use std::fmt::Write as _;

use crate::model::{GroupSelection, ScoredFile};
use crate::tokens::with_thousands;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";
const CDATA_END_ESCAPED: &str = "]]]]><![CDATA[>";
/// Stands in for a character XML 1.0 cannot carry: `<char code="12"/>`
const CHAR_OPEN: &str = "<char code=\"";
const CHAR_CLOSE: &str = "\"/>";

/// Render selections in the given format
#[must_use]
pub fn render(selections: &[GroupSelection<'_>], budget: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => render_markdown(selections, budget),
        OutputFormat::Xml => render_xml(selections, budget),
    }
}

/// A file entry recovered from a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// `owner/name` of the enclosing group
    pub group: String,
    pub path: String,
    pub content: String,
}

/// Recover `(group, path, content)` entries from a rendered document
pub fn parse_document(text: &str, format: OutputFormat) -> Result<Vec<ParsedFile>> {
    match format {
        OutputFormat::Markdown => parse_markdown(text),
        OutputFormat::Xml => parse_xml(text),
    }
}

fn summary_counts(selections: &[GroupSelection<'_>]) -> (usize, usize) {
    selections.iter().fold((0, 0), |(files, tokens), s| {
        (files + s.files.len(), tokens + s.tokens)
    })
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

fn render_markdown(selections: &[GroupSelection<'_>], budget: usize) -> String {
    let mut out = String::new();
    out.push_str("# Context\n\n");

    for selection in selections {
        let identity = &selection.group.identity;
        let _ = write!(out, "## {}", identity.display_name());
        if let Some(revision) = &identity.revision {
            let _ = write!(out, " (ref: {revision})");
        }
        out.push_str("\n\n");

        if selection.files.is_empty() {
            out.push_str("_No files selected._\n\n");
        }

        for file in selection.files {
            push_markdown_file(&mut out, file);
        }
    }

    let (files, tokens) = summary_counts(selections);
    let _ = writeln!(
        out,
        "---\n\n**Summary:** {} files · {} / {} tokens",
        with_thousands(files),
        with_thousands(tokens),
        with_thousands(budget)
    );
    out
}

fn push_markdown_file(out: &mut String, file: &ScoredFile) {
    let fence = "`".repeat(longest_backtick_run(&file.content).max(2) + 1);

    let _ = write!(
        out,
        "### {}\n\n_{} · score {} · ~{} tokens_\n\n{}{}\n",
        file.relative_path,
        file.category,
        file.score,
        with_thousands(file.tokens),
        fence,
        language_tag(&file.relative_path)
    );
    out.push_str(&file.content);
    let _ = write!(out, "\n{fence}\n\n");
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn language_tag(relative_path: &str) -> &str {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let extension = match file_name.rfind('.') {
        Some(0) | None => return "",
        Some(i) => &file_name[i + 1..],
    };
    match extension {
        "ts" | "mts" | "cts" => "typescript",
        "js" | "mjs" | "cjs" => "javascript",
        "md" => "markdown",
        "rs" => "rust",
        "py" => "python",
        "yml" => "yaml",
        "sh" => "bash",
        ext if ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => "",
    }
}

fn parse_markdown(text: &str) -> Result<Vec<ParsedFile>> {
    let mut files = Vec::new();
    let mut group = String::new();
    let mut pending_path: Option<String> = None;
    let mut cursor = 0;

    while cursor < text.len() {
        let line_end = text[cursor..].find('\n').map_or(text.len(), |i| cursor + i);
        let line = &text[cursor..line_end];
        let next = (line_end + 1).min(text.len());

        if let Some(path) = line.strip_prefix("### ") {
            pending_path = Some(path.to_string());
        } else if let Some(header) = line.strip_prefix("## ") {
            group = strip_revision(header).to_string();
        } else if line.starts_with("```") {
            let Some(path) = pending_path.take() else {
                bail!("Code fence without a file header at byte {cursor}");
            };
            let fence_len = line.chars().take_while(|&c| c == '`').count();
            let closing = format!("\n{}", "`".repeat(fence_len));

            let body_start = next;
            let Some(offset) = text[body_start..].find(&closing) else {
                bail!("Unterminated code fence for {path}");
            };
            let body_end = body_start + offset;

            files.push(ParsedFile {
                group: group.clone(),
                path,
                content: text[body_start..body_end].to_string(),
            });

            // Skip the closing fence line
            let after_fence = body_end + closing.len();
            cursor = text[after_fence..]
                .find('\n')
                .map_or(text.len(), |i| after_fence + i + 1);
            continue;
        }

        cursor = next;
        if line_end == text.len() {
            break;
        }
    }

    Ok(files)
}

fn strip_revision(header: &str) -> &str {
    match header.find(" (ref: ") {
        Some(i) if header.ends_with(')') => &header[..i],
        _ => header,
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

fn render_xml(selections: &[GroupSelection<'_>], budget: usize) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<context budget=\"{budget}\">");

    for selection in selections {
        let identity = &selection.group.identity;
        let _ = write!(
            out,
            "  <repository name=\"{}\"",
            escape_attr(&identity.display_name())
        );
        if let Some(revision) = &identity.revision {
            let _ = write!(out, " ref=\"{}\"", escape_attr(revision));
        }
        let _ = writeln!(out, " tokens=\"{}\">", selection.tokens);

        for file in selection.files {
            let _ = write!(
                out,
                "    <file path=\"{}\" category=\"{}\" score=\"{}\" tokens=\"{}\">{CDATA_OPEN}",
                escape_attr(&file.relative_path),
                file.category,
                file.score,
                file.tokens
            );
            push_cdata_body(&mut out, &file.content);
            out.push_str("]]></file>\n");
        }

        out.push_str("  </repository>\n");
    }

    let (files, tokens) = summary_counts(selections);
    let _ = writeln!(
        out,
        "  <summary files=\"{files}\" tokens=\"{tokens}\" budget=\"{budget}\"/>"
    );
    out.push_str("</context>\n");
    out
}

/// Characters outside the XML 1.0 `Char` production. They are not allowed
/// even as character references.
fn is_xml_restricted(ch: char) -> bool {
    matches!(
        ch,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

/// Write `content` into an open CDATA section.
///
/// `]]>` is split across two sections, and each restricted character closes
/// the section, becomes a `<char>` element, and reopens it.
fn push_cdata_body(out: &mut String, content: &str) {
    let mut start = 0;
    for (i, ch) in content.char_indices() {
        if is_xml_restricted(ch) {
            out.push_str(&content[start..i].replace(CDATA_END, CDATA_END_ESCAPED));
            let _ = write!(
                out,
                "{CDATA_END}{CHAR_OPEN}{}{CHAR_CLOSE}{CDATA_OPEN}",
                u32::from(ch)
            );
            start = i + ch.len_utf8();
        }
    }
    out.push_str(&content[start..].replace(CDATA_END, CDATA_END_ESCAPED));
}

/// Inverse of [`push_cdata_body`]. Section text never contains `]]>`, so
/// every occurrence ends a section.
fn decode_cdata_body(body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(end) = rest.find(CDATA_END) {
        out.push_str(&rest[..end]);
        rest = &rest[end + CDATA_END.len()..];

        if let Some(after) = rest.strip_prefix(CHAR_OPEN) {
            let Some(len) = after.find(CHAR_CLOSE) else {
                bail!("Unterminated <char> element");
            };
            let code: u32 = after[..len]
                .parse()
                .with_context(|| format!("Invalid character code '{}'", &after[..len]))?;
            let ch = char::from_u32(code).ok_or_else(|| anyhow!("Invalid character code {code}"))?;
            out.push(ch);
            rest = &after[len + CHAR_CLOSE.len()..];
        }

        let Some(reopened) = rest.strip_prefix(CDATA_OPEN) else {
            bail!("Expected a CDATA section after ']]>'");
        };
        rest = reopened;
    }
    out.push_str(rest);
    Ok(out)
}

/// Escape an attribute value. Restricted characters have no XML 1.0 form
/// and are replaced with U+FFFD.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c if is_xml_restricted(c) => out.push('\u{FFFD}'),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_attr(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let Some(semi) = rest[amp..].find(';') else {
            bail!("Unterminated entity in attribute: {value}");
        };
        let entity = &rest[amp + 1..amp + semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            "#10" => out.push('\n'),
            "#13" => out.push('\r'),
            "#9" => out.push('\t'),
            other => bail!("Unknown entity &{other};"),
        }
        rest = &rest[amp + semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Value of `name="..."` inside an opening tag
fn attribute(tag: &str, name: &str) -> Result<String> {
    let key = format!(" {name}=\"");
    let Some(start) = tag.find(&key).map(|i| i + key.len()) else {
        bail!("Missing attribute '{name}' in {tag}");
    };
    let Some(len) = tag[start..].find('"') else {
        bail!("Unterminated attribute '{name}' in {tag}");
    };
    unescape_attr(&tag[start..start + len])
}

fn parse_xml(text: &str) -> Result<Vec<ParsedFile>> {
    const REPOSITORY: &str = "<repository ";
    const FILE: &str = "<file ";
    const FILE_CLOSE: &str = "]]></file>";

    let mut files = Vec::new();
    let mut group = String::new();
    let mut cursor = 0;

    loop {
        // The cursor is always outside CDATA, so the next tag found is structural
        let next_repo = text[cursor..].find(REPOSITORY).map(|i| cursor + i);
        let next_file = text[cursor..].find(FILE).map(|i| cursor + i);

        match (next_repo, next_file) {
            (Some(repo), file) if file.is_none_or(|f| repo < f) => {
                let Some(tag_len) = text[repo..].find('>') else {
                    bail!("Unterminated repository tag");
                };
                group = attribute(&text[repo..repo + tag_len], "name")?;
                cursor = repo + tag_len + 1;
            }
            (_, Some(file)) => {
                let Some(open) = text[file..].find(CDATA_OPEN).map(|i| file + i) else {
                    bail!("File element without CDATA body");
                };
                let path = attribute(&text[file..open], "path")?;
                let body_start = open + CDATA_OPEN.len();
                let Some(body_len) = text[body_start..].find(FILE_CLOSE) else {
                    bail!("Unterminated file element for {path}");
                };
                let body = &text[body_start..body_start + body_len];

                files.push(ParsedFile {
                    group: group.clone(),
                    path,
                    content: decode_cdata_body(body)?,
                });
                cursor = body_start + body_len + FILE_CLOSE.len();
            }
            _ => break,
        }
    }

    Ok(files)
}
