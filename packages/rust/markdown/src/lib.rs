//! Document parsing for catalog sources.
//!
//! Turns the raw bytes of a [`SourceDocument`] into a [`ParsedDocument`]
//! (`metadata`, `description`, `body`). The strategy is chosen by the
//! document's format:
//! - Markdown with an optional `---` frontmatter block
//! - flat JSON, with a `description → summary → name` fallback chain
//!
//! Parse failures are per-document ([`CatalogError::Parse`]); callers skip
//! the document and continue the run.

mod frontmatter;
mod json;

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use componentry_shared::{
    CatalogError, Document, DocumentFormat, ParsedDocument, Result, SourceDocument,
};

pub use json::{from_json_value, json_description, parse_json};

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Body lines used for the description when frontmatter is present.
const FRONTMATTER_DESCRIPTION_LINES: usize = 3;

/// Non-header lines used for the description when there is no frontmatter.
const PLAIN_DESCRIPTION_LINES: usize = 2;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse one source document according to its format.
#[instrument(skip_all, fields(path = %doc.path, format = ?doc.format))]
pub fn parse(doc: &SourceDocument) -> Result<ParsedDocument> {
    let content = std::str::from_utf8(&doc.raw_content)
        .map_err(|e| CatalogError::parse(&doc.path, format!("not valid UTF-8: {e}")))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let parsed = match doc.format {
        DocumentFormat::Markdown => parse_markdown(content),
        DocumentFormat::Json => parse_json(&doc.path, content)?,
    };

    debug!(
        keys = parsed.metadata.len(),
        description_len = parsed.description.len(),
        "document parsed"
    );

    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Markdown strategy
// ---------------------------------------------------------------------------

/// Parse markdown with an optional frontmatter block.
///
/// Without a complete block the whole content is the body, metadata is
/// empty, and the description skips header lines.
pub fn parse_markdown(content: &str) -> ParsedDocument {
    match frontmatter::split(content) {
        Some((block, body)) => {
            let body = body.trim_start_matches(['\r', '\n']);
            let metadata = frontmatter::parse_block(block);
            ParsedDocument {
                description: describe(body, FRONTMATTER_DESCRIPTION_LINES, false),
                body: body.to_string(),
                document: Document::Markdown {
                    frontmatter: Some(metadata.clone()),
                    body: body.to_string(),
                },
                metadata,
            }
        }
        None => ParsedDocument {
            metadata: BTreeMap::new(),
            description: describe(content, PLAIN_DESCRIPTION_LINES, true),
            body: content.to_string(),
            document: Document::Markdown {
                frontmatter: None,
                body: content.to_string(),
            },
        },
    }
}

/// Join the first `max_lines` non-blank lines with spaces and truncate.
fn describe(body: &str, max_lines: usize, skip_headers: bool) -> String {
    let joined = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !skip_headers || !line.starts_with('#'))
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&joined, DESCRIPTION_MAX_CHARS)
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &str, content: &str) -> SourceDocument {
        SourceDocument {
            path: path.into(),
            raw_content: content.as_bytes().to_vec(),
            format: DocumentFormat::from_path(std::path::Path::new(path))
                .expect("supported format"),
        }
    }

    #[test]
    fn frontmatter_description_takes_three_body_lines() {
        let doc = source(
            "commands/automation/foo-bar.md",
            "---\nname: Foo Bar\n---\nLine1\nLine2\nLine3\nLine4",
        );
        let parsed = parse(&doc).unwrap();

        assert_eq!(parsed.metadata["name"], "Foo Bar");
        assert_eq!(parsed.description, "Line1 Line2 Line3");
        assert_eq!(parsed.body, "Line1\nLine2\nLine3\nLine4");
        assert_eq!(
            parsed.document,
            Document::Markdown {
                frontmatter: Some(BTreeMap::from([("name".to_string(), "Foo Bar".to_string())])),
                body: "Line1\nLine2\nLine3\nLine4".into(),
            }
        );
    }

    #[test]
    fn frontmatter_metadata_has_no_delimiters() {
        let parsed = parse_markdown("---\nname: A\ndescription: B\n---\n\n---\nText after a rule\n");
        assert_eq!(parsed.metadata.len(), 2);
        assert!(parsed.metadata.keys().all(|k| !k.contains("---")));
        assert!(parsed.metadata.values().all(|v| !v.contains("---")));
        assert!(parsed.body.starts_with("---\nText after a rule"));
    }

    #[test]
    fn frontmatter_description_includes_headers() {
        let parsed = parse_markdown("---\nname: A\n---\n# Title\n\nFirst\nSecond\n");
        assert_eq!(parsed.description, "# Title First Second");
    }

    #[test]
    fn no_frontmatter_skips_headers_and_takes_two_lines() {
        let parsed = parse_markdown("# Title\n\nFirst line\n## Sub\nSecond line\nThird line\n");
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.description, "First line Second line");
        assert_eq!(
            parsed.document,
            Document::Markdown {
                frontmatter: None,
                body: "# Title\n\nFirst line\n## Sub\nSecond line\nThird line\n".into(),
            }
        );
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let content = "---\nname: Broken\nNo closing delimiter\nMore text\n";
        let parsed = parse_markdown(content);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, content);
        assert_eq!(parsed.description, "--- name: Broken");
    }

    #[test]
    fn description_truncated_to_200_chars() {
        let long = "é".repeat(150);
        let content = format!("---\nname: X\n---\n{long}\n{long}\n");
        let parsed = parse_markdown(&content);
        assert_eq!(parsed.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn bom_is_stripped() {
        let doc = source("agents/x.md", "\u{feff}---\nname: X\n---\nBody\n");
        let parsed = parse(&doc).unwrap();
        assert_eq!(parsed.metadata["name"], "X");
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        let doc = SourceDocument {
            path: "agents/bad.md".into(),
            raw_content: vec![0xff, 0xfe, 0x00],
            format: DocumentFormat::Markdown,
        };
        let err = parse(&doc).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 3), "");
    }
}
