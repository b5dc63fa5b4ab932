//! Frontmatter block detection and parsing.
//!
//! The block is read as YAML. Top-level scalars become strings, sequences
//! of scalars are joined with `", "`, and nested mappings are skipped.
//! Blocks that are not valid YAML (e.g. `title: A: B`) fall back to a line
//! parser that splits each `key: value` on the first colon.

use std::collections::BTreeMap;

use serde_yaml::Value;
use tracing::debug;

/// Frontmatter delimiter line.
const DELIMITER: &str = "---";

/// Split `content` into `(frontmatter block, body)`.
///
/// Returns `None` when the content does not open with a delimiter line or
/// the block is never closed.
pub(crate) fn split(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim() == DELIMITER {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }

    None
}

/// Parse a frontmatter block into a flat key/value map.
pub(crate) fn parse_block(block: &str) -> BTreeMap<String, String> {
    match serde_yaml::from_str::<Value>(block) {
        Ok(Value::Mapping(mapping)) => {
            // Non-string scalars keep their source spelling (`version: 1.10`).
            let raw = top_level_text(block);
            let mut map = BTreeMap::new();
            for (key, value) in &mapping {
                let Some(key) = scalar(key) else {
                    continue;
                };
                let rendered = match value {
                    Value::Null => Some(String::new()),
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Bool(_) | Value::Number(_) => {
                        raw.get(&key).cloned().or_else(|| scalar(value))
                    }
                    Value::Sequence(items) => Some(
                        items
                            .iter()
                            .filter_map(scalar)
                            .collect::<Vec<_>>()
                            .join(", "),
                    ),
                    Value::Tagged(tagged) => scalar(&tagged.value),
                    Value::Mapping(_) => None,
                };
                match rendered {
                    Some(v) => {
                        map.insert(key, v);
                    }
                    None => debug!(key = %key, "skipping nested frontmatter value"),
                }
            }
            map
        }
        Ok(Value::Null) => BTreeMap::new(),
        Ok(_) => parse_lines(block),
        Err(e) => {
            debug!(error = %e, "frontmatter is not valid YAML, using line parser");
            parse_lines(block)
        }
    }
}

/// Unindented `key: value` text, with any trailing ` #` comment removed.
fn top_level_text(block: &str) -> BTreeMap<String, String> {
    block
        .lines()
        .filter(|line| !line.starts_with([' ', '\t']))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| {
            let value = value.split(" #").next().unwrap_or_default();
            (key.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

/// A YAML scalar rendered as a string.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Line parser
// ---------------------------------------------------------------------------

/// What the previous key is still collecting.
enum Pending {
    List,
    Folded,
}

/// Line-oriented `key: value` parsing, split on the first colon. Handles
/// quotes, `- item` lists and folded `|`/`>` scalars; `#` comments are skipped.
fn parse_lines(block: &str) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    let mut pending: Option<(String, Pending)> = None;

    for raw in block.lines() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');

        if let Some((key, mode)) = &pending {
            match mode {
                Pending::List => {
                    if let Some(item) = trimmed.strip_prefix("- ") {
                        append(&mut map, key, &unquote(item.trim()), ", ");
                        continue;
                    }
                }
                Pending::Folded => {
                    if indented {
                        append(&mut map, key, trimmed, " ");
                        continue;
                    }
                }
            }
        }
        pending = None;

        let Some((key, value)) = trimmed.split_once(':') else {
            debug!(line = trimmed, "ignoring frontmatter line without a key");
            continue;
        };

        let key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();

        match value {
            "" => {
                map.insert(key.clone(), String::new());
                pending = Some((key, Pending::List));
            }
            "|" | ">" | "|-" | ">-" => {
                map.insert(key.clone(), String::new());
                pending = Some((key, Pending::Folded));
            }
            _ => {
                map.insert(key, unquote(value));
            }
        }
    }

    map
}

fn append(map: &mut BTreeMap<String, String>, key: &str, item: &str, sep: &str) {
    let entry = map.entry(key.to_string()).or_default();
    if !entry.is_empty() {
        entry.push_str(sep);
    }
    entry.push_str(item);
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == b'"' && last == b'"' {
            return value[1..value.len() - 1].replace("\\\"", "\"");
        }
        if first == b'\'' && last == b'\'' {
            return value[1..value.len() - 1].replace("''", "'");
        }
    }
    value.to_string()
}
