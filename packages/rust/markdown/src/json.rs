//! Flat JSON documents (settings, hooks, MCP server definitions).

use std::collections::BTreeMap;

use serde_json::Value;

use componentry_shared::{CatalogError, Document, ParsedDocument, Result};

/// Keys tried, in order, for a JSON document's description.
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "name"];

/// Parse a JSON document. Invalid JSON is a per-document parse error.
pub fn parse_json(path: &str, content: &str) -> Result<ParsedDocument> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| CatalogError::parse(path, format!("invalid JSON: {e}")))?;

    Ok(from_json_value(value))
}

/// Build the parsed view of an already-decoded JSON value.
pub fn from_json_value(value: Value) -> ParsedDocument {
    ParsedDocument {
        metadata: scalar_fields(&value),
        description: json_description(&value),
        body: value.to_string(),
        document: Document::Json { value },
    }
}

/// First non-empty string among `description`, `summary`, `name`; else `""`.
pub fn json_description(value: &Value) -> String {
    DESCRIPTION_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Top-level scalar fields rendered as strings.
fn scalar_fields(value: &Value) -> BTreeMap<String, String> {
    let Some(obj) = value.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter_map(|(key, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_fallback_chain() {
        assert_eq!(
            json_description(&json!({"description": "D", "summary": "S", "name": "N"})),
            "D"
        );
        assert_eq!(json_description(&json!({"summary": "S", "name": "N"})), "S");
        assert_eq!(json_description(&json!({"description": "  ", "name": "N"})), "N");
        assert_eq!(json_description(&json!({"other": 1})), "");
        assert_eq!(json_description(&json!([1, 2])), "");
    }

    #[test]
    fn parse_collects_scalar_metadata() {
        let parsed = parse_json(
            "settings/x.json",
            r#"{"name":"Strict","version":2,"enabled":true,"permissions":{"deny":[]}}"#,
        )
        .unwrap();

        assert_eq!(parsed.metadata["name"], "Strict");
        assert_eq!(parsed.metadata["version"], "2");
        assert_eq!(parsed.metadata["enabled"], "true");
        assert!(!parsed.metadata.contains_key("permissions"));
        assert_eq!(parsed.description, "Strict");
        assert!(matches!(parsed.document, Document::Json { .. }));
        assert!(parsed.body.contains("\"permissions\""));
    }

    #[test]
    fn invalid_json_is_recoverable() {
        let err = parse_json("mcps/broken.json", "{ \"name\": ").unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("mcps/broken.json"));
    }
}
