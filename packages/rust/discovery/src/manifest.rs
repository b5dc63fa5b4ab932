//! Plugin manifest reader.
//!
//! The `plugins` category is declared in one marketplace manifest:
//!
//! ```json
//! {
//!   "name": "templates",
//!   "plugins": [
//!     {
//!       "name": "git-workflow",
//!       "description": "Git helpers",
//!       "version": "1.0.0",
//!       "author": { "name": "Acme" },
//!       "category": "workflow",
//!       "keywords": ["git"],
//!       "commands": ["./components/commands/git/commit.md"],
//!       "agents": "./components/agents/git/reviewer.md"
//!     }
//!   ]
//! }
//! ```
//!
//! A missing or malformed manifest is structural and fatal. A single entry
//! that lacks a name is only skipped.

use std::path::Path;

use componentry_shared::{CatalogError, Category, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Manifest fields that list bundled component paths, with their category.
const BUNDLE_FIELDS: &[(&str, Category)] = &[
    ("agents", Category::Agents),
    ("commands", Category::Commands),
    ("hooks", Category::Hooks),
    ("mcpServers", Category::Mcps),
    ("skills", Category::Skills),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Top-level marketplace manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    /// Marketplace name.
    #[serde(default)]
    pub name: Option<String>,
    /// Raw plugin entries; each is validated on its own.
    #[serde(default)]
    pub plugins: Vec<Value>,
}

/// A validated plugin entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginEntry {
    pub name: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    /// Declared component paths, in manifest field order.
    pub components: Vec<(Category, String)>,
    /// The entry as written, for description fallback and classification.
    /// `keywords` and other free text are classified from here.
    pub raw: Value,
}

impl PluginEntry {
    /// Validate one raw manifest entry. `index` is only used in error text.
    pub fn from_value(value: &Value, index: usize) -> std::result::Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("plugin entry #{index} is not an object"))?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("plugin entry #{index} has no name"))?
            .to_string();

        let author = match obj.get("author") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(a)) => a.get("name").and_then(Value::as_str).map(String::from),
            _ => None,
        };

        let mut components = Vec::new();
        for (field, category) in BUNDLE_FIELDS {
            for path in string_list(obj.get(*field)) {
                components.push((*category, path));
            }
        }

        Ok(Self {
            name,
            version: obj.get("version").and_then(Value::as_str).map(String::from),
            author,
            category: obj
                .get("category")
                .and_then(Value::as_str)
                .map(String::from),
            components,
            raw: value.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Read and parse the plugin manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<PluginManifest> {
    if !path.is_file() {
        return Err(CatalogError::MissingManifest {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let manifest: PluginManifest = serde_json::from_str(&content).map_err(|e| {
        CatalogError::config(format!(
            "malformed plugin manifest {}: {e}",
            path.display()
        ))
    })?;

    debug!(
        path = %path.display(),
        entries = manifest.plugins.len(),
        "plugin manifest loaded"
    );

    Ok(manifest)
}

/// A field that may be a single string or an array of strings.
/// Objects (inline server definitions) carry no path and are ignored.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
