//! Core domain types for the component catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Current schema version for the catalog artifact format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The closed set of component categories.
///
/// Declaration order is the catalog order: `byCategory` iterates in this
/// order and collection selection walks records in it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Agents,
    Subagents,
    Commands,
    Settings,
    Hooks,
    Mcps,
    Skills,
    Plugins,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 8] = [
        Category::Agents,
        Category::Subagents,
        Category::Commands,
        Category::Settings,
        Category::Hooks,
        Category::Mcps,
        Category::Skills,
        Category::Plugins,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Agents => "agents",
            Category::Subagents => "subagents",
            Category::Commands => "commands",
            Category::Settings => "settings",
            Category::Hooks => "hooks",
            Category::Mcps => "mcps",
            Category::Skills => "skills",
            Category::Plugins => "plugins",
        }
    }

    /// Manifest-sourced categories declare many components in one file
    /// instead of one file per component.
    pub fn is_manifest_sourced(self) -> bool {
        matches!(self, Category::Plugins)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| CatalogError::UnknownCategory { name: s.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Source documents
// ---------------------------------------------------------------------------

/// On-disk format of a source document, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Markdown,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a path's extension. Returns `None` for
    /// unsupported extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Raw bytes of one document, as read from the source tree.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the source root, `/`-separated.
    pub path: String,
    pub raw_content: Vec<u8>,
    pub format: DocumentFormat,
}

/// The format-specific shape of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Markdown. `frontmatter` is `None` when the document has no complete
    /// `---` block; `body` is the text after it.
    Markdown {
        frontmatter: Option<BTreeMap<String, String>>,
        body: String,
    },
    /// A flat JSON document.
    Json { value: serde_json::Value },
}

/// Structured `{metadata, description, body}` view of one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Frontmatter keys (markdown) or top-level scalar fields (JSON).
    pub metadata: BTreeMap<String, String>,
    /// Short plain-text description.
    pub description: String,
    /// Markdown body after the frontmatter, or compact JSON text.
    pub body: String,
    /// Format-specific variant.
    pub document: Document,
}

impl ParsedDocument {
    /// Non-empty metadata value for `key`.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A document excluded from the catalog, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub path: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// A component declared by a plugin bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledComponent {
    /// Category of the bundled component.
    pub kind: Category,
    /// Path as declared in the plugin manifest.
    pub path: String,
    /// Catalog id of the bundled component, when it resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    /// Globally unique id (e.g. `commands-automation-foo-bar`).
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub category: Category,
    pub sub_category: String,
    /// Attributed company, never empty.
    pub company: String,
    /// 1–5 tags; element 0 is the normalized sub-category.
    pub tags: Vec<String>,
    /// Source path relative to the source root.
    pub file_path: String,
    /// `None` serializes as `null`, the explicit "unknown" placeholder.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub downloads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Browse URL in the configured repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_components: Option<Vec<BundledComponent>>,
}

/// A curated, derived subset of component ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: String,
    pub component_ids: Vec<String>,
    /// Sum of members' known downloads.
    pub downloads: Option<u64>,
}
