//! Application configuration for Componentry.
//!
//! The build config lives at `./componentry.toml` (or
//! `~/.componentry/componentry.toml` as a user-wide fallback).
//! CLI flags override config file values, which override defaults.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CatalogError, Result};
use crate::types::Category;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "componentry.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".componentry";

// ---------------------------------------------------------------------------
// Config structs (matching componentry.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source tree location and per-category patterns.
    #[serde(default)]
    pub source: SourceConfig,

    /// Artifact output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// How download counts and timestamps are filled in.
    #[serde(default)]
    pub placeholders: PlaceholderPolicy,

    /// Declared collections.
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            placeholders: PlaceholderPolicy::default(),
            collections: default_collections(),
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Root of the document tree.
    #[serde(default = "default_root")]
    pub root: String,

    /// Reference recorded in the artifact (branch, tag, or commit).
    #[serde(default = "default_source_ref")]
    pub source_ref: String,

    /// Repository browse URL; when set, records carry a `sourceUrl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    /// Category name → glob pattern, relative to `root`.
    #[serde(default = "default_patterns")]
    pub patterns: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            source_ref: default_source_ref(),
            repository_url: None,
            patterns: default_patterns(),
        }
    }
}

fn default_root() -> String {
    ".".into()
}
fn default_source_ref() -> String {
    "local".into()
}

fn default_patterns() -> BTreeMap<String, String> {
    [
        ("agents", "components/agents/**/*.md"),
        ("subagents", "components/subagents/**/*.md"),
        ("commands", "components/commands/**/*.md"),
        ("settings", "components/settings/**/*.json"),
        ("hooks", "components/hooks/**/*.json"),
        ("mcps", "components/mcps/**/*.json"),
        ("skills", "components/skills/**/SKILL.md"),
        ("plugins", ".claude-plugin/marketplace.json"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl SourceConfig {
    /// Validate the pattern map into `(Category, pattern)` pairs in category
    /// declaration order. An unknown category name is fatal.
    pub fn category_patterns(&self) -> Result<Vec<(Category, String)>> {
        let mut resolved = Vec::with_capacity(self.patterns.len());
        for (name, pattern) in &self.patterns {
            let category: Category = name.parse()?;
            if pattern.trim().is_empty() {
                return Err(CatalogError::config(format!(
                    "empty pattern for category '{category}'"
                )));
            }
            resolved.push((category, pattern.trim().to_string()));
        }
        resolved.sort_by_key(|(category, _)| *category);
        Ok(resolved)
    }

    /// Parse the configured repository URL, if any.
    pub fn repository_url(&self) -> Result<Option<Url>> {
        match &self.repository_url {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => {
                // A trailing slash makes `Url::join` append rather than replace.
                let normalized = if raw.ends_with('/') {
                    raw.clone()
                } else {
                    format!("{raw}/")
                };
                Url::parse(&normalized).map(Some).map_err(|e| {
                    CatalogError::config(format!("invalid repository_url '{raw}': {e}"))
                })
            }
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Artifact path.
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Maximum documents processed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output_path() -> String {
    "catalog.json".into()
}
fn default_concurrency() -> u32 {
    8
}

/// `[placeholders]` section: download counts and timestamps are not tracked
/// by the source tree, so they are either left unknown or derived from a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Serialize as `null`.
    #[default]
    Unknown,
    /// Deterministic values derived from the seed and component id.
    Seeded { seed: u64 },
}

/// Which record field a collection predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateField {
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "subCategory")]
    SubCategory,
    #[serde(rename = "tags")]
    Tags,
}

/// `[[collections]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Field the predicate matches against.
    pub field: PredicateField,
    /// Case-insensitive substring the field must contain.
    pub contains: String,
    /// Target size K.
    pub size: usize,
}

fn default_collections() -> Vec<CollectionSpec> {
    fn spec(
        id: &str,
        name: &str,
        description: &str,
        field: PredicateField,
        contains: &str,
        size: usize,
    ) -> CollectionSpec {
        CollectionSpec {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            field,
            contains: contains.into(),
            size,
        }
    }

    vec![
        spec(
            "security-essentials",
            "Security Essentials",
            "Agents and commands for auditing and hardening code.",
            PredicateField::SubCategory,
            "security",
            6,
        ),
        spec(
            "devops-toolkit",
            "DevOps Toolkit",
            "Infrastructure, CI/CD and deployment helpers.",
            PredicateField::SubCategory,
            "devops",
            6,
        ),
        spec(
            "testing-suite",
            "Testing Suite",
            "Components for writing and running tests.",
            PredicateField::Tags,
            "testing",
            6,
        ),
        spec(
            "database-pack",
            "Database Pack",
            "Schema design, queries and database integrations.",
            PredicateField::Tags,
            "database",
            5,
        ),
        spec(
            "mcp-starter",
            "MCP Starter",
            "Protocol integrations to connect external tools.",
            PredicateField::Category,
            "mcps",
            5,
        ),
        spec(
            "automation-hooks",
            "Automation Hooks",
            "Hooks that automate routine steps.",
            PredicateField::Category,
            "hooks",
            5,
        ),
    ]
}

impl AppConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.source.category_patterns()?;
        self.source.repository_url()?;

        if self.output.concurrency == 0 {
            return Err(CatalogError::config("output.concurrency must be at least 1"));
        }

        let mut seen = HashSet::new();
        for spec in &self.collections {
            if spec.id.trim().is_empty() {
                return Err(CatalogError::config("collection with empty id"));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(CatalogError::config(format!(
                    "collection '{}' declared twice",
                    spec.id
                )));
            }
            if spec.contains.trim().is_empty() {
                return Err(CatalogError::config(format!(
                    "collection '{}' has an empty predicate",
                    spec.id
                )));
            }
            if spec.size == 0 {
                return Err(CatalogError::config(format!(
                    "collection '{}' has size 0",
                    spec.id
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.componentry/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.componentry/componentry.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// Looks for `./componentry.toml`, then the user config file. Returns
/// defaults if neither exists.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        CatalogError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write a default config file at `path`, creating parent directories.
/// Returns the path to the created file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CatalogError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CatalogError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("catalog.json"));
        assert!(toml_str.contains("components/agents/**/*.md"));
        assert!(toml_str.contains("security-essentials"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.output.concurrency, 8);
        assert_eq!(parsed.placeholders, PlaceholderPolicy::Unknown);
        assert_eq!(parsed.collections, config.collections);
        assert_eq!(parsed.source.patterns.len(), 8);
    }

    #[test]
    fn config_with_collections_and_seed() {
        let toml_str = r#"
[source]
root = "/srv/templates"
source_ref = "main"

[source.patterns]
commands = "commands/**/*.md"

[placeholders]
policy = "seeded"
seed = 42

[[collections]]
id = "sec"
name = "Security"
field = "subCategory"
contains = "security"
size = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.root, "/srv/templates");
        assert_eq!(config.source.patterns.len(), 1);
        assert_eq!(config.placeholders, PlaceholderPolicy::Seeded { seed: 42 });
        assert_eq!(config.collections.len(), 1);
        assert_eq!(config.collections[0].field, PredicateField::SubCategory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_predicate_field_rejected() {
        let toml_str = r#"
[[collections]]
id = "x"
name = "X"
field = "company"
contains = "acme"
size = 2
"#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn category_patterns_sorted_and_validated() {
        let config = AppConfig::default();
        let patterns = config.source.category_patterns().expect("valid");
        let categories: Vec<Category> = patterns.iter().map(|(c, _)| *c).collect();
        assert_eq!(categories, Category::ALL.to_vec());

        let mut bad = SourceConfig::default();
        bad.patterns.insert("widgets".into(), "widgets/*.md".into());
        let err = bad.category_patterns().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCategory { ref name } if name == "widgets"));
    }

    #[test]
    fn repository_url_gets_trailing_slash() {
        let mut source = SourceConfig::default();
        source.repository_url = Some("https://github.com/acme/templates/blob/main".into());
        let url = source.repository_url().unwrap().unwrap();
        assert_eq!(
            url.join("components/a.md").unwrap().as_str(),
            "https://github.com/acme/templates/blob/main/components/a.md"
        );

        source.repository_url = Some("not a url".into());
        assert!(source.repository_url().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_collection() {
        let mut config = AppConfig::default();
        let first = config.collections[0].clone();
        config.collections.push(first);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn init_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("componentry-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join(CONFIG_FILE_NAME);

        init_config(&path).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.output.path, "catalog.json");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
