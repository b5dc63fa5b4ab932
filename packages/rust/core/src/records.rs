//! Builds [`ComponentRecord`]s from parsed documents and plugin entries.

use url::Url;

use componentry_discovery::{PluginEntry, WalkedPath};
use componentry_shared::{
    BundledComponent, Category, ComponentRecord, ParsedDocument, PlaceholderPolicy,
};

use crate::classifier;
use crate::identifier::{self, DEFAULT_SUB_CATEGORY};
use crate::placeholders::placeholders_for;

/// Run-wide inputs to record construction.
#[derive(Debug, Clone)]
pub struct RecordContext {
    /// Repository browse URL (with trailing slash) for `sourceUrl`.
    pub repository_url: Option<Url>,
    pub placeholders: PlaceholderPolicy,
}

impl RecordContext {
    fn source_url(&self, file_path: &str) -> Option<String> {
        self.repository_url
            .as_ref()
            .and_then(|base| base.join(file_path).ok())
            .map(String::from)
    }
}

/// Record for one file-sourced document.
pub fn file_record(
    ctx: &RecordContext,
    category: Category,
    walked: &WalkedPath,
    parsed: &ParsedDocument,
) -> ComponentRecord {
    let identity = identifier::file_identity(&walked.relative, &walked.base);
    let id = identifier::component_id(category, &identity.sub_category, &identity.base_name);

    let name = parsed
        .meta("name")
        .map(String::from)
        .unwrap_or_else(|| identifier::display_name(&identity.base_name));

    let classification = classifier::classify(
        parsed,
        &walked.relative,
        &name,
        category,
        &identity.sub_category,
    );
    let placeholders = placeholders_for(ctx.placeholders, &id);

    ComponentRecord {
        id,
        name,
        icon: classification.icon,
        description: parsed.description.clone(),
        category,
        sub_category: identity.sub_category,
        company: classification.company,
        tags: classification.tags,
        file_path: walked.relative.clone(),
        created_at: placeholders.created_at,
        updated_at: placeholders.updated_at,
        downloads: placeholders.downloads,
        version: parsed.meta("version").map(String::from),
        author: parsed.meta("author").map(String::from),
        source_url: ctx.source_url(&walked.relative),
        bundled_components: None,
    }
}

/// Record for one plugin declared in the manifest at `manifest_path`.
///
/// Bundled component ids are left unresolved; the assembler links them.
pub fn plugin_record(
    ctx: &RecordContext,
    manifest_path: &str,
    entry: &PluginEntry,
) -> ComponentRecord {
    let parsed = componentry_markdown::from_json_value(entry.raw.clone());
    let id = identifier::plugin_id(&entry.name);
    let sub_category = entry
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUB_CATEGORY)
        .to_string();

    let classification = classifier::classify(
        &parsed,
        manifest_path,
        &entry.name,
        Category::Plugins,
        &sub_category,
    );
    let placeholders = placeholders_for(ctx.placeholders, &id);

    let bundled = entry
        .components
        .iter()
        .map(|(kind, path)| BundledComponent {
            kind: *kind,
            path: path.clone(),
            id: None,
        })
        .collect();

    ComponentRecord {
        id,
        name: entry.name.clone(),
        icon: classification.icon,
        description: parsed.description,
        category: Category::Plugins,
        sub_category,
        company: classification.company,
        tags: classification.tags,
        file_path: manifest_path.to_string(),
        created_at: placeholders.created_at,
        updated_at: placeholders.updated_at,
        downloads: placeholders.downloads,
        version: entry.version.clone(),
        author: entry.author.clone(),
        source_url: ctx.source_url(manifest_path),
        bundled_components: Some(bundled),
    }
}
