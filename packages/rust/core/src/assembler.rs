//! Catalog assembler.
//!
//! Takes per-category record lists in walker order and builds the read-only
//! [`Catalog`]: records grouped by category, an id index, and the sorted set
//! of companies. Duplicate ids abort assembly. Plugin bundles are linked to
//! the records they declare before the catalog is frozen.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info, instrument};

use componentry_artifacts::CatalogArtifact;
use componentry_shared::{CatalogError, Category, Collection, ComponentRecord, Result};

/// The assembled, read-only catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_category: BTreeMap<Category, Vec<ComponentRecord>>,
    /// id → (category, index within that category's list).
    by_id: HashMap<String, (Category, usize)>,
    companies: BTreeSet<String>,
}

impl Catalog {
    /// Records grouped by category, in category declaration order.
    pub fn by_category(&self) -> &BTreeMap<Category, Vec<ComponentRecord>> {
        &self.by_category
    }

    /// Distinct companies, sorted.
    pub fn companies(&self) -> &BTreeSet<String> {
        &self.companies
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&ComponentRecord> {
        let (category, idx) = self.by_id.get(id)?;
        self.by_category.get(category).and_then(|list| list.get(*idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Every record in assembled order (category order, then walker order).
    pub fn records(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.by_category.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Record count per category.
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        self.by_category
            .iter()
            .map(|(category, list)| (*category, list.len()))
            .collect()
    }

    /// Rebuild a catalog from a loaded artifact.
    ///
    /// Re-checks id uniqueness and that every collection member resolves.
    /// Bundles are taken as written.
    pub fn from_artifact(artifact: &CatalogArtifact) -> Result<Self> {
        let catalog = build(artifact.by_category.clone())?;
        validate_collections(&catalog, &artifact.collections)?;
        Ok(catalog)
    }
}

/// Assemble a catalog from per-category records.
///
/// Categories appear in declaration order regardless of input order; each
/// category's records keep their input order. Categories with no records
/// are kept as empty lists.
#[instrument(skip_all, fields(categories = categories.len()))]
pub fn assemble(categories: Vec<(Category, Vec<ComponentRecord>)>) -> Result<Catalog> {
    let mut by_category: BTreeMap<Category, Vec<ComponentRecord>> = BTreeMap::new();
    for (category, records) in categories {
        by_category.entry(category).or_default().extend(records);
    }

    link_bundles(&mut by_category);
    let catalog = build(by_category)?;

    info!(
        records = catalog.len(),
        companies = catalog.companies.len(),
        "catalog assembled"
    );

    Ok(catalog)
}

/// Check that every collection member resolves and no collection repeats an id.
pub fn validate_collections(catalog: &Catalog, collections: &[Collection]) -> Result<()> {
    for collection in collections {
        let mut seen = HashSet::new();
        for id in &collection.component_ids {
            if !catalog.contains(id) {
                return Err(CatalogError::validation(format!(
                    "collection '{}' references unknown component '{id}'",
                    collection.id
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(CatalogError::validation(format!(
                    "collection '{}' lists '{id}' twice",
                    collection.id
                )));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index and freeze.
fn build(by_category: BTreeMap<Category, Vec<ComponentRecord>>) -> Result<Catalog> {
    let mut by_id: HashMap<String, (Category, usize)> = HashMap::new();
    let mut companies = BTreeSet::new();

    for (category, records) in &by_category {
        for (idx, record) in records.iter().enumerate() {
            if let Some((prev_cat, prev_idx)) = by_id.get(&record.id) {
                let first = &by_category[prev_cat][*prev_idx];
                return Err(duplicate(&record.id, &first.file_path, &record.file_path));
            }
            by_id.insert(record.id.clone(), (*category, idx));
            companies.insert(record.company.clone());
        }
    }

    Ok(Catalog {
        by_category,
        by_id,
        companies,
    })
}

fn duplicate(id: &str, first: &str, second: &str) -> CatalogError {
    CatalogError::DuplicateId {
        id: id.to_string(),
        first: first.to_string(),
        second: second.to_string(),
    }
}

/// Resolve each plugin's declared component paths to catalog ids.
///
/// A declared path matches a record of the declared kind whose file path
/// equals it or ends with it at a `/` boundary. The first match in catalog
/// order wins; unmatched paths keep no id.
fn link_bundles(by_category: &mut BTreeMap<Category, Vec<ComponentRecord>>) {
    let files: Vec<(Category, String, String)> = by_category
        .iter()
        .filter(|(category, _)| !category.is_manifest_sourced())
        .flat_map(|(category, records)| {
            records
                .iter()
                .map(move |r| (*category, r.file_path.clone(), r.id.clone()))
        })
        .collect();

    let Some(plugins) = by_category.get_mut(&Category::Plugins) else {
        return;
    };

    for plugin in plugins.iter_mut() {
        let Some(bundled) = plugin.bundled_components.as_mut() else {
            continue;
        };
        for component in bundled.iter_mut() {
            let wanted = component.path.trim_start_matches("./").trim_start_matches('/');
            component.id = files
                .iter()
                .find(|(kind, file_path, _)| {
                    *kind == component.kind && path_matches(file_path, wanted)
                })
                .map(|(_, _, id)| id.clone());

            if component.id.is_none() {
                debug!(plugin = %plugin.id, path = %component.path, "bundled component not in catalog");
            }
        }
    }
}

fn path_matches(file_path: &str, wanted: &str) -> bool {
    if wanted.is_empty() {
        return false;
    }
    file_path == wanted
        || file_path
            .strip_suffix(wanted)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use componentry_shared::BundledComponent;

    fn record(id: &str, category: Category, file_path: &str, company: &str) -> ComponentRecord {
        ComponentRecord {
            id: id.into(),
            name: id.into(),
            icon: "📄".into(),
            description: String::new(),
            category,
            sub_category: "general".into(),
            company: company.into(),
            tags: vec!["general".into()],
            file_path: file_path.into(),
            created_at: None,
            updated_at: None,
            downloads: None,
            version: None,
            author: None,
            source_url: None,
            bundled_components: None,
        }
    }

    #[test]
    fn assemble_groups_and_indexes() {
        let catalog = assemble(vec![
            (
                Category::Commands,
                vec![record("commands-general-b", Category::Commands, "commands/b.md", "Stripe")],
            ),
            (
                Category::Agents,
                vec![
                    record("agents-general-z", Category::Agents, "agents/z.md", "Community"),
                    record("agents-general-a", Category::Agents, "agents/a.md", "AWS"),
                ],
            ),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 3);
        let order: Vec<&str> = catalog.records().map(|r| r.id.as_str()).collect();
        // Category order first, walker order within a category.
        assert_eq!(
            order,
            vec!["agents-general-z", "agents-general-a", "commands-general-b"]
        );
        assert_eq!(catalog.get("commands-general-b").unwrap().file_path, "commands/b.md");
        assert!(catalog.get("missing").is_none());

        let companies: Vec<&str> = catalog.companies().iter().map(String::as_str).collect();
        assert_eq!(companies, vec!["AWS", "Community", "Stripe"]);
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let err = assemble(vec![(
            Category::Agents,
            vec![
                record("agents-general-foo", Category::Agents, "agents/foo.md", "Community"),
                record("agents-general-foo", Category::Agents, "agents/Foo.md", "Community"),
            ],
        )])
        .unwrap_err();

        assert!(err.is_fatal());
        match err {
            CatalogError::DuplicateId { id, first, second } => {
                assert_eq!(id, "agents-general-foo");
                assert_eq!(first, "agents/foo.md");
                assert_eq!(second, "agents/Foo.md");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_across_categories_is_fatal() {
        let err = assemble(vec![
            (Category::Agents, vec![record("x", Category::Agents, "agents/x.md", "C")]),
            (Category::Skills, vec![record("x", Category::Skills, "skills/x/SKILL.md", "C")]),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn bundles_link_to_catalog_ids() {
        let mut plugin = record("plugin-git", Category::Plugins, ".claude-plugin/marketplace.json", "C");
        plugin.bundled_components = Some(vec![
            BundledComponent {
                kind: Category::Commands,
                path: "./commands/git/commit.md".into(),
                id: None,
            },
            BundledComponent {
                kind: Category::Agents,
                path: "./commands/git/commit.md".into(),
                id: None,
            },
            BundledComponent {
                kind: Category::Commands,
                path: "./commands/git/missing.md".into(),
                id: None,
            },
        ]);

        let catalog = assemble(vec![
            (
                Category::Commands,
                vec![record(
                    "commands-git-commit",
                    Category::Commands,
                    "components/commands/git/commit.md",
                    "C",
                )],
            ),
            (Category::Plugins, vec![plugin]),
        ])
        .unwrap();

        let bundled = catalog
            .get("plugin-git")
            .unwrap()
            .bundled_components
            .clone()
            .unwrap();
        assert_eq!(bundled[0].id.as_deref(), Some("commands-git-commit"));
        // Kind must match too.
        assert!(bundled[1].id.is_none());
        assert!(bundled[2].id.is_none());
    }

    #[test]
    fn path_matching_respects_segment_boundaries() {
        assert!(path_matches("components/commands/git/commit.md", "commands/git/commit.md"));
        assert!(path_matches("commit.md", "commit.md"));
        assert!(!path_matches("components/commands/git/precommit.md", "commit.md"));
        assert!(!path_matches("a.md", ""));
    }

    #[test]
    fn validate_collections_rejects_dangling_ids() {
        let catalog = assemble(vec![(
            Category::Agents,
            vec![record("a", Category::Agents, "agents/a.md", "C")],
        )])
        .unwrap();

        let ok = Collection {
            id: "c".into(),
            name: "C".into(),
            description: String::new(),
            component_ids: vec!["a".into()],
            downloads: None,
        };
        assert!(validate_collections(&catalog, &[ok.clone()]).is_ok());

        let dangling = Collection {
            component_ids: vec!["a".into(), "ghost".into()],
            ..ok.clone()
        };
        assert!(validate_collections(&catalog, &[dangling]).is_err());

        let repeated = Collection {
            component_ids: vec!["a".into(), "a".into()],
            ..ok
        };
        assert!(validate_collections(&catalog, &[repeated]).is_err());
    }
}
