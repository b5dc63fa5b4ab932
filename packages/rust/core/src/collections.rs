//! Collection deriver.
//!
//! Each declared collection selects the first K catalog records, in
//! assembled order, whose predicate field contains a substring
//! (case-insensitive). Collections that match nothing are dropped.

use tracing::{debug, info, instrument};

use componentry_shared::{Collection, CollectionSpec, ComponentRecord, PredicateField};

use crate::assembler::Catalog;

/// Derive collections from `catalog` for every declared spec.
#[instrument(skip_all, fields(specs = specs.len()))]
pub fn derive_collections(catalog: &Catalog, specs: &[CollectionSpec]) -> Vec<Collection> {
    let mut out = Vec::with_capacity(specs.len());

    for spec in specs {
        let needle = spec.contains.to_lowercase();
        let members: Vec<&ComponentRecord> = catalog
            .records()
            .filter(|r| matches(r, spec.field, &needle))
            .take(spec.size)
            .collect();

        if members.is_empty() {
            debug!(collection = %spec.id, "no matching components, dropped");
            continue;
        }

        let downloads = members
            .iter()
            .filter_map(|r| r.downloads)
            .reduce(|a, b| a.saturating_add(b));

        out.push(Collection {
            id: spec.id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            component_ids: members.iter().map(|r| r.id.clone()).collect(),
            downloads,
        });
    }

    info!(derived = out.len(), "collections derived");
    out
}

fn matches(record: &ComponentRecord, field: PredicateField, needle: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(needle);
    match field {
        PredicateField::Category => contains(record.category.as_str()),
        PredicateField::SubCategory => contains(&record.sub_category),
        PredicateField::Tags => record.tags.iter().any(|t| contains(t)),
    }
}
