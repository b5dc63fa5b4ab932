//! Read-only queries over an assembled [`Catalog`].

use std::cmp::Ordering;
use std::str::FromStr;

use componentry_shared::{CatalogError, Category, ComponentRecord};

use crate::assembler::Catalog;

/// Company filter value that disables filtering.
pub const ALL_COMPANIES: &str = "all";

/// Sort key for [`sort_components`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Most downloads first.
    #[default]
    Downloads,
    /// By name, ascending, case-insensitive.
    Alphabetical,
    /// Most recently created first.
    Newest,
    /// Most recently updated first.
    Updated,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Downloads => "downloads",
            Self::Alphabetical => "alphabetical",
            Self::Newest => "newest",
            Self::Updated => "updated",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "downloads" => Ok(Self::Downloads),
            "alphabetical" | "name" => Ok(Self::Alphabetical),
            "newest" => Ok(Self::Newest),
            "updated" => Ok(Self::Updated),
            other => Err(CatalogError::config(format!(
                "unknown sort key '{other}' (expected downloads, alphabetical, newest or updated)"
            ))),
        }
    }
}

impl Catalog {
    /// Every record, in category order.
    pub fn get_all_components(&self) -> Vec<&ComponentRecord> {
        self.records().collect()
    }

    /// Records of one category; empty when the name is unknown.
    pub fn get_components_by_category(&self, category: &str) -> Vec<&ComponentRecord> {
        category
            .parse::<Category>()
            .ok()
            .and_then(|c| self.by_category().get(&c))
            .map(|list| list.iter().collect())
            .unwrap_or_default()
    }

    /// Case-insensitive substring search over name, description, tags,
    /// company and sub-category. An empty query returns everything.
    pub fn search_components(&self, query: &str) -> Vec<&ComponentRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.get_all_components();
        }
        self.records().filter(|r| record_matches(r, &needle)).collect()
    }

    pub fn get_component_by_id(&self, id: &str) -> Option<&ComponentRecord> {
        self.get(id)
    }
}

fn record_matches(record: &ComponentRecord, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&record.name)
        || hit(&record.description)
        || record.tags.iter().any(|t| hit(t))
        || hit(&record.company)
        || hit(&record.sub_category)
}

/// Keep records whose company equals `company`. `None` or `"all"` keeps everything.
pub fn filter_by_company<'a>(
    records: Vec<&'a ComponentRecord>,
    company: Option<&str>,
) -> Vec<&'a ComponentRecord> {
    match company {
        None => records,
        Some(c) if c.eq_ignore_ascii_case(ALL_COMPANIES) => records,
        Some(c) => records.into_iter().filter(|r| r.company == c).collect(),
    }
}

/// Stable sort. Numeric and date keys sort descending with unknown values last.
pub fn sort_components(records: &mut [&ComponentRecord], by: SortBy) {
    match by {
        SortBy::Downloads => records.sort_by(|a, b| desc_known_first(a.downloads, b.downloads)),
        SortBy::Alphabetical => {
            records.sort_by_cached_key(|r| r.name.to_lowercase());
        }
        SortBy::Newest => records.sort_by(|a, b| desc_known_first(a.created_at, b.created_at)),
        SortBy::Updated => records.sort_by(|a, b| desc_known_first(a.updated_at, b.updated_at)),
    }
}

fn desc_known_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
