//! Source tree walker.
//!
//! Expands one glob pattern per category against the source root and returns
//! the matching document paths in lexicographic order. Entries the glob walk
//! cannot read are logged and reported as skipped; a single bad entry never
//! aborts the walk. The `plugins` category is manifest-sourced: its pattern
//! names a single manifest file, read with [`read_manifest`].

mod manifest;

use std::path::{Path, PathBuf};

use componentry_shared::{CatalogError, Category, Result, SkippedDocument};
use tracing::{debug, info, instrument, warn};

pub use manifest::{PluginEntry, PluginManifest, read_manifest};

/// Characters that start a glob wildcard.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

// ---------------------------------------------------------------------------
// Walk result
// ---------------------------------------------------------------------------

/// One document path found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedPath {
    /// Absolute (root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the source root, `/`-separated.
    pub relative: String,
    /// Literal directory prefix of the pattern (before the first wildcard).
    pub base: String,
}

/// Paths found for one category.
#[derive(Debug, Clone)]
pub struct CategoryPaths {
    pub category: Category,
    pub pattern: String,
    pub paths: Vec<WalkedPath>,
}

/// Outcome of walking every configured category.
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    /// Per-category paths, in category declaration order.
    pub categories: Vec<CategoryPaths>,
    /// Entries that could not be read during the walk.
    pub skipped: Vec<SkippedDocument>,
}

impl WalkResult {
    /// Total number of paths across all categories.
    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.paths.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Walk the source tree under `root` for each `(category, pattern)` pair.
///
/// An invalid glob pattern is a configuration error and aborts the walk.
/// Patterns that match nothing produce an empty category and a warning.
#[instrument(skip_all, fields(root = %root.display(), categories = patterns.len()))]
pub fn walk(root: &Path, patterns: &[(Category, String)]) -> Result<WalkResult> {
    let mut result = WalkResult::default();

    let mut ordered: Vec<&(Category, String)> = patterns.iter().collect();
    ordered.sort_by_key(|(category, _)| *category);

    for (category, pattern) in ordered {
        let paths = walk_pattern(root, pattern, &mut result.skipped)?;

        if paths.is_empty() {
            warn!(%category, pattern, "pattern matched no readable files");
        } else {
            debug!(%category, pattern, count = paths.len(), "category walked");
        }

        result.categories.push(CategoryPaths {
            category: *category,
            pattern: pattern.clone(),
            paths,
        });
    }

    info!(
        documents = result.total(),
        skipped = result.skipped.len(),
        "source tree walk complete"
    );

    Ok(result)
}

/// Expand one pattern, returning matching files sorted by relative path.
fn walk_pattern(
    root: &Path,
    pattern: &str,
    skipped: &mut Vec<SkippedDocument>,
) -> Result<Vec<WalkedPath>> {
    let root_str = root.to_string_lossy();
    let escaped_root = glob::Pattern::escape(root_str.trim_end_matches('/'));
    let full_pattern = format!("{escaped_root}/{}", pattern.trim_start_matches('/'));

    let entries = glob::glob(&full_pattern).map_err(|e| {
        CatalogError::config(format!("invalid pattern '{pattern}': {e}"))
    })?;

    let base = pattern_base(pattern);
    let mut paths = Vec::new();

    for entry in entries {
        match entry {
            Ok(path) => {
                let relative = relative_path(root, &path);
                match std::fs::metadata(&path) {
                    Ok(meta) if meta.is_dir() => continue,
                    Ok(_) => {}
                    Err(e) => {
                        // Dangling symlinks land here.
                        warn!(path = %relative, error = %e, "unreadable entry, skipping");
                        skipped.push(SkippedDocument {
                            path: relative,
                            reason: format!("unreadable: {e}"),
                        });
                        continue;
                    }
                }
                paths.push(WalkedPath {
                    path,
                    relative,
                    base: base.clone(),
                });
            }
            Err(e) => {
                let relative = relative_path(root, e.path());
                warn!(path = %relative, error = %e.error(), "unreadable entry, skipping");
                skipped.push(SkippedDocument {
                    path: relative,
                    reason: format!("unreadable: {}", e.error()),
                });
            }
        }
    }

    paths.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(paths)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Literal directory prefix of a glob pattern.
///
/// `components/agents/**/*.md` → `components/agents`. A pattern without
/// wildcards names a single file, whose parent directory is the base.
pub fn pattern_base(pattern: &str) -> String {
    let segments: Vec<&str> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let literal: Vec<&str> = match segments.iter().position(|s| s.contains(GLOB_META)) {
        Some(idx) => segments[..idx].to_vec(),
        None => segments[..segments.len().saturating_sub(1)].to_vec(),
    };

    literal.join("/")
}

/// Path relative to `root`, always `/`-separated.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_tree(files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "componentry-walk-test-{}",
            uuid::Uuid::now_v7()
        ));
        for file in files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "content").unwrap();
        }
        dir
    }

    #[test]
    fn pattern_base_strips_wildcards() {
        assert_eq!(pattern_base("components/agents/**/*.md"), "components/agents");
        assert_eq!(pattern_base("commands/*.md"), "commands");
        assert_eq!(pattern_base("**/*.json"), "");
        assert_eq!(pattern_base(".claude-plugin/marketplace.json"), ".claude-plugin");
        assert_eq!(pattern_base("/skills/**/SKILL.md"), "skills");
    }

    #[test]
    fn walk_returns_sorted_paths_per_category() {
        let root = temp_tree(&[
            "commands/zeta/z.md",
            "commands/automation/foo-bar.md",
            "commands/automation/alpha.md",
            "commands/notes.txt",
            "agents/a.md",
        ]);

        let patterns = vec![
            (Category::Commands, "commands/**/*.md".to_string()),
            (Category::Agents, "agents/**/*.md".to_string()),
        ];
        let result = walk(&root, &patterns).unwrap();

        // Category declaration order, not config order.
        assert_eq!(result.categories[0].category, Category::Agents);
        assert_eq!(result.categories[1].category, Category::Commands);

        let commands: Vec<&str> = result.categories[1]
            .paths
            .iter()
            .map(|p| p.relative.as_str())
            .collect();
        assert_eq!(
            commands,
            vec![
                "commands/automation/alpha.md",
                "commands/automation/foo-bar.md",
                "commands/zeta/z.md",
            ]
        );
        assert_eq!(result.categories[1].paths[0].base, "commands");
        assert_eq!(result.total(), 4);
        assert!(result.skipped.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn walk_empty_category_is_not_an_error() {
        let root = temp_tree(&["agents/a.md"]);
        let patterns = vec![(Category::Hooks, "hooks/**/*.json".to_string())];

        let result = walk(&root, &patterns).unwrap();
        assert_eq!(result.categories.len(), 1);
        assert!(result.categories[0].paths.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn walk_invalid_pattern_is_fatal() {
        let root = temp_tree(&["agents/a.md"]);
        let patterns = vec![(Category::Agents, "agents/[".to_string())];

        let err = walk(&root, &patterns).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("invalid pattern"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn walk_reports_dangling_symlink_as_skipped() {
        let root = temp_tree(&["agents/a.md"]);
        std::os::unix::fs::symlink(root.join("agents/missing.md"), root.join("agents/b.md"))
            .unwrap();
        let patterns = vec![(Category::Agents, "agents/**/*.md".to_string())];

        let result = walk(&root, &patterns).unwrap();
        let paths: Vec<&str> = result.categories[0]
            .paths
            .iter()
            .map(|p| p.relative.as_str())
            .collect();
        assert_eq!(paths, vec!["agents/a.md"]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, "agents/b.md");
        assert!(result.skipped[0].reason.starts_with("unreadable"));

        let _ = std::fs::remove_dir_all(&root);
    }
}
