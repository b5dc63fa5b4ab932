//! Catalog artifact serializer.
//!
//! One self-contained JSON document holds every record, the derived
//! collections, the company list and run metadata. Writes are
//! all-or-nothing: the artifact is serialized in memory, written to a
//! temp file beside the target and renamed into place. A `.sha256`
//! sidecar is written after the rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use componentry_shared::{
    CURRENT_SCHEMA_VERSION, CatalogError, Category, Collection, ComponentRecord, Result,
};

/// The serialized catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogArtifact {
    pub schema_version: u32,
    pub tool_version: String,
    /// Unique per build (UUID v7).
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Revision or label of the source tree.
    pub source_ref: String,
    /// Record count per category.
    pub counts: BTreeMap<Category, usize>,
    pub by_category: BTreeMap<Category, Vec<ComponentRecord>>,
    pub collections: Vec<Collection>,
    /// Distinct companies, sorted.
    pub companies: Vec<String>,
}

impl CatalogArtifact {
    /// New artifact stamped with a fresh run id and the current time.
    pub fn new(
        by_category: BTreeMap<Category, Vec<ComponentRecord>>,
        collections: Vec<Collection>,
        companies: Vec<String>,
        source_ref: impl Into<String>,
        tool_version: impl Into<String>,
    ) -> Self {
        let counts = by_category
            .iter()
            .map(|(category, records)| (*category, records.len()))
            .collect();

        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tool_version: tool_version.into(),
            run_id: Uuid::now_v7().to_string(),
            generated_at: Utc::now(),
            source_ref: source_ref.into(),
            counts,
            by_category,
            collections,
            companies,
        }
    }

    /// Total number of records.
    pub fn total(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }
}

/// Metadata for a written artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Path of the checksum sidecar for `path` (`catalog.json` → `catalog.json.sha256`).
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".sha256");
    path.with_file_name(name)
}

/// Write `artifact` and its checksum sidecar.
///
/// Both are staged as temp files first. The old sidecar is removed before
/// the artifact is swapped in, so a failed run never leaves the new
/// artifact beside a stale checksum. Temp files are removed on failure.
#[instrument(skip_all, fields(path = %path.display(), records = artifact.total()))]
pub fn write_artifact(path: &Path, artifact: &CatalogArtifact) -> Result<ArtifactMeta> {
    let json = serde_json::to_string_pretty(artifact)
        .map_err(|e| CatalogError::Serialization(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| CatalogError::config(format!("artifact path {} has no file name", path.display())))?
        .to_string_lossy()
        .into_owned();
    let hash = sha256_hex(json.as_bytes());
    let sidecar = checksum_path(path);

    let temp = path.with_file_name(format!(".{file_name}.tmp"));
    let sidecar_temp = path.with_file_name(format!(".{file_name}.sha256.tmp"));

    let staged = stage(&temp, json.as_bytes())
        .and_then(|()| stage(&sidecar_temp, format!("{hash}  {file_name}\n").as_bytes()))
        .and_then(|()| remove_if_present(&sidecar))
        .and_then(|()| std::fs::rename(&temp, path).map_err(|e| CatalogError::io(path, e)))
        .and_then(|()| {
            std::fs::rename(&sidecar_temp, &sidecar).map_err(|e| CatalogError::io(&sidecar, e))
        });
    if let Err(e) = staged {
        let _ = std::fs::remove_file(&temp);
        let _ = std::fs::remove_file(&sidecar_temp);
        return Err(e);
    }

    debug!(sidecar = %sidecar.display(), "wrote checksum");
    info!(size = json.len(), sha256 = %hash, "artifact written");

    Ok(ArtifactMeta {
        path: path.to_path_buf(),
        sha256: hash,
        size_bytes: json.len(),
    })
}

fn stage(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| CatalogError::io(path, e))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(CatalogError::io(path, e)),
        _ => Ok(()),
    }
}

/// Load an artifact and check its schema version.
///
/// When a checksum sidecar exists, the content must match it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_artifact(path: &Path) -> Result<CatalogArtifact> {
    let content = std::fs::read(path).map_err(|e| CatalogError::io(path, e))?;

    let sidecar = checksum_path(path);
    if sidecar.exists() {
        let recorded = std::fs::read_to_string(&sidecar).map_err(|e| CatalogError::io(&sidecar, e))?;
        let expected = recorded.split_whitespace().next().unwrap_or_default();
        let actual = sha256_hex(&content);
        if expected != actual {
            return Err(CatalogError::validation(format!(
                "checksum mismatch for {}: expected {expected}, found {actual}",
                path.display()
            )));
        }
    }

    let artifact: CatalogArtifact = serde_json::from_slice(&content)
        .map_err(|e| CatalogError::Serialization(format!("{}: {e}", path.display())))?;

    if artifact.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(CatalogError::validation(format!(
            "unsupported schema version {} (expected {CURRENT_SCHEMA_VERSION})",
            artifact.schema_version
        )));
    }

    debug!(records = artifact.total(), run_id = %artifact.run_id, "artifact loaded");
    Ok(artifact)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join("componentry-test")
            .join(uuid::Uuid::now_v7().to_string());
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_artifact() -> CatalogArtifact {
        let record = ComponentRecord {
            id: "agents-general-reviewer".into(),
            name: "Reviewer".into(),
            icon: "🤖".into(),
            description: "Reviews code".into(),
            category: Category::Agents,
            sub_category: "general".into(),
            company: "Community".into(),
            tags: vec!["general".into()],
            file_path: "agents/reviewer.md".into(),
            created_at: None,
            updated_at: None,
            downloads: None,
            version: None,
            author: None,
            source_url: None,
            bundled_components: None,
        };
        let mut by_category = BTreeMap::new();
        by_category.insert(Category::Agents, vec![record]);
        by_category.insert(Category::Hooks, vec![]);

        CatalogArtifact::new(
            by_category,
            vec![],
            vec!["Community".into()],
            "local",
            "0.1.0",
        )
    }

    #[test]
    fn new_fills_run_metadata() {
        let a = make_artifact();
        let b = make_artifact();
        assert_eq!(a.schema_version, CURRENT_SCHEMA_VERSION);
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.counts[&Category::Agents], 1);
        assert_eq!(a.counts[&Category::Hooks], 0);
        assert_eq!(a.total(), 1);
    }

    #[test]
    fn write_then_read() {
        let tmp = temp_dir();
        let path = tmp.join("out").join("catalog.json");
        let artifact = make_artifact();

        let meta = write_artifact(&path, &artifact).unwrap();
        assert_eq!(meta.sha256.len(), 64);
        assert!(meta.size_bytes > 0);
        assert!(path.exists());

        let sidecar = std::fs::read_to_string(checksum_path(&path)).unwrap();
        assert!(sidecar.starts_with(&meta.sha256));
        assert!(sidecar.trim_end().ends_with("catalog.json"));

        let loaded = read_artifact(&path).unwrap();
        assert_eq!(loaded, artifact);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn serialized_shape_uses_camel_case_and_nulls() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        write_artifact(&path, &make_artifact()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["byCategory"]["agents"].is_array());
        assert!(value["generatedAt"].is_string());
        assert_eq!(value["sourceRef"], "local");
        let record = &value["byCategory"]["agents"][0];
        assert_eq!(record["subCategory"], "general");
        assert!(record["downloads"].is_null());
        assert!(record["createdAt"].is_null());
        assert!(record.get("version").is_none());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        write_artifact(&path, &make_artifact()).unwrap();
        write_artifact(&path, &make_artifact()).unwrap();

        for entry in std::fs::read_dir(&tmp).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_rejects_schema_mismatch() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        let mut artifact = make_artifact();
        artifact.schema_version = CURRENT_SCHEMA_VERSION + 1;
        write_artifact(&path, &artifact).unwrap();

        let err = read_artifact(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_rejects_tampered_content() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        write_artifact(&path, &make_artifact()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("Reviews code", "Edited")).unwrap();

        let err = read_artifact(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let tmp = temp_dir();
        let err = read_artifact(&tmp.join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn checksum_path_appends_suffix() {
        assert_eq!(
            checksum_path(Path::new("dist/catalog.json")),
            PathBuf::from("dist/catalog.json.sha256")
        );
    }

    #[test]
    fn failed_sidecar_swap_leaves_no_artifact() {
        let dir = temp_dir();
        let path = dir.join("catalog.json");
        // A directory where the sidecar belongs cannot be replaced.
        std::fs::create_dir_all(checksum_path(&path)).unwrap();

        let err = write_artifact(&path, &make_artifact()).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(!path.exists());
        assert!(!dir.join(".catalog.json.tmp").exists());
        assert!(!dir.join(".catalog.json.sha256.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rewrite_replaces_artifact_and_sidecar_together() {
        let dir = temp_dir();
        let path = dir.join("catalog.json");
        let first = write_artifact(&path, &make_artifact()).unwrap();
        let second_artifact = make_artifact();
        let second = write_artifact(&path, &second_artifact).unwrap();

        assert_ne!(first.sha256, second.sha256);
        let recorded = std::fs::read_to_string(checksum_path(&path)).unwrap();
        assert!(recorded.starts_with(&second.sha256));
        assert_eq!(read_artifact(&path).unwrap().run_id, second_artifact.run_id);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
