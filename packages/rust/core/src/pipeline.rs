//! End-to-end `build` pipeline: walk → parse → classify → identify →
//! assemble → derive collections → write artifact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use componentry_artifacts::{ArtifactMeta, CatalogArtifact};
use componentry_discovery::{CategoryPaths, PluginEntry, WalkedPath};
use componentry_shared::{
    AppConfig, CatalogError, Category, Collection, CollectionSpec, ComponentRecord,
    DocumentFormat, Result, SkippedDocument, SourceDocument,
};

use crate::assembler::{self, Catalog};
use crate::collections::derive_collections;
use crate::records::{self, RecordContext};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildCatalogConfig {
    /// Root of the document tree.
    pub root: PathBuf,
    /// Artifact path.
    pub output_path: PathBuf,
    /// Reference recorded in the artifact.
    pub source_ref: String,
    /// Tool version string.
    pub tool_version: String,
    /// Validated `(category, pattern)` pairs in category order.
    pub patterns: Vec<(Category, String)>,
    pub record: RecordContext,
    pub collections: Vec<CollectionSpec>,
    /// Maximum documents processed at once.
    pub concurrency: usize,
}

impl BuildCatalogConfig {
    /// Validate `config` and resolve it into a run configuration.
    pub fn from_app_config(config: &AppConfig, tool_version: impl Into<String>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            root: PathBuf::from(&config.source.root),
            output_path: PathBuf::from(&config.output.path),
            source_ref: config.source.source_ref.clone(),
            tool_version: tool_version.into(),
            patterns: config.source.category_patterns()?,
            record: RecordContext {
                repository_url: config.source.repository_url()?,
                placeholders: config.placeholders,
            },
            collections: config.collections.clone(),
            concurrency: config.output.concurrency.max(1) as usize,
        })
    }
}

/// End-of-run report.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Record count per configured category.
    pub counts: BTreeMap<Category, usize>,
    /// Documents excluded from the catalog, with reasons.
    pub skipped: Vec<SkippedDocument>,
    /// `(collection id, size)` for every derived collection.
    pub collections: Vec<(String, usize)>,
    pub companies: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Catalog and collections produced by a run, before serialization.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub catalog: Catalog,
    pub collections: Vec<Collection>,
    pub summary: RunSummary,
}

/// Result of [`build_catalog`].
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub output: BuildOutput,
    pub artifact: ArtifactMeta,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document is processed or skipped.
    fn document_processed(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_processed(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the pipeline up to collection derivation. Nothing is written.
#[instrument(skip_all, fields(root = %config.root.display()))]
pub async fn assemble_catalog(
    config: &BuildCatalogConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildOutput> {
    let start = Instant::now();

    // --- Phase 1: Walk ---
    progress.phase("Walking source tree");
    let walked = componentry_discovery::walk(&config.root, &config.patterns)?;
    let total = walked.total();
    let mut skipped = walked.skipped;

    // --- Phase 2: Per-document processing ---
    progress.phase("Processing documents");
    let ctx = Arc::new(config.record.clone());
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut processed = 0usize;
    let mut per_category = Vec::with_capacity(walked.categories.len());

    for category_paths in walked.categories {
        let category = category_paths.category;
        let matched = category_paths.paths.len();
        let records = if category.is_manifest_sourced() {
            process_manifests(&config.root, &ctx, category_paths, &mut skipped)?
        } else {
            process_files(
                &ctx,
                &semaphore,
                category_paths,
                &mut skipped,
                &mut processed,
                total,
                progress,
            )
            .await?
        };
        if matched > 0 && records.is_empty() {
            warn!(%category, matched, "no readable documents in category");
        }
        debug!(%category, records = records.len(), "category processed");
        per_category.push((category, records));
    }

    // --- Phase 3: Assemble ---
    progress.phase("Assembling catalog");
    let catalog = assembler::assemble(per_category)?;

    // --- Phase 4: Collections ---
    progress.phase("Deriving collections");
    let collections = derive_collections(&catalog, &config.collections);
    assembler::validate_collections(&catalog, &collections)?;

    let summary = RunSummary {
        counts: catalog.counts(),
        skipped,
        collections: collections
            .iter()
            .map(|c| (c.id.clone(), c.component_ids.len()))
            .collect(),
        companies: catalog.companies().len(),
        elapsed: start.elapsed(),
    };

    info!(
        records = summary.total(),
        skipped = summary.skipped.len(),
        collections = summary.collections.len(),
        companies = summary.companies,
        "catalog build complete"
    );

    Ok(BuildOutput {
        catalog,
        collections,
        summary,
    })
}

/// Run the full pipeline and write the artifact.
///
/// Any fatal error returns before the serializer runs, so no artifact is
/// written for a failed run.
#[instrument(skip_all, fields(root = %config.root.display(), out = %config.output_path.display()))]
pub async fn build_catalog(
    config: &BuildCatalogConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let mut output = assemble_catalog(config, progress).await?;

    progress.phase("Writing artifact");
    let artifact = CatalogArtifact::new(
        output.catalog.by_category().clone(),
        output.collections.clone(),
        output.catalog.companies().iter().cloned().collect(),
        config.source_ref.clone(),
        config.tool_version.clone(),
    );
    let meta = componentry_artifacts::write_artifact(&config.output_path, &artifact)?;

    output.summary.elapsed = start.elapsed();
    progress.done(&output.summary);

    info!(
        run_id = %artifact.run_id,
        path = %meta.path.display(),
        elapsed_ms = output.summary.elapsed.as_millis() as u64,
        "build pipeline complete"
    );

    Ok(BuildResult {
        output,
        artifact: meta,
    })
}

// ---------------------------------------------------------------------------
// File-sourced categories
// ---------------------------------------------------------------------------

/// Process every walked file of one category on bounded tokio tasks.
/// Results are collected in walker order.
async fn process_files(
    ctx: &Arc<RecordContext>,
    semaphore: &Arc<Semaphore>,
    category_paths: CategoryPaths,
    skipped: &mut Vec<SkippedDocument>,
    processed: &mut usize,
    total: usize,
    progress: &dyn ProgressReporter,
) -> Result<Vec<ComponentRecord>> {
    let category = category_paths.category;
    let mut handles = Vec::with_capacity(category_paths.paths.len());

    for walked in category_paths.paths {
        let relative = walked.relative.clone();
        let ctx = ctx.clone();
        let sem = semaphore.clone();

        handles.push((
            relative,
            tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| CatalogError::config(format!("worker pool closed: {e}")))?;
                process_document(&ctx, category, &walked).await
            }),
        ));
    }

    let mut records = Vec::with_capacity(handles.len());
    for (relative, handle) in handles {
        match handle.await {
            Ok(Ok(record)) => records.push(record),
            Ok(Err(e)) if e.is_fatal() => return Err(e),
            Ok(Err(e)) => {
                warn!(path = %relative, error = %e, "skipping document");
                skipped.push(SkippedDocument {
                    path: relative.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                warn!(path = %relative, error = %e, "document task failed");
                skipped.push(SkippedDocument {
                    path: relative.clone(),
                    reason: format!("task failed: {e}"),
                });
            }
        }
        *processed += 1;
        progress.document_processed(&relative, *processed, total);
    }

    Ok(records)
}

/// Read, parse, classify and identify one file.
async fn process_document(
    ctx: &RecordContext,
    category: Category,
    walked: &WalkedPath,
) -> Result<ComponentRecord> {
    let format = DocumentFormat::from_path(&walked.path).ok_or_else(|| {
        CatalogError::parse(&walked.relative, "unsupported document format")
    })?;

    let raw_content = tokio::fs::read(&walked.path)
        .await
        .map_err(|e| CatalogError::io(&walked.path, e))?;

    let doc = SourceDocument {
        path: walked.relative.clone(),
        raw_content,
        format,
    };
    let parsed = componentry_markdown::parse(&doc)?;

    Ok(records::file_record(ctx, category, walked, &parsed))
}

// ---------------------------------------------------------------------------
// Manifest-sourced categories
// ---------------------------------------------------------------------------

/// One record per plugin entry. A missing or malformed manifest is fatal;
/// an entry without a name is skipped.
fn process_manifests(
    root: &Path,
    ctx: &RecordContext,
    category_paths: CategoryPaths,
    skipped: &mut Vec<SkippedDocument>,
) -> Result<Vec<ComponentRecord>> {
    if category_paths.paths.is_empty() {
        return Err(CatalogError::MissingManifest {
            path: root.join(&category_paths.pattern),
        });
    }

    let mut records = Vec::new();
    for walked in &category_paths.paths {
        let manifest = componentry_discovery::read_manifest(&walked.path)?;

        for (index, value) in manifest.plugins.iter().enumerate() {
            match PluginEntry::from_value(value, index) {
                Ok(entry) => records.push(records::plugin_record(ctx, &walked.relative, &entry)),
                Err(reason) => {
                    warn!(path = %walked.relative, index, %reason, "skipping plugin entry");
                    skipped.push(SkippedDocument {
                        path: format!("{}#plugins[{index}]", walked.relative),
                        reason,
                    });
                }
            }
        }

        info!(
            path = %walked.relative,
            marketplace = manifest.name.as_deref().unwrap_or("unnamed"),
            plugins = records.len(),
            "plugin manifest processed"
        );
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
