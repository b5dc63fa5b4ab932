//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use componentry_core::pipeline::{BuildCatalogConfig, ProgressReporter, RunSummary};
use componentry_core::{Catalog, SortBy, filter_by_company, sort_components};
use componentry_shared::{
    AppConfig, CONFIG_FILE_NAME, ComponentRecord, config_file_path, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Componentry: catalog agents, commands, hooks, MCPs, skills and plugins.
#[derive(Parser)]
#[command(
    name = "componentry",
    version,
    about = "Build a searchable component catalog from a document tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./componentry.toml, then ~/.componentry/componentry.toml).
    #[arg(long, global = true, env = "COMPONENTRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Walk the source tree and write the catalog artifact.
    Build {
        /// Root of the document tree.
        #[arg(long)]
        root: Option<String>,

        /// Artifact output path.
        #[arg(short, long)]
        out: Option<String>,

        /// Source revision recorded in the artifact.
        #[arg(long)]
        source_ref: Option<String>,
    },

    /// List components from a built artifact.
    List {
        /// Only this category (agents, commands, hooks, ...).
        #[arg(short, long)]
        category: Option<String>,

        /// Only this company ("all" disables the filter).
        #[arg(long)]
        company: Option<String>,

        /// Sort order: downloads, alphabetical, newest, updated.
        #[arg(short, long)]
        sort: Option<String>,

        /// Artifact path (defaults to the configured output path).
        #[arg(long)]
        artifact: Option<String>,
    },

    /// Search components by name, description, tag, company or sub-category.
    Search {
        /// Search text (case-insensitive).
        query: String,

        #[arg(long)]
        artifact: Option<String>,
    },

    /// Show one component as JSON.
    Show {
        /// Component id.
        id: String,

        #[arg(long)]
        artifact: Option<String>,
    },

    /// List derived collections.
    Collections {
        #[arg(long)]
        artifact: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Write to ./componentry.toml instead of the user config directory.
        #[arg(long)]
        local: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "componentry=info",
        1 => "componentry=debug",
        _ => "componentry=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Build {
            root,
            out,
            source_ref,
        } => {
            let mut config = resolve_config(config_path.as_deref())?;
            apply_overrides(&mut config, root, out, source_ref);
            cmd_build(&config).await
        }
        Command::List {
            category,
            company,
            sort,
            artifact,
        } => {
            let catalog = open_catalog(config_path.as_deref(), artifact.as_deref())?;
            cmd_list(&catalog, category.as_deref(), company.as_deref(), sort.as_deref())
        }
        Command::Search { query, artifact } => {
            let catalog = open_catalog(config_path.as_deref(), artifact.as_deref())?;
            cmd_search(&catalog, &query)
        }
        Command::Show { id, artifact } => {
            let catalog = open_catalog(config_path.as_deref(), artifact.as_deref())?;
            cmd_show(&catalog, &id)
        }
        Command::Collections { artifact } => {
            cmd_collections(config_path.as_deref(), artifact.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Init { local } => cmd_config_init(local),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// `--config` file if given, else the default lookup.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply command-line overrides on top of file values.
fn apply_overrides(
    config: &mut AppConfig,
    root: Option<String>,
    out: Option<String>,
    source_ref: Option<String>,
) {
    if let Some(root) = root {
        config.source.root = root;
    }
    if let Some(out) = out {
        config.output.path = out;
    }
    if let Some(source_ref) = source_ref {
        config.source.source_ref = source_ref;
    }
}

fn artifact_path(config_path: Option<&Path>, artifact: Option<&str>) -> Result<PathBuf> {
    match artifact {
        Some(p) => Ok(PathBuf::from(p)),
        None => Ok(PathBuf::from(resolve_config(config_path)?.output.path)),
    }
}

fn open_catalog(config_path: Option<&Path>, artifact: Option<&str>) -> Result<Catalog> {
    let path = artifact_path(config_path, artifact)?;
    let artifact = componentry_artifacts::read_artifact(&path)
        .map_err(|e| eyre!("cannot load catalog from '{}': {e}", path.display()))?;
    Ok(Catalog::from_artifact(&artifact)?)
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

async fn cmd_build(config: &AppConfig) -> Result<()> {
    let build_config = BuildCatalogConfig::from_app_config(config, env!("CARGO_PKG_VERSION"))?;

    info!(
        root = %build_config.root.display(),
        out = %build_config.output_path.display(),
        source_ref = %build_config.source_ref,
        "building catalog"
    );

    let reporter = CliProgress::new();
    let result = match componentry_core::pipeline::build_catalog(&build_config, &reporter).await {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(eyre!("catalog build failed: {e}"));
        }
    };

    print_summary(&result.output.summary);
    println!("  Artifact: {}", result.artifact.path.display());
    println!("  SHA-256:  {}", result.artifact.sha256);
    println!();

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Catalog built: {} components", summary.total());
    for (category, count) in &summary.counts {
        println!("    {:<10} {count}", category.as_str());
    }
    println!("  Companies: {}", summary.companies);
    if !summary.collections.is_empty() {
        println!("  Collections:");
        for (id, size) in &summary.collections {
            println!("    {id:<22} {size}");
        }
    }
    if !summary.skipped.is_empty() {
        println!("  Skipped: {}", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("    {}: {}", skipped.path, skipped.reason);
        }
    }
    println!("  Time: {:.1}s", summary.elapsed.as_secs_f64());
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_processed(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {path}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn cmd_list(
    catalog: &Catalog,
    category: Option<&str>,
    company: Option<&str>,
    sort: Option<&str>,
) -> Result<()> {
    let records = match category {
        Some(c) => catalog.get_components_by_category(c),
        None => catalog.get_all_components(),
    };
    let mut records = filter_by_company(records, company);
    if let Some(sort) = sort {
        let by: SortBy = sort.parse()?;
        sort_components(&mut records, by);
    }

    print_records(&records);
    Ok(())
}

fn cmd_search(catalog: &Catalog, query: &str) -> Result<()> {
    let records = catalog.search_components(query);
    info!(query, hits = records.len(), "search complete");
    print_records(&records);
    Ok(())
}

fn cmd_show(catalog: &Catalog, id: &str) -> Result<()> {
    let record = catalog
        .get_component_by_id(id)
        .ok_or_else(|| eyre!("no component with id '{id}'"))?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn cmd_collections(config_path: Option<&Path>, artifact: Option<&str>) -> Result<()> {
    let path = artifact_path(config_path, artifact)?;
    let artifact = componentry_artifacts::read_artifact(&path)
        .map_err(|e| eyre!("cannot load catalog from '{}': {e}", path.display()))?;
    let catalog = Catalog::from_artifact(&artifact)?;

    for collection in &artifact.collections {
        println!("{} ({}): {}", collection.name, collection.id, collection.description);
        for id in &collection.component_ids {
            let name = catalog.get(id).map(|r| r.name.as_str()).unwrap_or("?");
            println!("    {id:<40} {name}");
        }
    }
    Ok(())
}

fn print_records(records: &[&ComponentRecord]) {
    for r in records {
        let downloads = r
            .downloads
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{} {:<45} {:<28} {:<12} {downloads:>6}",
            r.icon, r.id, r.name, r.company
        );
    }
    println!("{} component(s)", records.len());
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init(local: bool) -> Result<()> {
    let target = if local {
        PathBuf::from(CONFIG_FILE_NAME)
    } else {
        config_file_path()?
    };
    if target.exists() {
        return Err(eyre!("config already exists at '{}'", target.display()));
    }
    let path = init_config(&target)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    config.validate()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
