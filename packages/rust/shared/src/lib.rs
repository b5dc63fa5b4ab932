//! Shared types, error model, and configuration for Componentry.
//!
//! This crate is the foundation depended on by all other Componentry crates.
//! It provides:
//! - [`CatalogError`], the unified error type
//! - Domain types ([`Category`], [`ComponentRecord`], [`Collection`], [`ParsedDocument`])
//! - Configuration ([`AppConfig`], [`CollectionSpec`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, CollectionSpec, OutputConfig, PlaceholderPolicy, PredicateField,
    SourceConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CatalogError, Result};
pub use types::{
    BundledComponent, CURRENT_SCHEMA_VERSION, Category, Collection, ComponentRecord, Document,
    DocumentFormat, ParsedDocument, SkippedDocument, SourceDocument,
};
