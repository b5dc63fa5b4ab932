//! Error types for Componentry.
//!
//! Library crates use [`CatalogError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Errors fall into two classes. Per-document errors ([`CatalogError::Parse`],
//! [`CatalogError::Io`]) exclude a single document and the run continues.
//! Everything else is structural and aborts the run before any artifact is
//! written; see [`CatalogError::is_fatal`].

use std::path::PathBuf;

/// Top-level error type for all Componentry operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A category name in the pattern map is not part of the closed category set.
    #[error("config error: unknown category '{name}'")]
    UnknownCategory { name: String },

    /// Two documents produced the same component id.
    #[error("duplicate component id '{id}' (from {first} and {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    /// A manifest-sourced category has no manifest on disk.
    #[error("missing manifest at {path:?}")]
    MissingManifest { path: PathBuf },

    /// A single document failed format-specific parsing.
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Artifact validation error (schema mismatch, dangling reference, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Artifact serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error for the document at `path`.
    pub fn parse(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run.
    ///
    /// Parse and per-file I/O errors are isolated to one document.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. } | Self::Io { .. })
    }
}
