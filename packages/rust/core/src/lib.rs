//! Core pipeline and domain logic for Componentry.
//!
//! Turns walked source documents into classified, identified records,
//! assembles them into a [`Catalog`](assembler::Catalog), derives
//! collections, and answers read-only queries over the result.

pub mod assembler;
pub mod classifier;
pub mod collections;
pub mod identifier;
pub mod pipeline;
pub mod placeholders;
pub mod query;
pub mod records;

pub use assembler::Catalog;
pub use query::{SortBy, filter_by_company, sort_components};
