//! Transformation module.
//!
//! This module handles the wide to long reshape:
//! - Classifier: column name → invariant or (year, base name)
//! - Decomposer: one wide row → invariant fields + per-year partials
//! - Merger: partials → one record per (entity, year)
//! - Aggregator: merged records → sorted long table
//! - Completeness: fields missing from some records
//! - Reshaper: drives the steps above over a table
//! - Pipeline: sources → union → reshape → outputs

pub mod aggregator;
pub mod classifier;
pub mod completeness;
pub mod decomposer;
pub mod merger;
pub mod pipeline;
pub mod reshaper;

pub use classifier::{classify, classify_columns, ColumnClass};
pub use completeness::find_incomplete_fields;
pub use decomposer::{decompose, ReservedFieldCollision, RowDecomposition};
pub use merger::{merge, FieldConflict, RecordMerger};
pub use pipeline::*;
pub use reshaper::{reshape, MissingEntityKey, ReshapeOutcome, ReshapeReport, Reshaper};
