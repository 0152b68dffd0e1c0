//! # Panelshape - yearly exports to a long panel table
//!
//! Panelshape unions spreadsheet exports whose columns carry a year suffix
//! (`Revenue 2020`, `Employees 2019/2020`) and reshapes them into one record
//! per entity and year.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ XLSX / CSV  │────▶│   Ingest    │────▶│   Reshape   │────▶│ XLSX / CSV  │
//! │  exports    │     │  (union)    │     │ (long form) │     │   / JSON    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use panelshape::{reshape, parse_csv_file_auto};
//!
//! let parsed = parse_csv_file_auto("union.csv")?;
//! let outcome = reshape(&parsed.table, "Company name Latin alphabet")?;
//! println!("{} records", outcome.table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell values, wide and long tables
//! - [`parser`] - CSV parsing with auto-detection
//! - [`xlsx`] - Spreadsheet import and export
//! - [`ingest`] - Source discovery and union
//! - [`transform`] - Column classification, reshape and pipeline
//! - [`export`] - Output writers
//! - [`logs`] - Console, file and broadcast logging

// Core modules
pub mod error;
pub mod models;

// Input
pub mod ingest;
pub mod parser;
pub mod xlsx;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError,
    ParseError,
    PipelineError,
    PipelineResult,
    ReshapeError,
    SpreadsheetError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellValue,
    LongRecord,
    LongTable,
    RecordKey,
    WideTable,
    ENTITY_ID_FIELD,
    YEAR_FIELD,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_str,
    parse_bytes_auto,
    parse_csv_file_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    ParsedCsv,
};

// =============================================================================
// Re-exports - Reshape
// =============================================================================

pub use transform::{
    classify,
    classify_columns,
    find_incomplete_fields,
    reshape,
    ColumnClass,
    FieldConflict,
    MissingEntityKey,
    ReshapeOutcome,
    ReshapeReport,
    Reshaper,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    reshape_table,
    run,
    run_single,
    PipelineOptions,
    PipelineOutput,
    DEFAULT_ENTITY_COLUMN,
};

pub use ingest::{discover_inputs, load_sources, UnionResult};
pub use export::{write_long_table, write_wide_table, OutputFormat};
