//! Error types for the panelshape pipeline.
//!
//! This module defines one error enum per layer:
//!
//! - [`ParseError`] - CSV reading errors
//! - [`SpreadsheetError`] - Excel/ODS reading and `.xlsx` writing errors
//! - [`ExportError`] - CSV/JSON output errors
//! - [`ReshapeError`] - Contract violations detected by the reshape engine
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Data-quality issues (rows without an entity key, ragged field coverage,
//! conflicting values) are never errors: they are reported in
//! [`crate::transform::ReshapeOutcome`].

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a CSV source.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Spreadsheet Errors
// =============================================================================

/// Errors while reading or writing spreadsheet workbooks.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// Workbook could not be opened.
    #[error("Failed to open workbook '{path}': {message}")]
    Open { path: PathBuf, message: String },

    /// Requested sheet is not in the workbook.
    #[error("Sheet '{sheet}' not found in '{path}' (available: {available})")]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: String,
    },

    /// Sheet exists but could not be read.
    #[error("Failed to read sheet '{sheet}' in '{path}': {message}")]
    Read {
        path: PathBuf,
        sheet: String,
        message: String,
    },

    /// Writing the output workbook failed.
    #[error("Failed to write workbook '{path}': {message}")]
    Write { path: PathBuf, message: String },

    /// The table does not fit in a worksheet.
    #[error("Table too large for a worksheet: {0}")]
    TooLarge(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing CSV or JSON output.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook output.
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    /// Output extension not recognized.
    #[error("Unsupported output format '{0}' (expected .xlsx, .csv or .json)")]
    UnsupportedFormat(String),
}

// =============================================================================
// Reshape Errors
// =============================================================================

/// Programmer-contract violations detected by the reshape engine.
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// The entity identifier column is not part of the table schema.
    #[error("Entity column '{column}' not found (columns: {available})")]
    MissingEntityColumn { column: String, available: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Parse(#[from] ParseError),

    /// Spreadsheet error.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] SpreadsheetError),

    /// Output error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Reshape contract violation.
    #[error("Reshape error: {0}")]
    Reshape(#[from] ReshapeError),

    /// IO error outside of a specific reader/writer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No source files were found.
    #[error("No input files found")]
    NoInputs,

    /// Input file type is not supported.
    #[error("Unsupported input file '{0}' (expected .xlsx, .xls, .xlsb, .ods or .csv)")]
    UnsupportedInput(PathBuf),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for spreadsheet operations.
pub type SpreadsheetResult<T> = Result<T, SpreadsheetError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> PipelineError
        let parse_err = ParseError::EmptyFile;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // ReshapeError -> PipelineError
        let reshape_err = ReshapeError::MissingEntityColumn {
            column: "Company".into(),
            available: "Name, origin".into(),
        };
        let pipeline_err: PipelineError = reshape_err.into();
        assert!(pipeline_err.to_string().contains("Company"));
    }

    #[test]
    fn test_sheet_not_found_format() {
        let err = SpreadsheetError::SheetNotFound {
            path: PathBuf::from("data/export.xlsx"),
            sheet: "Results".into(),
            available: "Sheet1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Results"));
        assert!(msg.contains("export.xlsx"));
        assert!(msg.contains("Sheet1"));
    }

    #[test]
    fn test_spreadsheet_error_through_export() {
        let err: ExportError = SpreadsheetError::TooLarge("70000 columns".into()).into();
        let pipeline_err: PipelineError = err.into();
        assert!(pipeline_err.to_string().contains("70000 columns"));
    }
}
