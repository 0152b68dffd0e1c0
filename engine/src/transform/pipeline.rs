//! High-level pipeline API: sources → union → reshape → outputs.
//!
//! This module combines all steps: reading and unioning the source exports,
//! reshaping the union into one record per (entity, year), writing the
//! outputs and logging what was found along the way.
//!
//! # Example
//!
//! ```rust,ignore
//! use panelshape::{run, PipelineOptions};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = run(&[PathBuf::from("data")], &PipelineOptions::default())?;
//!     println!("{} records", output.outcome.table.len());
//!     Ok(())
//! }
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::reshaper::{ReshapeOutcome, ReshapeReport, Reshaper};
use crate::error::PipelineResult;
use crate::export::{write_json_value, write_long_table, write_wide_table};
use crate::ingest::{discover_inputs, load_sources, read_source, SourceSummary, ORIGIN_COLUMN};
use crate::logs::{log, log_info, log_info_indent, log_success, log_warning, LogCollector, LogEntry};
use crate::models::WideTable;
use crate::xlsx::DEFAULT_SHEET;

/// Entity identifier column of the source exports.
pub const DEFAULT_ENTITY_COLUMN: &str = "Company name Latin alphabet";

/// Options for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Column holding the entity identifier
    pub entity_column: String,

    /// Sheet to read from spreadsheet sources and to write outputs to
    pub sheet: String,

    /// Column added to every row with its source file name
    pub origin_column: String,

    /// Write the unioned sources here
    pub union_output: Option<PathBuf>,

    /// Write the reshaped table here
    pub output: Option<PathBuf>,

    /// Write the JSON data-quality report here
    pub report: Option<PathBuf>,

    /// Show a progress bar while reshaping
    pub progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            entity_column: DEFAULT_ENTITY_COLUMN.to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            origin_column: ORIGIN_COLUMN.to_string(),
            union_output: None,
            output: None,
            report: None,
            progress: false,
        }
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Files read, in order
    pub sources: Vec<SourceSummary>,

    /// Row count of the union
    pub union_rows: usize,

    /// Reshaped table and data-quality report
    pub outcome: ReshapeOutcome,

    /// Warnings and errors logged while reading and reshaping
    pub warnings: Vec<LogEntry>,
}

/// JSON report written with `--report`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    entity_column: &'a str,
    sources: &'a [SourceSummary],
    union_rows: usize,
    #[serde(flatten)]
    reshape: &'a ReshapeReport,
    warnings: &'a [LogEntry],
}

/// Run the full pipeline over files and directories.
pub fn run(inputs: &[PathBuf], options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let mut collector = LogCollector::global();
    log(LogEntry::info("🚀 Starting process")
        .with_field("entity_column", options.entity_column.clone()));

    let files = discover_inputs(inputs)?;
    let union = load_sources(&files, &options.sheet, &options.origin_column)?;

    if let Some(ref path) = options.union_output {
        write_wide_table(path, &options.sheet, &union.table)?;
        log_success(format!("💾 Saved unioned table to {}", path.display()));
    }

    let outcome = reshape_table(&union.table, options)?;
    let output = PipelineOutput {
        union_rows: union.table.len(),
        sources: union.sources,
        outcome,
        warnings: collector.drain_problems(),
    };

    write_outputs(&output, options)?;
    log_success("✨ Process completed");
    Ok(output)
}

/// Reshape a single, already-unioned file.
pub fn run_single(input: &Path, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let mut collector = LogCollector::global();
    log(LogEntry::info(format!("📄 Reading {}", input.display()))
        .with_field("file_path", input.display().to_string()));

    let table = read_source(input, &options.sheet)?;
    log_success(format!("Read {} rows, {} columns", table.len(), table.columns().len()));

    let outcome = reshape_table(&table, options)?;
    let output = PipelineOutput {
        sources: vec![SourceSummary {
            path: input.to_path_buf(),
            rows: table.len(),
            columns: table.columns().len(),
        }],
        union_rows: table.len(),
        outcome,
        warnings: collector.drain_problems(),
    };

    write_outputs(&output, options)?;
    log_success("✨ Process completed");
    Ok(output)
}

/// Reshape with progress display and log the findings.
pub fn reshape_table(table: &WideTable, options: &PipelineOptions) -> PipelineResult<ReshapeOutcome> {
    if table.is_empty() {
        log_warning("No data rows to reshape");
    }

    log_info("🔄 Processing unified table...");
    let mut reshaper = Reshaper::new(table.columns(), &options.entity_column)?;
    log_info_indent(
        format!(
            "{} year-scoped columns out of {}",
            reshaper.year_column_count(),
            table.columns().len()
        ),
        1,
    );

    let progress = progress_bar(table.len() as u64, options.progress);
    for (i, row) in table.rows().iter().enumerate() {
        reshaper.push_row(i, row);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let outcome = reshaper.finish();
    print_report(&outcome.report);
    Ok(outcome)
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "   Processing Rows {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Log reshape findings
fn print_report(report: &ReshapeReport) {
    log(LogEntry::success(format!(
        "{} records from {} rows",
        report.records, report.rows_processed
    ))
    .with_field("records", report.records)
    .with_field("rows", report.rows_processed));

    if !report.missing_entity_keys.is_empty() {
        let rows: Vec<String> = report
            .missing_entity_keys
            .iter()
            .take(5)
            .map(|m| m.row.to_string())
            .collect();
        let more = if report.missing_entity_keys.len() > 5 {
            format!("... +{}", report.missing_entity_keys.len() - 5)
        } else {
            String::new()
        };
        log(LogEntry::warning(format!(
            "{} rows without entity key, year values dropped (rows: {}{})",
            report.missing_entity_keys.len(),
            rows.join(", "),
            more
        ))
        .with_field("rows_missing_entity_key", report.missing_entity_keys.len()));
    }

    if report.rows_without_year_data > 0 {
        log_warning(format!(
            "{} rows produced no year record",
            report.rows_without_year_data
        ));
    }

    if !report.conflicts.is_empty() {
        log(LogEntry::warning(format!(
            "{} fields received conflicting values (last value kept)",
            report.conflicts.len()
        ))
        .with_field("conflicts", report.conflicts.len()));
        for conflict in report.conflicts.iter().take(3) {
            let values: Vec<String> = conflict.values.iter().map(|v| v.to_string()).collect();
            log(LogEntry::warning(format!(
                "• {} {}: {}",
                conflict.key,
                conflict.field,
                values.join(" → ")
            ))
            .with_indent(1));
        }
    }

    for collision in &report.reserved_collisions {
        log_warning(format!(
            "Column '{}' maps onto reserved field '{}' for {} (row {}); value ignored",
            collision.column, collision.field, collision.key, collision.row
        ));
    }

    let missing: Vec<&str> = report.incomplete_fields.iter().map(String::as_str).collect();
    if missing.is_empty() {
        log_success("All fields present in every record");
    } else {
        log(LogEntry::info(format!(
            "📋 Columns not present in all files: {}",
            missing.join(", ")
        ))
        .with_field("missing_columns", missing.clone()));
    }
}

fn write_outputs(output: &PipelineOutput, options: &PipelineOptions) -> PipelineResult<()> {
    if let Some(ref path) = options.output {
        write_long_table(path, &options.sheet, &output.outcome.table)?;
        log_success(format!("💾 Saved reshaped table to {}", path.display()));
    }

    if let Some(ref path) = options.report {
        let report = RunReport {
            entity_column: &options.entity_column,
            sources: &output.sources,
            union_rows: output.union_rows,
            reshape: &output.outcome.report,
            warnings: &output.warnings,
        };
        write_json_value(path, &report)?;
        log_success(format!("💾 Saved report to {}", path.display()));
    }

    Ok(())
}
