//! Locate source exports, read them and union them into one table.
//!
//! Each file's rows are tagged with an `origin` column holding the file name,
//! then all files are concatenated with [`WideTable::union`].

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log, LogEntry};
use crate::models::{CellValue, WideTable};
use crate::parser::parse_csv_file_auto;
use crate::xlsx::read_sheet;

/// Column added to every source row.
pub const ORIGIN_COLUMN: &str = "origin";

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsb", "ods"];

/// Kind of source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Spreadsheet,
    Csv,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Spreadsheet)
        } else if ext == "csv" {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// What was read from one file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Union of all sources
#[derive(Debug, Clone)]
pub struct UnionResult {
    pub table: WideTable,
    pub sources: Vec<SourceSummary>,
}

/// Expand inputs into a list of files.
///
/// Directories contribute every supported file directly inside them, sorted
/// by name; Excel lock files (`~$...`) are skipped. Files are kept as given.
pub fn discover_inputs(inputs: &[PathBuf]) -> PipelineResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .filter(|p| SourceKind::from_path(p).is_some())
                .filter(|p| !file_name(p).starts_with("~$"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

/// Read one source file.
pub fn read_source(path: &Path, sheet: &str) -> PipelineResult<WideTable> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Spreadsheet) => Ok(read_sheet(path, sheet)?),
        Some(SourceKind::Csv) => Ok(parse_csv_file_auto(path)?.table),
        None => Err(PipelineError::UnsupportedInput(path.to_path_buf())),
    }
}

/// Read every file, tag rows with their origin and concatenate.
pub fn load_sources(
    files: &[PathBuf],
    sheet: &str,
    origin_column: &str,
) -> PipelineResult<UnionResult> {
    if files.is_empty() {
        return Err(PipelineError::NoInputs);
    }

    log(LogEntry::info(format!("📖 Reading {} source file(s)...", files.len()))
        .with_field("file_count", files.len()));

    let mut tables = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());

    for path in files {
        log(LogEntry::info(format!("Reading file: {}", path.display()))
            .with_indent(1)
            .with_field("file_path", path.display().to_string()));

        let mut table = read_source(path, sheet)?;
        table.add_constant_column(origin_column, CellValue::Text(file_name(path)));

        sources.push(SourceSummary {
            path: path.clone(),
            rows: table.len(),
            columns: table.columns().len(),
        });
        tables.push(table);
    }

    let table = WideTable::union(tables);
    log(LogEntry::success(format!(
        "Union completed: {} rows, {} columns",
        table.len(),
        table.columns().len()
    ))
    .with_field("total_rows", table.len())
    .with_field("total_columns", table.columns().len()));

    Ok(UnionResult { table, sources })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
