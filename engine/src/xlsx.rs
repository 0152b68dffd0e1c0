// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import reads one named sheet into a WideTable: first row = headers.
// Export writes a header row plus typed cells; no styling beyond date formats.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDateTime, Timelike};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::{SpreadsheetError, SpreadsheetResult};
use crate::models::{CellValue, LongTable, WideTable};

/// Sheet read from source exports and written to outputs.
pub const DEFAULT_SHEET: &str = "Results";

/// Excel's hard limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Read `sheet` from a workbook into a table.
pub fn read_sheet(path: &Path, sheet: &str) -> SpreadsheetResult<WideTable> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| SpreadsheetError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if !sheet_names.iter().any(|n| n == sheet) {
        return Err(SpreadsheetError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available: sheet_names.join(", "),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| SpreadsheetError::Read {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            message: e.to_string(),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| header_name(cell))
            .collect(),
        None => return Ok(WideTable::default()),
    };

    let mut table = WideTable::new(headers);
    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(cell_value).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(cells);
    }

    Ok(table)
}

/// Header text exactly as stored; whitespace is significant to classification.
fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_value(other).to_string(),
    }
}

/// Convert a calamine cell.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        // Store as TRUE/FALSE text, the way Excel displays it
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // #N/A, #DIV/0! and friends carry no value
        Data::Error(_) => CellValue::Empty,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::Date(naive),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match CellValue::infer(s) {
            date @ CellValue::Date(_) => date,
            _ => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Write a wide table to `path` as a single sheet.
pub fn write_wide(path: &Path, sheet: &str, table: &WideTable) -> SpreadsheetResult<()> {
    write_rows(path, sheet, table.columns(), table.rows())
}

/// Write a long table to `path` as a single sheet.
pub fn write_long(path: &Path, sheet: &str, table: &LongTable) -> SpreadsheetResult<()> {
    write_rows(path, sheet, &table.columns, &table.to_rows())
}

fn write_rows(
    path: &Path,
    sheet: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> SpreadsheetResult<()> {
    if columns.len() > MAX_COLS {
        return Err(SpreadsheetError::TooLarge(format!("{} columns", columns.len())));
    }
    if rows.len() + 1 > MAX_ROWS {
        return Err(SpreadsheetError::TooLarge(format!("{} rows", rows.len())));
    }

    let write_err = |e: rust_xlsxwriter::XlsxError| SpreadsheetError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).map_err(write_err)?;

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name).map_err(write_err)?;
    }

    // rust_xlsxwriter uses 0-based row/col as u32/u16
    for (r, row) in rows.iter().enumerate() {
        let row32 = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let col16 = c as u16;
            match value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row32, col16, s).map_err(write_err)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row32, col16, *n).map_err(write_err)?;
                }
                CellValue::Date(dt) => {
                    let format = if is_midnight(dt) { &date_format } else { &datetime_format };
                    worksheet
                        .write_datetime_with_format(row32, col16, dt, format)
                        .map_err(write_err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(write_err)?;
    Ok(())
}

fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.time().num_seconds_from_midnight() == 0
}
