//! Write tables to disk, choosing the format from the file extension.
//!
//! - `.xlsx` - one sheet, typed cells
//! - `.csv`  - header row, display form of each cell
//! - `.json` - array of objects, `null` for absent fields

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::models::{CellValue, LongTable, WideTable};
use crate::xlsx;

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Write the reshaped table.
pub fn write_long_table(path: &Path, sheet: &str, table: &LongTable) -> ExportResult<()> {
    ensure_parent(path)?;
    match OutputFormat::from_path(path)? {
        OutputFormat::Xlsx => xlsx::write_long(path, sheet, table)?,
        OutputFormat::Csv => write_csv(path, &table.columns, &table.to_rows())?,
        OutputFormat::Json => write_json(path, &table.columns, &table.to_rows())?,
    }
    Ok(())
}

/// Write the merged source table.
pub fn write_wide_table(path: &Path, sheet: &str, table: &WideTable) -> ExportResult<()> {
    ensure_parent(path)?;
    match OutputFormat::from_path(path)? {
        OutputFormat::Xlsx => xlsx::write_wide(path, sheet, table)?,
        OutputFormat::Csv => write_csv(path, table.columns(), table.rows())?,
        OutputFormat::Json => write_json(path, table.columns(), table.rows())?,
    }
    Ok(())
}

/// Serialize any value as pretty JSON.
pub fn write_json_value<T: serde::Serialize>(path: &Path, value: &T) -> ExportResult<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Rows as JSON objects keyed by column name.
pub fn rows_to_json(columns: &[String], rows: &[Vec<CellValue>]) -> ExportResult<Vec<Value>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut obj = Map::new();
        for (column, value) in columns.iter().zip(row) {
            obj.insert(column.clone(), serde_json::to_value(value)?);
        }
        out.push(Value::Object(obj));
    }
    Ok(out)
}

fn write_json(path: &Path, columns: &[String], rows: &[Vec<CellValue>]) -> ExportResult<()> {
    let records = rows_to_json(columns, rows)?;
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json)?;
    Ok(())
}

fn write_csv(path: &Path, columns: &[String], rows: &[Vec<CellValue>]) -> ExportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LongRecord, RecordKey};
    use std::collections::BTreeMap;

    fn long_table() -> LongTable {
        let mut first = BTreeMap::new();
        first.insert("entityId".to_string(), CellValue::from("Acme"));
        first.insert("Year".to_string(), CellValue::from("2020"));
        first.insert("Revenue".to_string(), CellValue::Number(100.0));
        first.insert("Employees".to_string(), CellValue::Number(5.0));

        let mut second = BTreeMap::new();
        second.insert("entityId".to_string(), CellValue::from("Acme"));
        second.insert("Year".to_string(), CellValue::from("2021"));
        second.insert("Revenue".to_string(), CellValue::Number(150.0));

        LongTable {
            columns: vec!["entityId".into(), "Year".into(), "Revenue".into(), "Employees".into()],
            records: vec![
                LongRecord { key: RecordKey::new("Acme", 2020), fields: first },
                LongRecord { key: RecordKey::new("Acme", 2021), fields: second },
            ],
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.XLSX")).unwrap(), OutputFormat::Xlsx);
        assert_eq!(OutputFormat::from_path(Path::new("out.csv")).unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("out.json")).unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_path(Path::new("out.parquet")).is_err());
        assert!(OutputFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn test_write_json_uses_null_for_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");

        write_long_table(&path, "Results", &long_table()).unwrap();

        let records: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["entityId"], "Acme");
        assert_eq!(records[0]["Year"], "2020");
        assert_eq!(records[0]["Revenue"], 100);
        assert!(records[1]["Employees"].is_null());
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_long_table(&path, "Results", &long_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "entityId,Year,Revenue,Employees");
        assert_eq!(lines[1], "Acme,2020,100,5");
        assert_eq!(lines[2], "Acme,2021,150,");
    }

    #[test]
    fn test_write_long_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        write_long_table(&path, "Results", &long_table()).unwrap();

        let read = xlsx::read_sheet(&path, "Results").unwrap();
        assert_eq!(read.columns(), &["entityId", "Year", "Revenue", "Employees"]);
        assert_eq!(read.len(), 2);
    }
}
