//! Domain models for the panelshape pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`CellValue`] - A single spreadsheet cell (text, number, date or empty)
//! - [`WideTable`] - Merged source rows, one column per (field, year)
//! - [`RecordKey`] - The (entity, year) pair identifying one output record
//! - [`LongRecord`] - One output record
//! - [`LongTable`] - The reshaped output, one record per [`RecordKey`]

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Reserved field holding the entity identifier in every output record.
pub const ENTITY_ID_FIELD: &str = "entityId";

/// Reserved field holding the reporting year in every output record.
pub const YEAR_FIELD: &str = "Year";

// =============================================================================
// Cell Values
// =============================================================================

/// Value of a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Empty,
}

impl CellValue {
    /// Infer a typed value from raw text (CSV cells).
    ///
    /// Blank text becomes `Empty`, finite numbers become `Number`,
    /// `YYYY-MM-DD` (optionally with a `THH:MM:SS` time) becomes `Date`.
    /// Digit strings with a leading zero (`00123`, `0049`) stay `Text` so
    /// identifiers and postal codes keep their zeros.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if has_leading_zero(trimmed) {
            return CellValue::Text(raw.to_string());
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
            return CellValue::Date(dt);
        }
        if let Some(dt) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return CellValue::Date(dt);
        }
        CellValue::Text(raw.to_string())
    }

    /// Empty cells and whitespace-only text are both empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form with surrounding whitespace removed, `None` when empty.
    pub fn as_key(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let s = self.to_string();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// `0` followed by another digit, after an optional sign.
fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            // Integers without decimals
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(dt) if dt.time().num_seconds_from_midnight() == 0 => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Date(_) => serializer.collect_str(self),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

// =============================================================================
// Wide Table
// =============================================================================

/// Merged source rows sharing one column set.
///
/// Rows are stored positionally; every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl WideTable {
    /// Create an empty table. Duplicate column names get `.1`, `.2`, ... suffixes.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: unique_headers(columns),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding missing cells with `Empty` and ignoring extra cells.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in column `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        let col = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Add a column holding the same value on every row.
    pub fn add_constant_column(&mut self, name: impl Into<String>, value: CellValue) {
        let name = name.into();
        match self.column_index(&name) {
            Some(col) => {
                for row in &mut self.rows {
                    row[col] = value.clone();
                }
            }
            None => {
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Concatenate tables.
    ///
    /// Columns keep first-seen order across all parts; cells for columns a
    /// part does not have are `Empty`.
    pub fn union(parts: impl IntoIterator<Item = WideTable>) -> WideTable {
        let parts: Vec<WideTable> = parts.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for part in &parts {
            for col in &part.columns {
                if !positions.contains_key(col) {
                    positions.insert(col.clone(), columns.len());
                    columns.push(col.clone());
                }
            }
        }

        let mut merged = WideTable {
            columns,
            rows: Vec::new(),
        };
        for part in parts {
            let targets: Vec<usize> = part.columns.iter().map(|c| positions[c]).collect();
            for row in part.rows {
                let mut out = vec![CellValue::Empty; merged.columns.len()];
                for (value, &target) in row.into_iter().zip(&targets) {
                    out[target] = value;
                }
                merged.rows.push(out);
            }
        }
        merged
    }
}

/// Make header names unique the way spreadsheet tools do: `A`, `A.1`, `A.2`.
pub fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for header in headers {
        if !seen.contains_key(&header) {
            seen.insert(header.clone(), 0);
            out.push(header);
            continue;
        }
        let mut n = seen[&header];
        let renamed = loop {
            n += 1;
            let candidate = format!("{}.{}", header, n);
            if !seen.contains_key(&candidate) {
                break candidate;
            }
        };
        seen.insert(header, n);
        seen.insert(renamed.clone(), 0);
        out.push(renamed);
    }
    out
}

// =============================================================================
// Long Table
// =============================================================================

/// Identifies one output record.
///
/// Ordering is by entity identifier, then year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub entity_id: String,
    pub year: i32,
}

impl RecordKey {
    pub fn new(entity_id: impl Into<String>, year: i32) -> Self {
        Self {
            entity_id: entity_id.into(),
            year,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entity_id, self.year)
    }
}

/// One reshaped record: `entityId`, `Year` and every field collected for its key.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub key: RecordKey,
    pub fields: BTreeMap<String, CellValue>,
}

impl LongRecord {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// A field counts as present when it holds a non-empty value.
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_empty())
    }
}

/// The reshaped output table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongTable {
    /// `entityId`, `Year`, then field names in first-seen order.
    pub columns: Vec<String>,
    pub records: Vec<LongRecord>,
}

impl LongTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&LongRecord> {
        self.records
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Records as rows of cells in column order; absent fields are `Empty`.
    pub fn to_rows(&self) -> Vec<Vec<CellValue>> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|c| record.fields.get(c).cloned().unwrap_or(CellValue::Empty))
                    .collect()
            })
            .collect()
    }
}
