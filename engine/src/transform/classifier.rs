//! Column classification: does a column name carry a reporting year?
//!
//! Two suffix shapes are recognized, tried in order:
//!
//! ```text
//! "Revenue 2020/2021"  →  YearScoped { year: 2020, base_name: "Revenue" }
//! "Revenue 2020"       →  YearScoped { year: 2020, base_name: "Revenue" }
//! "Revenue 2020/"      →  YearScoped { year: 2020, base_name: "Revenue" }
//! "Company name"       →  Invariant  { name: "Company name" }
//! ```
//!
//! Classification depends on the column name only, so a table's columns are
//! classified once with [`classify_columns`] and reused for every row.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Fiscal-year range suffix, e.g. `2020/2021`. The first year wins.
static YEAR_RANGE_SUFFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^(.*?)\s*([0-9]{4})/[0-9]{4}$").ok());

/// Single year suffix with an optional trailing slash, e.g. `2020` or `2020/`.
static YEAR_SUFFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^(.*?)\s*([0-9]{4})/?$").ok());

/// Classification of one column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ColumnClass {
    /// Value does not vary by year (e.g. the company name).
    Invariant { name: String },
    /// Value belongs to `year`; stored under `base_name` in the long table.
    #[serde(rename_all = "camelCase")]
    YearScoped { year: i32, base_name: String },
}

impl ColumnClass {
    pub fn is_year_scoped(&self) -> bool {
        matches!(self, ColumnClass::YearScoped { .. })
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            ColumnClass::YearScoped { year, .. } => Some(*year),
            ColumnClass::Invariant { .. } => None,
        }
    }

    /// Field name in the output: the base name, or the trimmed invariant name.
    pub fn field_name(&self) -> &str {
        match self {
            ColumnClass::YearScoped { base_name, .. } => base_name,
            ColumnClass::Invariant { name } => name,
        }
    }
}

/// Classify a single column name.
///
/// The base name is everything before the year token and the whitespace
/// immediately preceding it, kept byte for byte. A name made only of a year
/// token is year-scoped with an empty base name.
pub fn classify(column_name: &str) -> ColumnClass {
    let matched = match_suffix(&YEAR_RANGE_SUFFIX, column_name)
        .or_else(|| match_suffix(&YEAR_SUFFIX, column_name));

    match matched {
        Some((year, base_name)) => ColumnClass::YearScoped { year, base_name },
        None => ColumnClass::Invariant {
            name: column_name.trim().to_string(),
        },
    }
}

fn match_suffix(pattern: &Option<Regex>, column_name: &str) -> Option<(i32, String)> {
    let caps = pattern.as_ref()?.captures(column_name)?;
    let year = caps.get(2)?.as_str().parse::<i32>().ok()?;
    let base_name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Some((year, base_name.to_string()))
}

/// Classify every column of a table, in column order.
pub fn classify_columns(columns: &[String]) -> Vec<ColumnClass> {
    columns.iter().map(|c| classify(c)).collect()
}
