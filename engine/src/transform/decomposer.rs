//! Split one wide row into per-(entity, year) partial records.
//!
//! ```text
//! Name: Acme | Revenue 2020: 100 | Employees 2020: 5 | Revenue 2021: 150
//!                              ↓
//! (Acme, 2020) → { entityId: Acme, Year: 2020, Revenue: 100, Employees: 5 }
//! (Acme, 2021) → { entityId: Acme, Year: 2021, Revenue: 150 }
//! invariant    → { Name: Acme }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use super::classifier::ColumnClass;
use crate::models::{CellValue, RecordKey, ENTITY_ID_FIELD, YEAR_FIELD};

/// Fields of one partial record, keyed by field name.
pub type Fields = BTreeMap<String, CellValue>;

/// Partial records produced by one row.
pub type YearPartials = BTreeMap<RecordKey, Fields>;

/// A year-scoped column whose base name is one of the reserved output fields.
///
/// The reserved field keeps its value; the column's contribution is skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedFieldCollision {
    pub row: usize,
    pub column: String,
    pub key: RecordKey,
    pub field: String,
    pub value: CellValue,
}

/// Everything one row contributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDecomposition {
    /// Invariant columns, keyed by trimmed column name.
    pub invariant_fields: Fields,
    /// Year-scoped contributions, each carrying `entityId` and `Year`.
    pub year_partials: YearPartials,
    /// Non-empty year-scoped columns dropped because the row has no entity key.
    pub dropped_columns: Vec<String>,
    pub reserved_collisions: Vec<ReservedFieldCollision>,
}

impl RowDecomposition {
    pub fn has_year_data(&self) -> bool {
        !self.year_partials.is_empty()
    }
}

/// Decompose one row.
///
/// `row`, `columns` and `classes` are parallel; `entity_index` points at the
/// entity identifier column. Empty cells contribute nothing.
pub fn decompose(
    row_index: usize,
    row: &[CellValue],
    columns: &[String],
    classes: &[ColumnClass],
    entity_index: usize,
) -> RowDecomposition {
    let mut out = RowDecomposition::default();
    let entity_id = row.get(entity_index).and_then(CellValue::as_key);

    for ((value, column), class) in row.iter().zip(columns).zip(classes) {
        match class {
            ColumnClass::Invariant { name } => {
                out.invariant_fields
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            ColumnClass::YearScoped { year, base_name } => {
                if value.is_empty() {
                    continue;
                }
                let Some(entity_id) = entity_id.as_ref() else {
                    out.dropped_columns.push(column.clone());
                    continue;
                };

                let key = RecordKey::new(entity_id.clone(), *year);
                let partial = out
                    .year_partials
                    .entry(key.clone())
                    .or_insert_with(|| reserved_fields(entity_id, *year));

                if is_reserved(base_name) {
                    out.reserved_collisions.push(ReservedFieldCollision {
                        row: row_index,
                        column: column.clone(),
                        key,
                        field: base_name.clone(),
                        value: value.clone(),
                    });
                    continue;
                }
                partial.insert(base_name.clone(), value.clone());
            }
        }
    }

    out
}

/// `entityId` and `Year`, present in every record.
pub fn reserved_fields(entity_id: &str, year: i32) -> Fields {
    let mut fields = Fields::new();
    fields.insert(ENTITY_ID_FIELD.to_string(), CellValue::Text(entity_id.to_string()));
    fields.insert(YEAR_FIELD.to_string(), CellValue::Text(year.to_string()));
    fields
}

pub fn is_reserved(field: &str) -> bool {
    field == ENTITY_ID_FIELD || field == YEAR_FIELD
}
