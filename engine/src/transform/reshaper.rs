//! Wide-to-long reshape driver.
//!
//! Classifies the columns once, decomposes every row, merges the partial
//! records and flattens them into a [`LongTable`]. No I/O happens here; the
//! pipeline feeds rows one at a time so it can report progress.
//!
//! # Example
//!
//! ```rust,ignore
//! use panelshape::{reshape, WideTable};
//!
//! let outcome = reshape(&table, "Company name Latin alphabet")?;
//! println!("{} records", outcome.table.len());
//! println!("incomplete: {:?}", outcome.report.incomplete_fields);
//! ```

use serde::Serialize;
use std::collections::BTreeSet;

use super::aggregator::finalize;
use super::classifier::{classify_columns, ColumnClass};
use super::completeness::find_incomplete_fields;
use super::decomposer::{decompose, ReservedFieldCollision};
use super::merger::{FieldConflict, RecordMerger};
use crate::error::ReshapeError;
use crate::models::{CellValue, LongTable, WideTable};

/// A row whose year-scoped values were dropped for lack of an entity key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingEntityKey {
    pub row: usize,
    /// Non-empty year-scoped columns that were dropped.
    pub columns: Vec<String>,
}

/// Data-quality findings of one reshape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReshapeReport {
    pub rows_processed: usize,
    pub records: usize,
    /// Fields present on some records and absent on others.
    pub incomplete_fields: BTreeSet<String>,
    pub missing_entity_keys: Vec<MissingEntityKey>,
    pub conflicts: Vec<FieldConflict>,
    pub reserved_collisions: Vec<ReservedFieldCollision>,
    /// Rows that produced no year record; their invariant fields are not in the output.
    pub rows_without_year_data: usize,
}

/// Output of [`reshape`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReshapeOutcome {
    pub table: LongTable,
    pub report: ReshapeReport,
}

/// Incremental reshape over the rows of one table.
#[derive(Debug)]
pub struct Reshaper {
    columns: Vec<String>,
    classes: Vec<ColumnClass>,
    entity_index: usize,
    merger: RecordMerger,
    report: ReshapeReport,
}

impl Reshaper {
    /// Prepare a reshape for a table with `columns`.
    ///
    /// Fails when `entity_column` is not one of the columns.
    pub fn new(columns: &[String], entity_column: &str) -> Result<Self, ReshapeError> {
        let entity_index = columns
            .iter()
            .position(|c| c == entity_column)
            .ok_or_else(|| ReshapeError::MissingEntityColumn {
                column: entity_column.to_string(),
                available: columns.join(", "),
            })?;

        let classes = classify_columns(columns);
        let base_names: Vec<String> = classes
            .iter()
            .filter(|c| c.is_year_scoped())
            .map(|c| c.field_name().to_string())
            .collect();

        Ok(Self {
            columns: columns.to_vec(),
            classes,
            entity_index,
            merger: RecordMerger::with_column_order(base_names),
            report: ReshapeReport::default(),
        })
    }

    pub fn classes(&self) -> &[ColumnClass] {
        &self.classes
    }

    /// Number of year-scoped columns.
    pub fn year_column_count(&self) -> usize {
        self.classes.iter().filter(|c| c.is_year_scoped()).count()
    }

    /// Decompose one row and merge its contributions.
    pub fn push_row(&mut self, row_index: usize, row: &[CellValue]) {
        let parts = decompose(row_index, row, &self.columns, &self.classes, self.entity_index);

        self.report.rows_processed += 1;
        if !parts.has_year_data() {
            self.report.rows_without_year_data += 1;
        }
        if !parts.dropped_columns.is_empty() {
            self.report.missing_entity_keys.push(MissingEntityKey {
                row: row_index,
                columns: parts.dropped_columns,
            });
        }
        self.report.reserved_collisions.extend(parts.reserved_collisions);
        self.merger.absorb(parts.year_partials);
    }

    /// Flatten, sort and inspect the merged records.
    pub fn finish(self) -> ReshapeOutcome {
        let mut report = self.report;
        report.conflicts = self.merger.conflicts();

        let table = finalize(self.merger);
        report.records = table.len();
        report.incomplete_fields = find_incomplete_fields(&table);

        ReshapeOutcome { table, report }
    }
}

/// Reshape a whole table in one call.
pub fn reshape(table: &WideTable, entity_column: &str) -> Result<ReshapeOutcome, ReshapeError> {
    let mut reshaper = Reshaper::new(table.columns(), entity_column)?;
    for (i, row) in table.rows().iter().enumerate() {
        reshaper.push_row(i, row);
    }
    Ok(reshaper.finish())
}
