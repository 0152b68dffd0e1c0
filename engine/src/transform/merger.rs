//! Accumulate partial records into one field map per (entity, year).
//!
//! The same key can receive contributions from many columns and from many
//! source rows (the same company exported in several files). Field maps are
//! unioned; when two contributions write the same field, the later one wins
//! and the disagreement is recorded as a [`FieldConflict`].

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::decomposer::{Fields, YearPartials};
use crate::models::{CellValue, RecordKey};

/// More than one distinct value was written to the same field of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConflict {
    pub key: RecordKey,
    pub field: String,
    /// Distinct values, ordered by their latest write; the last one is kept.
    pub values: Vec<CellValue>,
}

impl FieldConflict {
    pub fn kept(&self) -> Option<&CellValue> {
        self.values.last()
    }
}

/// Accumulator keyed by [`RecordKey`].
#[derive(Debug, Default)]
pub struct RecordMerger {
    records: BTreeMap<RecordKey, Fields>,
    /// Field names in first-seen order.
    seen_order: Vec<String>,
    known_fields: HashSet<String>,
    /// Preferred output order, usually the source column order.
    column_hint: Vec<String>,
    /// Distinct values per (key, field), for fields written more than once.
    history: BTreeMap<(RecordKey, String), Vec<CellValue>>,
}

impl RecordMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order output fields by `columns` first, then by first write.
    pub fn with_column_order(columns: Vec<String>) -> Self {
        Self {
            column_hint: columns,
            ..Self::default()
        }
    }

    /// Union one row's partial records into the accumulator.
    pub fn absorb(&mut self, partials: YearPartials) {
        for (key, fields) in partials {
            let record = self.records.entry(key.clone()).or_default();

            for (field, value) in fields {
                if self.known_fields.insert(field.clone()) {
                    self.seen_order.push(field.clone());
                }

                if let Some(previous) = record.get(&field) {
                    let values = self
                        .history
                        .entry((key.clone(), field.clone()))
                        .or_insert_with(|| vec![previous.clone()]);
                    if values.last() != Some(&value) {
                        values.retain(|v| v != &value);
                        values.push(value.clone());
                    }
                }
                record.insert(field, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Fields> {
        self.records.get(key)
    }

    /// Every field written so far: hinted fields in hint order, then the
    /// rest in the order they were first written.
    pub fn field_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::with_capacity(self.known_fields.len());
        let mut placed: HashSet<&str> = HashSet::new();

        for name in &self.column_hint {
            if self.known_fields.contains(name) && placed.insert(name.as_str()) {
                order.push(name.clone());
            }
        }
        for name in &self.seen_order {
            if placed.insert(name.as_str()) {
                order.push(name.clone());
            }
        }
        order
    }

    /// Fields that received more than one distinct value, in key order.
    pub fn conflicts(&self) -> Vec<FieldConflict> {
        self.history
            .iter()
            .filter(|(_, values)| values.len() > 1)
            .map(|((key, field), values)| FieldConflict {
                key: key.clone(),
                field: field.clone(),
                values: values.clone(),
            })
            .collect()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<RecordKey, Fields>, Vec<String>) {
        let order = self.field_order();
        (self.records, order)
    }
}

/// Merge a sequence of per-row partial records.
pub fn merge(all_partials: impl IntoIterator<Item = YearPartials>) -> RecordMerger {
    let mut merger = RecordMerger::new();
    for partials in all_partials {
        merger.absorb(partials);
    }
    merger
}
