//! Detect fields that are not populated on every record.
//!
//! Merging exports with different column selections leaves a ragged union:
//! a field filled for some (entity, year) records and absent on others.

use std::collections::{BTreeSet, HashMap};

use crate::models::LongTable;

/// Fields present on at least one record and absent or empty on at least one other.
///
/// A field present everywhere, or nowhere, is never reported.
pub fn find_incomplete_fields(table: &LongTable) -> BTreeSet<String> {
    let mut present: HashMap<&str, usize> = HashMap::new();

    for record in &table.records {
        for (field, value) in &record.fields {
            if !value.is_empty() {
                *present.entry(field.as_str()).or_default() += 1;
            }
        }
    }

    present
        .into_iter()
        .filter(|&(_, count)| count < table.records.len())
        .map(|(field, _)| field.to_string())
        .collect()
}
