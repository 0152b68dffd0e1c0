//! Flatten merged records into the final long table.
//!
//! One record per [`RecordKey`], sorted by entity identifier then year.
//! When several source rows contributed the same field of the same key, the
//! value merged last is the one kept (see [`super::merger`]); nothing here
//! picks a "first" value.

use super::decomposer::is_reserved;
use super::merger::RecordMerger;
use crate::models::{LongRecord, LongTable, ENTITY_ID_FIELD, YEAR_FIELD};

/// Build the [`LongTable`] from a merger.
///
/// Columns are `entityId`, `Year`, then every other field in the merger's
/// field order.
pub fn finalize(merger: RecordMerger) -> LongTable {
    let (records, field_order) = merger.into_parts();

    let mut columns = vec![ENTITY_ID_FIELD.to_string(), YEAR_FIELD.to_string()];
    columns.extend(field_order.into_iter().filter(|f| !is_reserved(f)));

    // BTreeMap iteration is already (entityId, year) ascending.
    let records = records
        .into_iter()
        .map(|(key, fields)| LongRecord { key, fields })
        .collect();

    LongTable { columns, records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, RecordKey};
    use crate::transform::decomposer::{reserved_fields, YearPartials};
    use std::collections::HashSet;

    fn partial(entity: &str, year: i32, field: &str, value: i64) -> YearPartials {
        let mut record = reserved_fields(entity, year);
        record.insert(field.to_string(), value.into());
        let mut partials = YearPartials::new();
        partials.insert(RecordKey::new(entity, year), record);
        partials
    }

    #[test]
    fn test_sorted_by_entity_then_year() {
        let mut merger = RecordMerger::new();
        merger.absorb(partial("Beta", 2020, "Revenue", 1));
        merger.absorb(partial("Acme", 2021, "Revenue", 2));
        merger.absorb(partial("Acme", 2019, "Revenue", 3));

        let table = finalize(merger);
        let keys: Vec<RecordKey> = table.records.iter().map(|r| r.key.clone()).collect();

        assert_eq!(
            keys,
            vec![
                RecordKey::new("Acme", 2019),
                RecordKey::new("Acme", 2021),
                RecordKey::new("Beta", 2020),
            ]
        );
    }

    #[test]
    fn test_years_sort_numerically() {
        let mut merger = RecordMerger::new();
        merger.absorb(partial("Acme", 10000, "Revenue", 1));
        merger.absorb(partial("Acme", 999, "Revenue", 2));

        let table = finalize(merger);
        assert_eq!(table.records[0].key.year, 999);
        assert_eq!(table.records[1].key.year, 10000);
    }

    #[test]
    fn test_keys_are_unique() {
        let mut merger = RecordMerger::new();
        for value in 0..5 {
            merger.absorb(partial("Acme", 2020, "Revenue", value));
            merger.absorb(partial("Acme", 2021, "Revenue", value));
        }

        let table = finalize(merger);
        let unique: HashSet<&RecordKey> = table.records.iter().map(|r| &r.key).collect();
        assert_eq!(table.len(), 2);
        assert_eq!(unique.len(), table.len());
    }

    #[test]
    fn test_conflicting_duplicates_keep_last_merged_value() {
        let mut merger = RecordMerger::new();
        merger.absorb(partial("Acme", 2020, "Revenue", 100));
        merger.absorb(partial("Acme", 2020, "Revenue", 90));

        let table = finalize(merger);
        let record = table.get(&RecordKey::new("Acme", 2020)).unwrap();
        assert_eq!(record.get("Revenue"), Some(&CellValue::Number(90.0)));
    }

    #[test]
    fn test_reserved_columns_come_first() {
        let mut merger = RecordMerger::new();
        merger.absorb(partial("Acme", 2020, "Assets", 1));

        let table = finalize(merger);
        assert_eq!(table.columns, vec!["entityId", "Year", "Assets"]);
    }

    #[test]
    fn test_empty_merger() {
        let table = finalize(RecordMerger::new());
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["entityId", "Year"]);
    }
}
