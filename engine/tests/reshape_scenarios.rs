//! End-to-end reshape scenarios through the public API.

use panelshape::{parse_str, reshape, run, CellValue, PipelineOptions, RecordKey};
use std::collections::BTreeSet;
use std::fs;

const ENTITY: &str = "Company name Latin alphabet";

fn acme_csv() -> String {
    format!(
        "{ENTITY};Revenue 2020;Employees 2020;Revenue 2021\n\
         Acme;100;5;\n\
         Acme;;;150\n"
    )
}

#[test]
fn test_acme_two_years() {
    let table = parse_str(&acme_csv(), ';').unwrap();
    let outcome = reshape(&table, ENTITY).unwrap();

    assert_eq!(outcome.table.columns, vec!["entityId", "Year", "Revenue", "Employees"]);
    assert_eq!(outcome.table.len(), 2);

    let y2020 = outcome.table.get(&RecordKey::new("Acme", 2020)).unwrap();
    assert_eq!(y2020.get("entityId"), Some(&CellValue::from("Acme")));
    assert_eq!(y2020.get("Year"), Some(&CellValue::from("2020")));
    assert_eq!(y2020.get("Revenue"), Some(&CellValue::Number(100.0)));
    assert_eq!(y2020.get("Employees"), Some(&CellValue::Number(5.0)));

    let y2021 = outcome.table.get(&RecordKey::new("Acme", 2021)).unwrap();
    assert_eq!(y2021.get("Revenue"), Some(&CellValue::Number(150.0)));
    assert!(!y2021.has("Employees"));

    assert_eq!(
        outcome.report.incomplete_fields,
        BTreeSet::from(["Employees".to_string()])
    );
    assert!(outcome.report.conflicts.is_empty());
    assert!(outcome.report.missing_entity_keys.is_empty());
}

#[test]
fn test_fiscal_year_ranges_use_first_year() {
    let csv = format!(
        "{ENTITY};Revenue 2019/2020;Revenue 2020/;Profit 2020\n\
         Beta;10;20;3\n"
    );
    let table = parse_str(&csv, ';').unwrap();
    let outcome = reshape(&table, ENTITY).unwrap();

    let y2019 = outcome.table.get(&RecordKey::new("Beta", 2019)).unwrap();
    assert_eq!(y2019.get("Revenue"), Some(&CellValue::Number(10.0)));

    let y2020 = outcome.table.get(&RecordKey::new("Beta", 2020)).unwrap();
    assert_eq!(y2020.get("Revenue"), Some(&CellValue::Number(20.0)));
    assert_eq!(y2020.get("Profit"), Some(&CellValue::Number(3.0)));
}

#[test]
fn test_reshape_is_idempotent() {
    let table = parse_str(&acme_csv(), ';').unwrap();

    let first = reshape(&table, ENTITY).unwrap();
    let second = reshape(&table, ENTITY).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.report).unwrap(),
        serde_json::to_string(&second.report).unwrap()
    );
}

#[test]
fn test_pipeline_is_idempotent_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("export.csv"), acme_csv()).unwrap();

    let first_path = dir.path().join("first.csv");
    let second_path = dir.path().join("second.csv");

    for path in [&first_path, &second_path] {
        let options = PipelineOptions {
            output: Some(path.clone()),
            ..PipelineOptions::default()
        };
        run(&[data.clone()], &options).unwrap();
    }

    let first = fs::read(&first_path).unwrap();
    let second = fs::read(&second_path).unwrap();
    assert_eq!(first, second);

    let content = String::from_utf8(first).unwrap();
    assert_eq!(
        content.lines().collect::<Vec<_>>(),
        vec![
            "entityId,Year,Revenue,Employees",
            "Acme,2020,100,5",
            "Acme,2021,150,",
        ]
    );
}

#[test]
fn test_trailing_space_after_year_keeps_column_invariant() {
    let table = parse_str("Name;Revenue 2020 \nAcme;1\n", ';').unwrap();
    let outcome = reshape(&table, "Name").unwrap();

    assert!(outcome.table.is_empty());
    assert_eq!(outcome.report.records, 0);
    assert_eq!(outcome.report.rows_without_year_data, 1);
}

#[test]
fn test_leading_zero_ids_are_distinct_entities() {
    let table = parse_str("ID;Revenue 2020\n00123;1\n123;2\n", ';').unwrap();
    let outcome = reshape(&table, "ID").unwrap();

    assert_eq!(outcome.table.len(), 2);
    assert!(outcome.report.conflicts.is_empty());

    let padded = outcome.table.get(&RecordKey::new("00123", 2020)).unwrap();
    assert_eq!(padded.get("Revenue"), Some(&CellValue::Number(1.0)));
    assert_eq!(padded.get("entityId"), Some(&CellValue::from("00123")));

    let plain = outcome.table.get(&RecordKey::new("123", 2020)).unwrap();
    assert_eq!(plain.get("Revenue"), Some(&CellValue::Number(2.0)));
}
