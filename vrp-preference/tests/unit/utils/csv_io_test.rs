use super::*;
use crate::helpers::*;
use serde::Deserialize;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct TestRow {
    id: String,
    value: f64,
}

impl CsvRow for TestRow {
    const HEADER: &'static [&'static str] = &["id", "value"];
}

fn create_row(id: &str, value: f64) -> TestRow {
    TestRow { id: id.to_string(), value }
}

#[test]
fn can_write_and_read_rows() {
    let dir = create_temp_dir();
    let path = dir.path().join("rows.csv");

    let count = write_rows(&path, vec![create_row("a", 1.5), create_row("b", -2.)]).unwrap();
    let rows = read_rows::<TestRow>(&path).unwrap();

    assert_eq!(count, 2);
    assert_eq!(rows, vec![create_row("a", 1.5), create_row("b", -2.)]);
    assert_eq!(read_lines(&path)[0], "id,value");
}

#[test]
fn can_write_header_without_rows() {
    let dir = create_temp_dir();
    let path = dir.path().join("empty.csv");

    let count = write_rows(&path, Vec::<TestRow>::new()).unwrap();

    assert_eq!(count, 0);
    assert_eq!(read_lines(&path), vec!["id,value".to_string()]);
}

#[test]
fn can_append_rows_with_single_header() {
    let dir = create_temp_dir();
    let path = dir.path().join("log.csv");

    append_row(&path, create_row("a", 1.)).unwrap();
    append_row(&path, create_row("b", 2.)).unwrap();

    assert_eq!(read_lines(&path), vec!["id,value".to_string(), "a,1.0".to_string(), "b,2.0".to_string()]);
}

#[test]
fn can_skip_malformed_rows() {
    init_logger();
    let dir = create_temp_dir();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "id,value\na,1\nb,oops\nc\nd, 3 \n").unwrap();

    let rows = read_rows::<TestRow>(&path).unwrap();

    assert_eq!(rows, vec![create_row("a", 1.), create_row("d", 3.)]);
}

#[test]
fn can_report_missing_file() {
    let dir = create_temp_dir();

    let result = read_rows::<TestRow>(&dir.path().join("missing.csv"));

    assert!(matches!(result, Err(PreferenceError::Csv { .. })));
}

#[test]
fn can_create_nested_dirs() {
    let dir = create_temp_dir();
    let nested = dir.path().join("a").join("b");

    create_dirs(&nested).unwrap();
    create_dirs(&nested).unwrap();

    assert!(nested.is_dir());
}
