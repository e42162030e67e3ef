use matrix_harness::core::data_source::MAX_ROWS;
use matrix_harness::{DataSource, DataSourceError, Row, SourceKind};
use serde_json::json;
use tempfile::tempdir;

mod common;
use common::{row, user_rows, write_file};

#[test]
fn test_from_array_copies_rows_in_order() {
    let mut rows = user_rows();
    let source = DataSource::from_array(&rows, "users");

    rows[0].insert("name".to_string(), json!("mallory"));

    assert_eq!(source.name(), "users");
    assert_eq!(source.source_kind(), SourceKind::InMemory);
    assert_eq!(source.row_count(), 3);
    assert_eq!(source.get_row(0).unwrap()["name"], json!("alice"));
    assert_eq!(source.get_column_values("name"), vec![json!("alice"), json!("bob"), json!("carol")]);
}

#[test]
fn test_headers_are_first_seen_union() {
    let rows = vec![
        row(json!({ "b": 1, "a": 2 })),
        row(json!({ "a": 3, "c": 4 })),
    ];
    let source = DataSource::from_array(&rows, "mixed");

    assert_eq!(source.headers(), ["b", "a", "c"]);
    assert_eq!(
        source.get_column_values("c"),
        vec![serde_json::Value::Null, json!(4)]
    );
}

#[test]
fn test_get_row_out_of_range_is_none() {
    let source = DataSource::from_array(&user_rows(), "users");
    assert!(source.get_row(3).is_none());
    assert!(source.get_row(usize::MAX).is_none());
}

#[test]
fn test_row_cap_drops_excess_rows() {
    let rows: Vec<Row> = (0..MAX_ROWS + 5).map(|i| row(json!({ "i": i }))).collect();
    let source = DataSource::from_array(&rows, "big");

    assert_eq!(source.row_count(), MAX_ROWS);
    assert_eq!(source.dropped_rows(), 5);
    assert_eq!(source.get_row(MAX_ROWS - 1).unwrap()["i"], json!(MAX_ROWS - 1));
}

#[test]
fn test_filter_rows_keeps_exactly_matching_rows_in_order() {
    let source = DataSource::from_array(&user_rows(), "users");
    let adults = source.filter_rows(|r| r["age"].as_i64().unwrap_or(0) >= 18);

    let names: Vec<_> = adults.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("alice"), json!("carol")]);
    assert!(source.filter_rows(|_| false).is_empty());
    assert_eq!(source.filter_rows(|_| true), source.rows());
}

#[test]
fn test_parse_csv_coerces_and_trims_fields() {
    let content = "name, age ,score\n alice ,30,9.5\nbob,17,n/a\n";
    let source = DataSource::parse_csv("people", content, ',');

    assert_eq!(source.source_kind(), SourceKind::Csv);
    assert_eq!(source.headers(), ["name", "age", "score"]);
    let first = source.get_row(0).unwrap();
    assert_eq!(first["name"], json!("alice"));
    assert_eq!(first["age"], json!(30));
    assert_eq!(first["score"], json!(9.5));
    assert_eq!(source.get_row(1).unwrap()["score"], json!("n/a"));
}

#[test]
fn test_parse_csv_skips_malformed_and_blank_lines() {
    let content = "\n\na;b\n1;2\n\n3\n4;5;6\n7;8\n";
    let source = DataSource::parse_csv("semi", content, ';');

    assert_eq!(source.row_count(), 2);
    assert_eq!(source.get_column_values("a"), vec![json!(1), json!(7)]);
}

#[test]
fn test_parse_csv_empty_content_yields_empty_source() {
    let source = DataSource::parse_csv("empty", "  \n\n", ',');
    assert!(source.is_empty());
    assert!(source.headers().is_empty());
}

#[test]
fn test_from_csv_names_source_after_file_stem() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "logins.csv", "user,ok\nalice,1\n");
    let source = DataSource::from_csv(&path, ',').unwrap();

    assert_eq!(source.name(), "logins");
    assert_eq!(source.row_count(), 1);
}

#[test]
fn test_from_csv_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = DataSource::from_csv(dir.path().join("missing.csv"), ',').unwrap_err();

    assert!(matches!(err, DataSourceError::Io { .. }));
    assert!(err.to_string().contains("missing.csv"));
}

#[test]
fn test_parse_json_top_level_array() {
    let content = r#"[{"x": 1}, 5, {"x": 2}]"#;
    let source = DataSource::parse_json("arr", content, "data").unwrap();

    assert_eq!(source.source_kind(), SourceKind::Json);
    assert_eq!(source.get_column_values("x"), vec![json!(1), json!(2)]);
}

#[test]
fn test_parse_json_array_under_key() {
    let content = r#"{"meta": "ignored", "cases": [{"id": "a"}, {"id": "b"}]}"#;
    let source = DataSource::parse_json("wrapped", content, "cases").unwrap();

    assert_eq!(source.row_count(), 2);
    assert_eq!(source.headers(), ["id"]);
}

#[test]
fn test_parse_json_object_without_key_is_single_row() {
    let content = r#"{"user": "alice", "retries": 2}"#;
    let source = DataSource::parse_json("single", content, "data").unwrap();

    assert_eq!(source.row_count(), 1);
    assert_eq!(source.get_row(0).unwrap()["retries"], json!(2));
}

#[test]
fn test_parse_json_rejects_bad_shapes() {
    let not_array = DataSource::parse_json("x", r#"{"data": 3}"#, "data").unwrap_err();
    assert!(matches!(not_array, DataSourceError::Format { .. }));

    let scalar = DataSource::parse_json("x", "42", "data").unwrap_err();
    assert!(matches!(scalar, DataSourceError::Format { .. }));

    let broken = DataSource::parse_json("x", "{not json", "data").unwrap_err();
    assert!(broken.to_string().contains('x'));
}

#[test]
fn test_from_json_reads_file() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "accounts.json", r#"{"data": [{"n": 1}, {"n": 2}, {"n": 3}]}"#);
    let source = DataSource::from_json(&path, "data").unwrap();

    assert_eq!(source.name(), "accounts");
    assert_eq!(source.row_count(), 3);
}
