use matrix_harness::reporting::export::{
    CSV_HEADER, export_csv, export_json, parse_json_export, read_json, results_to_csv,
    results_to_json,
};
use matrix_harness::reporting::generate_report;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

mod common;
use common::make_result;

#[test]
fn test_report_counts_and_rate() {
    let results = vec![
        make_result("login", "login_0", true, 0.5),
        make_result("login", "login_1", false, 1.0),
        make_result("login", "login_2", false, 1.5),
    ];
    let report = generate_report("suite", &results);

    assert_eq!(report.total, 3);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 2);
    assert!((report.success_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.total_execution_time, Duration::from_secs(3));
    assert!(
        (report.average_execution_time.as_secs_f64() - 1.0).abs() < 1e-9,
        "average was {:?}",
        report.average_execution_time
    );
    assert_eq!(report.by_data_source.get("inline"), Some(&3));
}

#[test]
fn test_report_of_no_results() {
    let report = generate_report("empty", &[]);

    assert_eq!(report.total, 0);
    assert_eq!(report.success_rate, 0.0);
    assert_eq!(report.average_execution_time, Duration::ZERO);
    assert!(report.by_data_source.is_empty());
}

#[test]
fn test_report_is_repeatable() {
    let results = vec![
        make_result("a", "a_0", true, 0.1),
        make_result("a", "a_1", false, 0.2),
    ];
    assert_eq!(generate_report("s", &results), generate_report("s", &results));
}

#[test]
fn test_csv_layout() {
    let results = vec![
        make_result("login", "login_0", true, 0.25),
        make_result("login", "login_1", false, 1.0),
    ];
    let csv = results_to_csv(&results);
    let lines: Vec<_> = csv.lines().collect();

    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "login,login_0,inline,true,0.250,");
    assert_eq!(lines[2], "login,login_1,inline,false,1.000,assertion failed");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_csv_quotes_fields_with_separators() {
    let mut result = make_result("parse", "parse_0", false, 0.0);
    result.error_message = "expected \"a,b\"\ngot nothing".to_string();
    let csv = results_to_csv(&[result]);

    assert!(csv.contains("\"expected \"\"a,b\"\"\ngot nothing\""));
}

#[test]
fn test_json_round_trip_preserves_results() {
    let results: Vec<_> = (0..5)
        .map(|i| make_result("rt", &format!("rt_{i}"), i % 2 == 0, 0.1 * i as f64))
        .collect();

    let dir = tempdir().unwrap();
    let path = dir.path().join("out/results.json");
    export_json(&results, &path).unwrap();

    let parsed = read_json(&path).unwrap();
    assert_eq!(parsed.len(), 5);
    for (original, restored) in results.iter().zip(&parsed) {
        assert_eq!(restored.test_case_id, original.test_case_id);
        assert_eq!(restored.success, original.success);
        assert_eq!(restored.input_data, original.input_data);
        assert_eq!(restored.failure_reason, original.failure_reason);
    }
}

#[test]
fn test_json_document_shape() {
    let results = vec![make_result("doc", "doc_0", true, 0.0)];
    let text = results_to_json(&results).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["result_count"], 1);
    assert!(value["export_timestamp"].is_string());
    assert_eq!(value["results"][0]["test_case_id"], "doc_0");

    let document = parse_json_export(&text).unwrap();
    assert_eq!(document.result_count, 1);
}

#[test]
fn test_export_csv_writes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    export_csv(&[make_result("f", "f_0", true, 0.0)], &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with(CSV_HEADER));
    assert!(content.contains("f,f_0,inline,true,0.000,"));
}
