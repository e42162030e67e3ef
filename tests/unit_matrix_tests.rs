use matrix_harness::core::matrix::{CASE_ID_KEY, MATRIX_NAME_KEY, display_label};
use matrix_harness::{TestDimension, TestMatrix};
use serde_json::{Value, json};
use std::collections::HashSet;

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| json!(v)).collect()
}

fn browser_os_matrix() -> TestMatrix {
    TestMatrix::new("compat")
        .with_dimension(TestDimension::new(
            "browser",
            strings(&["chrome", "firefox", "safari", "edge"]),
        ))
        .with_dimension(TestDimension::new("os", strings(&["windows", "macos", "linux"])))
}

fn case_ids(matrix: &TestMatrix) -> Vec<String> {
    matrix
        .cases()
        .iter()
        .map(|case| case[CASE_ID_KEY].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_exclusion_removes_exactly_one_combination() {
    let mut matrix = browser_os_matrix();
    matrix
        .add_exclusion(vec![json!("safari"), json!("windows")])
        .unwrap();

    assert_eq!(matrix.combination_count(), 12);
    let cases = matrix.generate_test_cases();
    assert_eq!(cases.len(), 11);
    assert!(
        !cases
            .iter()
            .any(|c| c["browser"] == json!("safari") && c["os"] == json!("windows"))
    );
    assert!(
        cases
            .iter()
            .any(|c| c["browser"] == json!("safari") && c["os"] == json!("linux"))
    );
}

#[test]
fn test_rightmost_dimension_varies_fastest() {
    let mut matrix = TestMatrix::new("order")
        .with_dimension(TestDimension::new("a", vec![json!(1), json!(2)]))
        .with_dimension(TestDimension::new("b", strings(&["x", "y", "z"])));
    matrix.generate_test_cases();

    assert_eq!(
        case_ids(&matrix),
        vec!["1_x", "1_y", "1_z", "2_x", "2_y", "2_z"]
    );
}

#[test]
fn test_case_count_is_product_of_dimension_sizes() {
    for sizes in [vec![1], vec![3, 1], vec![2, 2, 2], vec![5, 4, 3, 2]] {
        let mut matrix = TestMatrix::new("product");
        for (d, size) in sizes.iter().enumerate() {
            let values = (0..*size).map(|v| json!(v)).collect();
            matrix.add_dimension(TestDimension::new(format!("d{d}"), values));
        }
        let expected: usize = sizes.iter().product();

        assert_eq!(matrix.combination_count(), expected);
        assert_eq!(matrix.generate_test_cases().len(), expected);

        let unique: HashSet<_> = case_ids(&matrix).into_iter().collect();
        assert_eq!(unique.len(), expected, "case ids must be distinct for {sizes:?}");
    }
}

#[test]
fn test_empty_dimension_yields_no_cases() {
    let mut matrix = TestMatrix::new("empty")
        .with_dimension(TestDimension::new("a", strings(&["x"])))
        .with_dimension(TestDimension::new("b", vec![]));

    assert_eq!(matrix.combination_count(), 0);
    assert!(matrix.generate_test_cases().is_empty());
}

#[test]
fn test_no_dimensions_yields_no_cases() {
    let mut matrix = TestMatrix::new("none");
    assert_eq!(matrix.combination_count(), 0);
    assert!(matrix.generate_test_cases().is_empty());
}

#[test]
fn test_case_carries_values_labels_and_metadata() {
    let mut matrix = TestMatrix::new("labelled")
        .with_dimension(
            TestDimension::with_labels(
                "size",
                vec![json!(1024), json!(1_048_576)],
                vec!["1KiB".to_string(), "1MiB".to_string()],
            )
            .unwrap(),
        )
        .with_dimension(TestDimension::new("compressed", vec![json!(true), json!(false)]));

    let cases = matrix.generate_test_cases();
    let first = &cases[0];

    assert_eq!(first["size"], json!(1024));
    assert_eq!(first["size_name"], json!("1KiB"));
    assert_eq!(first["compressed"], json!(true));
    assert_eq!(first["compressed_name"], json!("true"));
    assert_eq!(first[CASE_ID_KEY], json!("1KiB_true"));
    assert_eq!(first[MATRIX_NAME_KEY], json!("labelled"));
}

#[test]
fn test_with_labels_rejects_length_mismatch() {
    let result = TestDimension::with_labels("d", vec![json!(1), json!(2)], vec!["one".to_string()]);
    assert!(result.is_err());
}

#[test]
fn test_exclusion_with_wrong_arity_is_rejected() {
    let mut matrix = browser_os_matrix();
    assert!(matrix.add_exclusion(vec![json!("safari")]).is_err());
    assert!(matrix.exclusions().is_empty());
}

#[test]
fn test_exclusion_matching_is_literal() {
    let mut matrix = browser_os_matrix();
    matrix.add_exclusion(vec![json!("any"), json!("windows")]).unwrap();
    matrix.add_exclusion(vec![json!("Safari"), json!("linux")]).unwrap();

    // Neither "any" nor a differently-cased value matches anything.
    assert_eq!(matrix.generate_test_cases().len(), 12);
}

#[test]
fn test_duplicate_labels_get_unique_ids() {
    let mut matrix = TestMatrix::new("dupes").with_dimension(
        TestDimension::with_labels(
            "level",
            vec![json!(1), json!(2), json!(3)],
            vec!["low".to_string(), "low".to_string(), "high".to_string()],
        )
        .unwrap(),
    );
    matrix.generate_test_cases();

    assert_eq!(case_ids(&matrix), vec!["low", "low#1", "high"]);
}

#[test]
fn test_suffixed_ids_never_collide_with_labels() {
    let mut matrix = TestMatrix::new("collide").with_dimension(
        TestDimension::with_labels(
            "level",
            vec![json!(1), json!(2), json!(3)],
            vec!["x#2".to_string(), "x".to_string(), "x".to_string()],
        )
        .unwrap(),
    );
    matrix.generate_test_cases();

    let ids = case_ids(&matrix);
    assert_eq!(ids, vec!["x#2", "x", "x#3"]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

#[test]
fn test_exclusion_goes_stale_when_dimension_added_later() {
    let mut matrix = TestMatrix::new("stale")
        .with_dimension(TestDimension::new("browser", strings(&["chrome"])));
    matrix.add_exclusion(strings(&["chrome"])).unwrap();
    assert!(matrix.validate().is_ok());

    matrix.add_dimension(TestDimension::new("os", strings(&["linux", "mac"])));

    let err = matrix.validate().unwrap_err().to_string();
    assert!(err.contains("[chrome]"), "{err}");
    assert!(err.contains("expected one per dimension (2)"), "{err}");
    assert_eq!(matrix.generate_test_cases().len(), 2);
}

#[test]
fn test_generation_is_idempotent() {
    let mut matrix = browser_os_matrix();
    matrix.add_exclusion(vec![json!("edge"), json!("macos")]).unwrap();

    let first = matrix.generate_test_cases().to_vec();
    let second = matrix.generate_test_cases().to_vec();

    assert_eq!(first, second);
    assert_eq!(matrix.cases(), second.as_slice());
}

#[test]
fn test_display_label() {
    assert_eq!(display_label(&json!("chrome")), "chrome");
    assert_eq!(display_label(&json!(42)), "42");
    assert_eq!(display_label(&json!(false)), "false");
    assert_eq!(display_label(&Value::Null), "null");
}
