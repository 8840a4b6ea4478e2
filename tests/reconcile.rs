mod common;

use common::{
    COLUMNAR_NAME, ColumnarOptions, LEGACY_TABLE, TestWorkspace, columnar_json, legacy_yaml,
    write_stores,
};
use store_reconcile::{
    ReconcileError,
    classify::Severity,
    driver::{ReconcileRequest, Reconciler},
    matcher::FieldCorrespondence,
    type_table::TypeTable,
    types::{NO_MATCH, Origin, ScalarKind},
};

fn request(legacy: &std::path::Path, columnar: &std::path::Path) -> ReconcileRequest {
    ReconcileRequest {
        legacy_path: legacy.to_path_buf(),
        legacy_table: LEGACY_TABLE.to_string(),
        columnar_path: columnar.to_path_buf(),
        columnar_name: COLUMNAR_NAME.to_string(),
    }
}

fn reconcile(options: &ColumnarOptions) -> store_reconcile::ReconciliationReport {
    let workspace = TestWorkspace::new();
    let (legacy, columnar) = write_stores(&workspace, options);
    Reconciler::open(&request(&legacy, &columnar), TypeTable::default())
        .expect("open stores")
        .run()
        .expect("run reconciliation")
}

#[test]
fn identical_stores_report_full_agreement() {
    let report = reconcile(&ColumnarOptions::default());

    assert_eq!((report.entries.legacy, report.entries.columnar), (10, 10));
    assert_eq!((report.fields.legacy, report.fields.columnar), (4, 4));
    assert!(report.names_match);
    assert!(report.correspondences.iter().all(FieldCorrespondence::is_matched));
    assert!(report
        .type_comparisons
        .iter()
        .all(|comparison| comparison.severity == Severity::Exact));
    assert_eq!(report.type_verdict.verdict(), "TRUE");

    let int32 = &report.statistics[0];
    assert_eq!(int32.canonical_type, ScalarKind::Int32);
    assert_eq!(int32.legacy.count, 10);
    assert!((int32.legacy.mean - 4.5).abs() < 1e-12);
    assert!((int32.legacy.stddev - 2.87).abs() < 0.01);
    assert!(report.statistics.iter().all(|comparison| comparison.matches));
    assert!(report.failures.is_empty());
    assert!(report.is_consistent());
}

#[test]
fn renamed_field_is_reported_on_both_sides() {
    let report = reconcile(&ColumnarOptions {
        energy_name: Some("mass"),
        ..ColumnarOptions::default()
    });

    assert!(!report.names_match);
    assert_eq!(report.correspondences.len(), 5);
    assert!(report
        .correspondences
        .contains(&FieldCorrespondence::legacy_only("energy")));
    assert_eq!(
        report.correspondences.last(),
        Some(&FieldCorrespondence::columnar_only("mass"))
    );
    let energy = report
        .type_comparisons
        .iter()
        .find(|comparison| comparison.field_name == "energy")
        .expect("energy comparison");
    assert_eq!(energy.columnar_type, NO_MATCH);
    assert!(!report.is_consistent());
}

#[test]
fn skipped_record_shows_in_counts_and_statistics() {
    let report = reconcile(&ColumnarOptions {
        skip_record: Some(4),
        ..ColumnarOptions::default()
    });

    assert_eq!((report.entries.legacy, report.entries.columnar), (10, 9));
    assert!(!report.entries.matches);
    assert!(report.names_match);
    assert_eq!(report.type_verdict, Severity::Exact);

    let int32 = &report.statistics[0];
    assert_eq!(int32.legacy.count - int32.columnar.count, 1);
    assert_ne!(int32.legacy.mean, int32.columnar.mean);
    assert_ne!(int32.legacy.stddev, int32.columnar.stddev);
    assert!(!int32.matches);
    assert!(!report.is_consistent());
}

#[test]
fn double_stored_as_float_is_near() {
    let report = reconcile(&ColumnarOptions {
        energy_type: Some("float"),
        ..ColumnarOptions::default()
    });

    let energy = report
        .type_comparisons
        .iter()
        .find(|comparison| comparison.field_name == "energy")
        .expect("energy comparison");
    assert_eq!(energy.severity, Severity::Near);
    assert_eq!(energy.legacy_type, "Double_t");
    assert_eq!(energy.columnar_type, "float");
    assert_eq!(report.type_verdict, Severity::Near);
    assert_eq!(report.type_verdict.verdict(), "NOT EXACTLY");
    assert!(report.names_match);
}

#[test]
fn missing_table_names_the_store_and_object() {
    let workspace = TestWorkspace::new();
    let (legacy, columnar) = write_stores(&workspace, &ColumnarOptions::default());
    let mut bad = request(&legacy, &columnar);
    bad.legacy_table = "tree_9".to_string();
    let err = Reconciler::open(&bad, TypeTable::default())
        .err()
        .expect("missing table");
    assert!(matches!(err, ReconcileError::TableNotFound { ref table, .. } if table == "tree_9"));
    assert!(err.to_string().contains("events.yml"));
}

#[test]
fn missing_columnar_file_is_fatal() {
    let workspace = TestWorkspace::new();
    let (legacy, _) = write_stores(&workspace, &ColumnarOptions::default());
    let absent = workspace.path().join("absent.json");
    let err = Reconciler::open(&request(&legacy, &absent), TypeTable::default())
        .err()
        .expect("missing store");
    assert!(matches!(
        err,
        ReconcileError::StoreNotFound {
            origin: Origin::Columnar,
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains(COLUMNAR_NAME));
    assert!(message.contains("absent.json"));
}

#[test]
fn corrupt_legacy_value_fails_only_its_field() {
    let workspace = TestWorkspace::new();
    let document = legacy_yaml().replacen(" energy: 1.5,", " energy: \"corrupt\",", 1);
    let legacy = workspace.write("events.yml", &document);
    let columnar = workspace.write("events.json", &columnar_json(&ColumnarOptions::default()));

    let report = Reconciler::open(&request(&legacy, &columnar), TypeTable::default())
        .expect("corrupt value does not block opening")
        .run()
        .expect("run reconciliation");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].origin, Origin::Legacy);
    assert_eq!(report.failures[0].field, "energy");
    assert!(report.failures[0].reason.contains("string"));
    let energy = report
        .type_comparisons
        .iter()
        .find(|comparison| comparison.field_name == "energy")
        .expect("energy comparison");
    assert_eq!(energy.severity, Severity::Mismatch);

    let int32 = &report.statistics[0];
    assert_eq!(int32.legacy.count, 10);
    assert!(int32.matches);
    assert_eq!(report.statistics[3].legacy.count, 10);
    assert_eq!(report.statistics[2].legacy.count, 0);
    assert!(!report.is_consistent());
}

#[test]
fn corrupt_columnar_value_fails_only_its_field() {
    let workspace = TestWorkspace::new();
    let document = columnar_json(&ColumnarOptions::default()).replacen("[0.0, 1.5", "[0.0, null", 1);
    let columnar = workspace.write("events.json", &document);
    let legacy = workspace.write("events.yml", &legacy_yaml());

    let report = Reconciler::open(&request(&legacy, &columnar), TypeTable::default())
        .expect("corrupt value does not block opening")
        .run()
        .expect("run reconciliation");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].origin, Origin::Columnar);
    assert_eq!(report.failures[0].field, "energy");
    assert_eq!(report.statistics[0].columnar.count, 10);
    assert!(report.statistics[0].matches);
    assert!(report.statistics[1].matches);
    assert!(report.statistics[3].matches);
    assert_eq!(report.statistics[2].columnar.count, 0);
    assert!(!report.statistics[2].matches);
}

#[test]
fn sequence_fields_flatten_and_compare_by_element() {
    let workspace = TestWorkspace::new();
    let legacy = workspace.write(
        "tracks.yml",
        r#"tables:
  - name: tracks
    branches:
      - { name: hits, type: vector<float> }
      - { name: flags, type: vector<bool> }
    entries:
      - { hits: [0.5, 1.5], flags: { len: 3, bits: [5] } }
      - ~
      - { hits: [2.5], flags: [false] }
"#,
    );
    let columnar = workspace.write(
        "tracks.json",
        r#"{
  "field_sets": [
    {
      "name": "tracks",
      "entries": 2,
      "fields": [
        { "name": "hits", "type": "std::vector<float>",
          "column": { "offsets": [2, 3], "values": [0.5, 1.5, 2.5] } },
        { "name": "_0", "type": "float" },
        { "name": "flags", "type": "std::vector<bool>",
          "column": { "offsets": [3, 4], "bits": [5] } },
        { "name": "_0", "type": "bool" }
      ]
    }
  ]
}"#,
    );
    let request = ReconcileRequest {
        legacy_path: legacy,
        legacy_table: "tracks".to_string(),
        columnar_path: columnar,
        columnar_name: "tracks".to_string(),
    };
    let report = Reconciler::open(&request, TypeTable::default())
        .expect("open stores")
        .run()
        .expect("run reconciliation");

    assert_eq!((report.fields.legacy, report.fields.columnar), (2, 2));
    assert_eq!((report.entries.legacy, report.entries.columnar), (3, 2));
    assert_eq!(report.sequence_comparisons.len(), 2);
    for comparison in &report.sequence_comparisons {
        assert!(comparison.matches, "{} differs", comparison.field_name);
        assert_eq!(comparison.legacy_elements, comparison.columnar_elements);
    }
    let bools = &report.statistics[3];
    assert_eq!(bools.legacy.count, 4);
    assert!((bools.legacy.mean - 0.5).abs() < 1e-12);
    assert!(bools.matches);
    assert!(report.statistics[1].matches);
    assert!(!report.is_consistent());
}
