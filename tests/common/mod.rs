#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const LEGACY_TABLE: &str = "tree_0";
pub const COLUMNAR_NAME: &str = "ntuple";
pub const RECORDS: i32 = 10;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

fn weight(record: i32) -> f64 {
    f64::from(record) * 0.1
}

fn energy(record: i32) -> f64 {
    f64::from(record) * 1.5
}

/// Legacy YAML document with `value/Int_t`, `weight/Float_t`,
/// `energy/Double_t` and `isNew/Bool_t` over records `0..10`.
pub fn legacy_yaml() -> String {
    let mut doc = String::new();
    doc.push_str("tables:\n");
    doc.push_str(&format!("  - name: {LEGACY_TABLE}\n"));
    doc.push_str("    branches:\n");
    doc.push_str("      - { name: value, type: Int_t }\n");
    doc.push_str("      - { name: weight, type: Float_t }\n");
    doc.push_str("      - { name: energy, type: Double_t }\n");
    doc.push_str("      - { name: isNew, type: Bool_t }\n");
    doc.push_str("    entries:\n");
    for record in 0..RECORDS {
        doc.push_str(&format!(
            "      - {{ value: {record}, weight: {:?}, energy: {:?}, isNew: {} }}\n",
            weight(record),
            energy(record),
            record % 2 == 0
        ));
    }
    doc
}

/// Variations of the columnar document relative to the legacy fixture.
#[derive(Debug, Clone, Default)]
pub struct ColumnarOptions {
    pub skip_record: Option<i32>,
    pub energy_name: Option<&'static str>,
    pub energy_type: Option<&'static str>,
}

/// Columnar JSON document holding the same dataset as [`legacy_yaml`].
pub fn columnar_json(options: &ColumnarOptions) -> String {
    let records = (0..RECORDS)
        .filter(|record| Some(*record) != options.skip_record)
        .collect::<Vec<_>>();
    let join = |values: Vec<String>| values.join(", ");
    let values = join(records.iter().map(|r| r.to_string()).collect());
    let weights = join(records.iter().map(|r| format!("{:?}", weight(*r))).collect());
    let energies = join(records.iter().map(|r| format!("{:?}", energy(*r))).collect());
    let flags = join(records.iter().map(|r| (r % 2 == 0).to_string()).collect());
    format!(
        r#"{{
  "field_sets": [
    {{
      "name": "{COLUMNAR_NAME}",
      "entries": {entries},
      "fields": [
        {{ "name": "value", "type": "std::int32_t", "column": {{ "values": [{values}] }} }},
        {{ "name": "weight", "type": "float", "column": {{ "values": [{weights}] }} }},
        {{ "name": "{energy_name}", "type": "{energy_type}", "column": {{ "values": [{energies}] }} }},
        {{ "name": "isNew", "type": "bool", "column": {{ "values": [{flags}] }} }}
      ]
    }}
  ]
}}"#,
        entries = records.len(),
        energy_name = options.energy_name.unwrap_or("energy"),
        energy_type = options.energy_type.unwrap_or("double"),
    )
}

/// Writes both stores into `workspace` and returns `(legacy, columnar)` paths.
pub fn write_stores(workspace: &TestWorkspace, options: &ColumnarOptions) -> (PathBuf, PathBuf) {
    let legacy = workspace.write("events.yml", &legacy_yaml());
    let columnar = workspace.write("events.json", &columnar_json(options));
    (legacy, columnar)
}
