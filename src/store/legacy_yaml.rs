//! Legacy row store backed by a YAML document.
//!
//! ```yaml
//! tables:
//!   - name: tree_0
//!     branches:
//!       - { name: value, type: Int_t }
//!       - { name: flags, type: vector<bool> }
//!     entries:
//!       - { value: 0, flags: { len: 3, bits: [5] } }
//!       - ~            # never filled
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use log::debug;
use serde::Deserialize;

use super::{Cell, NativeField, StoreAccessor, raw::RawCell};
use crate::{
    error::{ReconcileError, Result},
    types::{Origin, TypeTag},
};

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    tables: Vec<LegacyTable>,
}

#[derive(Debug, Deserialize)]
struct LegacyTable {
    name: String,
    #[serde(default)]
    branches: Vec<BranchDecl>,
    #[serde(default)]
    entries: Vec<Option<BTreeMap<String, RawCell>>>,
}

#[derive(Debug, Deserialize)]
struct BranchDecl {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    private: bool,
}

#[derive(Debug)]
pub struct LegacyYamlStore {
    location: String,
    table: String,
    fields: Vec<NativeField>,
    entries: Vec<Option<BTreeMap<String, RawCell>>>,
}

impl LegacyYamlStore {
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let not_found = |reason: String| ReconcileError::StoreNotFound {
            origin: Origin::Legacy,
            path: path.to_path_buf(),
            object: table.to_string(),
            reason,
        };
        let file = File::open(path).map_err(|err| not_found(err.to_string()))?;
        let document: LegacyDocument = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| not_found(format!("not a legacy row store: {err}")))?;
        let found = document
            .tables
            .into_iter()
            .find(|candidate| candidate.name == table)
            .ok_or_else(|| ReconcileError::TableNotFound {
                table: table.to_string(),
                path: path.to_path_buf(),
            })?;
        debug!(
            "Opened legacy table '{}' in {:?}: {} branch(es), {} entr(ies)",
            found.name,
            path,
            found.branches.len(),
            found.entries.len()
        );
        let fields = found
            .branches
            .into_iter()
            .map(|branch| NativeField::new(branch.name, branch.type_name).private(branch.private))
            .collect();
        Ok(Self {
            location: path.display().to_string(),
            table: found.name,
            fields,
            entries: found.entries,
        })
    }
}

impl StoreAccessor for LegacyYamlStore {
    fn origin(&self) -> Origin {
        Origin::Legacy
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn object_name(&self) -> &str {
        &self.table
    }

    fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    fn native_fields(&self) -> &[NativeField] {
        &self.fields
    }

    fn read_entry(&self, field: &str, tag: &TypeTag, entry: u64) -> Result<Option<Cell>> {
        let fail = |reason: String| ReconcileError::field_read(Origin::Legacy, field, entry, reason);
        let record = usize::try_from(entry)
            .ok()
            .and_then(|index| self.entries.get(index))
            .ok_or_else(|| fail(format!("entry is out of range (0..{})", self.entries.len())))?;
        let Some(record) = record else {
            return Ok(None);
        };
        let value = record
            .get(field)
            .ok_or_else(|| fail("record has no value for this branch".to_string()))?;
        value.to_cell(tag).map(Some).map_err(fail)
    }
}
