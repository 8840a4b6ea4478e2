//! Columnar store backed by a JSON document.
//!
//! Every field set declares its entry count once; each field stores one
//! column. Sequence columns keep cumulative end offsets per entry next to the
//! flattened item values, and boolean sequences may pack their items into
//! bits. The synthetic `_0` item fields of sequences are listed but private.
//!
//! ```json
//! { "field_sets": [ { "name": "ntuple", "entries": 2, "fields": [
//!     { "name": "value", "type": "std::int32_t", "column": { "values": [0, 1] } },
//!     { "name": "hits", "type": "std::vector<float>",
//!       "column": { "offsets": [2, 3], "values": [0.5, 1.5, 2.5] } },
//!     { "name": "flags", "type": "std::vector<bool>",
//!       "column": { "offsets": [1, 3], "bits": [5] } },
//!     { "name": "_0", "type": "float" } ] } ] }
//! ```

use std::{fs::File, io::BufReader, ops::Range, path::Path};

use log::debug;
use serde::Deserialize;

use super::{Cell, NativeField, Scalar, StoreAccessor, bits, raw::RawCell};
use crate::{
    error::{ReconcileError, Result},
    types::{Origin, ScalarKind, TypeTag},
};

#[derive(Debug, Deserialize)]
struct ColumnarDocument {
    #[serde(default)]
    field_sets: Vec<FieldSet>,
}

#[derive(Debug, Deserialize)]
struct FieldSet {
    name: String,
    entries: u64,
    #[serde(default)]
    fields: Vec<ColumnField>,
}

#[derive(Debug, Deserialize)]
struct ColumnField {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    column: Option<Column>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Column {
    PackedSequence { offsets: Vec<u64>, bits: Vec<u8> },
    Sequence { offsets: Vec<u64>, values: Vec<RawCell> },
    Scalar { values: Vec<RawCell> },
}

#[derive(Debug)]
pub struct ColumnarStore {
    location: String,
    name: String,
    entries: u64,
    fields: Vec<NativeField>,
    columns: Vec<Option<Column>>,
}

impl ColumnarStore {
    pub fn open(path: &Path, name: &str) -> Result<Self> {
        let not_found = |reason: String| ReconcileError::StoreNotFound {
            origin: Origin::Columnar,
            path: path.to_path_buf(),
            object: name.to_string(),
            reason,
        };
        let file = File::open(path).map_err(|err| not_found(err.to_string()))?;
        let document: ColumnarDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| not_found(format!("not a columnar store: {err}")))?;
        let field_set = document
            .field_sets
            .into_iter()
            .find(|candidate| candidate.name == name)
            .ok_or_else(|| ReconcileError::FieldSetNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            })?;
        debug!(
            "Opened columnar field set '{}' in {:?}: {} field(s), {} entr(ies)",
            field_set.name,
            path,
            field_set.fields.len(),
            field_set.entries
        );
        let (fields, columns) = field_set
            .fields
            .into_iter()
            .map(|field| {
                (
                    NativeField::new(field.name, field.type_name).private(field.private),
                    field.column,
                )
            })
            .unzip();
        Ok(Self {
            location: path.display().to_string(),
            name: field_set.name,
            entries: field_set.entries,
            fields,
            columns,
        })
    }
}

/// Item range of `entry` given cumulative end offsets.
fn item_range(offsets: &[u64], entry: usize) -> std::result::Result<Range<usize>, String> {
    let end = *offsets
        .get(entry)
        .ok_or_else(|| format!("offset column has only {} entr(ies)", offsets.len()))?;
    let start = match entry {
        0 => 0,
        _ => offsets[entry - 1],
    };
    if start > end {
        return Err(format!("offsets decrease at entry {entry} ({start} > {end})"));
    }
    let start = usize::try_from(start).map_err(|err| err.to_string())?;
    let end = usize::try_from(end).map_err(|err| err.to_string())?;
    Ok(start..end)
}

fn read_column(column: &Column, tag: &TypeTag, entry: usize) -> std::result::Result<Cell, String> {
    let kind = tag
        .element_kind()
        .ok_or_else(|| format!("type {tag} cannot be read as values"))?;
    match (tag, column) {
        (TypeTag::SequenceOf(_), Column::PackedSequence { offsets, bits }) => {
            if kind != ScalarKind::Bool {
                return Err(format!("packed bits cannot hold {tag}"));
            }
            let range = item_range(offsets, entry)?;
            bits::unpack_range(bits, range.start, range.end)
                .map(|values| Cell::Sequence(values.into_iter().map(Scalar::Bool).collect()))
                .map_err(|err| err.to_string())
        }
        (TypeTag::SequenceOf(_), Column::Sequence { offsets, values }) => {
            let range = item_range(offsets, entry)?;
            let items = values.get(range.clone()).ok_or_else(|| {
                format!(
                    "items {}..{} exceed the {} stored value(s)",
                    range.start,
                    range.end,
                    values.len()
                )
            })?;
            items
                .iter()
                .map(|item| item.to_scalar(kind))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Cell::Sequence)
        }
        (TypeTag::SequenceOf(_), Column::Scalar { .. }) => {
            Err(format!("{tag} field is stored as a scalar column"))
        }
        (_, Column::Scalar { values }) => values
            .get(entry)
            .ok_or_else(|| format!("column is truncated at {} value(s)", values.len()))?
            .to_scalar(kind)
            .map(Cell::Scalar),
        (_, _) => Err(format!("{tag} field is stored as a sequence column")),
    }
}

impl StoreAccessor for ColumnarStore {
    fn origin(&self) -> Origin {
        Origin::Columnar
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn object_name(&self) -> &str {
        &self.name
    }

    fn entry_count(&self) -> u64 {
        self.entries
    }

    fn native_fields(&self) -> &[NativeField] {
        &self.fields
    }

    fn read_entry(&self, field: &str, tag: &TypeTag, entry: u64) -> Result<Option<Cell>> {
        let fail =
            |reason: String| ReconcileError::field_read(Origin::Columnar, field, entry, reason);
        if entry >= self.entries {
            return Err(fail(format!("entry is out of range (0..{})", self.entries)));
        }
        let index = self
            .fields
            .iter()
            .position(|candidate| candidate.name == field)
            .ok_or_else(|| fail("no such field".to_string()))?;
        let column = self.columns[index]
            .as_ref()
            .ok_or_else(|| fail("field has no column data".to_string()))?;
        let entry_index = usize::try_from(entry).map_err(|err| fail(err.to_string()))?;
        read_column(column, tag, entry_index).map(Some).map_err(fail)
    }
}
