//! Legacy row store backed by a leaf-list CSV file.
//!
//! The header declares every branch as `name/CODE` using the single-letter
//! leaf codes of the legacy format (`value/I,weight/F,energy/D,isNew/O`). A
//! bare name defaults to `Float_t`. The file holds exactly one table, named
//! after the file stem. A row whose cells are all empty was never filled.

use std::path::Path;

use csv::StringRecord;
use log::debug;

use super::{Cell, NativeField, Scalar, StoreAccessor};
use crate::{
    error::{ReconcileError, Result},
    types::{Origin, ScalarKind, TypeTag},
};

const LEAF_CODES: &[(char, &str)] = &[
    ('B', "Char_t"),
    ('b', "UChar_t"),
    ('S', "Short_t"),
    ('s', "UShort_t"),
    ('I', "Int_t"),
    ('i', "UInt_t"),
    ('F', "Float_t"),
    ('D', "Double_t"),
    ('L', "Long64_t"),
    ('l', "ULong64_t"),
    ('O', "Bool_t"),
    ('C', "Char_t*"),
];

pub fn leaf_type_name(code: char) -> Option<&'static str> {
    LEAF_CODES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}

fn parse_leaf_header(cell: &str) -> std::result::Result<NativeField, String> {
    let cell = cell.trim();
    match cell.rsplit_once('/') {
        Some((name, code)) => {
            let mut chars = code.chars();
            let type_name = match (chars.next(), chars.next()) {
                (Some(code), None) => leaf_type_name(code)
                    .ok_or_else(|| format!("unknown leaf code '{code}' in header '{cell}'"))?,
                _ => return Err(format!("malformed leaf descriptor '{cell}'")),
            };
            Ok(NativeField::new(name.trim(), type_name))
        }
        None => Ok(NativeField::new(cell, "Float_t")),
    }
}

#[derive(Debug)]
pub struct LegacyCsvStore {
    location: String,
    table: String,
    fields: Vec<NativeField>,
    rows: Vec<StringRecord>,
}

impl LegacyCsvStore {
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let not_found = |reason: String| ReconcileError::StoreNotFound {
            origin: Origin::Legacy,
            path: path.to_path_buf(),
            object: table.to_string(),
            reason,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|err| not_found(err.to_string()))?;
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        if stem != table {
            return Err(ReconcileError::TableNotFound {
                table: table.to_string(),
                path: path.to_path_buf(),
            });
        }
        let headers = reader
            .headers()
            .map_err(|err| not_found(format!("unreadable header: {err}")))?
            .clone();
        let fields = headers
            .iter()
            .map(parse_leaf_header)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(not_found)?;
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| not_found(format!("unreadable row: {err}")))?;
        debug!(
            "Opened leaf-list table '{}' in {:?}: {} branch(es), {} row(s)",
            stem,
            path,
            fields.len(),
            rows.len()
        );
        Ok(Self {
            location: path.display().to_string(),
            table: stem,
            fields,
            rows,
        })
    }
}

fn parse_cell(raw: &str, kind: ScalarKind) -> std::result::Result<Scalar, String> {
    let token = raw.trim();
    match kind {
        ScalarKind::Int32 => token
            .parse::<i32>()
            .map(Scalar::Int32)
            .map_err(|err| format!("'{token}' is not an int32: {err}")),
        ScalarKind::Float32 => token
            .parse::<f32>()
            .map(Scalar::Float32)
            .map_err(|err| format!("'{token}' is not a float32: {err}")),
        ScalarKind::Float64 => token
            .parse::<f64>()
            .map(Scalar::Float64)
            .map_err(|err| format!("'{token}' is not a float64: {err}")),
        ScalarKind::Bool => match token.to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(Scalar::Bool(true)),
            "0" | "false" => Ok(Scalar::Bool(false)),
            _ => Err(format!("'{token}' is not a boolean")),
        },
    }
}

impl StoreAccessor for LegacyCsvStore {
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
        self.rows.len() as u64
    }

    fn native_fields(&self) -> &[NativeField] {
        &self.fields
    }

    fn read_entry(&self, field: &str, tag: &TypeTag, entry: u64) -> Result<Option<Cell>> {
        let fail = |reason: String| ReconcileError::field_read(Origin::Legacy, field, entry, reason);
        let column = self
            .fields
            .iter()
            .position(|candidate| candidate.name == field)
            .ok_or_else(|| fail("no such branch".to_string()))?;
        let row = usize::try_from(entry)
            .ok()
            .and_then(|index| self.rows.get(index))
            .ok_or_else(|| fail(format!("entry is out of range (0..{})", self.rows.len())))?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return Ok(None);
        }
        let kind = match tag {
            TypeTag::SequenceOf(_) => {
                return Err(fail("leaf-list tables cannot hold sequences".to_string()));
            }
            other => other
                .element_kind()
                .ok_or_else(|| fail(format!("type {other} cannot be read as values")))?,
        };
        let raw = row
            .get(column)
            .ok_or_else(|| fail(format!("row holds only {} cell(s)", row.len())))?;
        parse_cell(raw, kind)
            .map(|scalar| Some(Cell::Scalar(scalar)))
            .map_err(fail)
    }
}
