//! Store accessors: the capability set the engine needs from either format.
//!
//! A backend only has to enumerate its fields with their native type
//! spellings and hand out typed values per field and entry index. The legacy
//! row store is backed by YAML documents or leaf-list CSV files, the columnar
//! store by JSON documents, and [`memory::MemoryStore`] serves embedding
//! callers and tests.

pub mod bits;
pub mod columnar;
pub mod legacy_csv;
pub mod legacy_yaml;
pub mod memory;
pub mod raw;

use std::path::Path;

use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{
    error::{ReconcileError, Result},
    type_table::TypeTable,
    types::{FieldDescriptor, Origin, ScalarKind, TypeTag, is_private_field_name},
};

pub use columnar::ColumnarStore;
pub use legacy_csv::LegacyCsvStore;
pub use legacy_yaml::LegacyYamlStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeField {
    pub name: String,
    pub type_name: String,
    pub private: bool,
}

impl NativeField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        let private = is_private_field_name(&name);
        Self {
            name,
            type_name: type_name.into(),
            private,
        }
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = self.private || private;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int32(i32),
    Float32(f32),
    Float64(f64),
    Bool(bool),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::Float32(_) => ScalarKind::Float32,
            Scalar::Float64(_) => ScalarKind::Float64,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }
}

/// Value of one field in one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
}

pub trait StoreAccessor {
    fn origin(&self) -> Origin;

    /// File path or other human readable location, used in diagnostics.
    fn location(&self) -> &str;

    /// Name of the table or field set inside the store.
    fn object_name(&self) -> &str;

    fn entry_count(&self) -> u64;

    /// Every field the store declares, private ones included.
    fn native_fields(&self) -> &[NativeField];

    fn private_fields(&self) -> Vec<&str> {
        self.native_fields()
            .iter()
            .filter(|field| field.private)
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Reads `field` at `entry`, converting to `tag`.
    ///
    /// Returns `Ok(None)` for records that were never filled.
    fn read_entry(&self, field: &str, tag: &TypeTag, entry: u64) -> Result<Option<Cell>>;
}

/// Public field descriptors of `store`, in declaration order.
pub fn describe(store: &dyn StoreAccessor, table: &TypeTable) -> Result<Vec<FieldDescriptor>> {
    let public = store
        .native_fields()
        .iter()
        .filter(|field| !field.private)
        .collect::<Vec<_>>();
    if let Some(name) = public.iter().map(|field| field.name.as_str()).duplicates().next() {
        return Err(ReconcileError::DuplicateField {
            origin: store.origin(),
            name: name.to_string(),
        });
    }
    let descriptors = public
        .into_iter()
        .map(|field| {
            let canonical_type = table.canonicalize(&field.type_name);
            FieldDescriptor {
                name: field.name.clone(),
                native_type: field.type_name.clone(),
                shape: canonical_type.shape(),
                canonical_type,
                origin: store.origin(),
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "{} store '{}' exposes {} public field(s), {} private",
        store.origin(),
        store.object_name(),
        descriptors.len(),
        store.private_fields().len()
    );
    Ok(descriptors)
}

/// Opens a legacy row-store table. `.csv` files use the leaf-list backend,
/// everything else is parsed as a YAML document.
pub fn open_legacy(path: &Path, table: &str) -> Result<Box<dyn StoreAccessor>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(Box::new(LegacyCsvStore::open(path, table)?))
    } else {
        Ok(Box::new(LegacyYamlStore::open(path, table)?))
    }
}

pub fn open_columnar(path: &Path, name: &str) -> Result<Box<dyn StoreAccessor>> {
    Ok(Box::new(ColumnarStore::open(path, name)?))
}
