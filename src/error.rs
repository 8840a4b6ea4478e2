use std::path::PathBuf;

use crate::types::Origin;

/// Failures raised while opening stores or reading their fields.
///
/// Store-level variants abort a reconciliation run. Field-level variants
/// (see [`ReconcileError::is_field_level`]) are folded into the report instead.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Cannot open '{object}' in {origin} store {path:?}: {reason}")]
    StoreNotFound {
        origin: Origin,
        path: PathBuf,
        object: String,
        reason: String,
    },
    #[error("Cannot find table '{table}' in legacy store {path:?}")]
    TableNotFound { table: String, path: PathBuf },
    #[error("Cannot find field set '{name}' in columnar store {path:?}")]
    FieldSetNotFound { name: String, path: PathBuf },
    #[error("Field '{name}' is declared more than once in the {origin} store")]
    DuplicateField { origin: Origin, name: String },
    #[error("Failed to read field '{field}' of the {origin} store at entry {entry}: {reason}")]
    FieldRead {
        origin: Origin,
        field: String,
        entry: u64,
        reason: String,
    },
    #[error("Field '{field}' of the {origin} store has no canonical type for '{spelling}'")]
    TypeMappingMissing {
        origin: Origin,
        field: String,
        spelling: String,
    },
    #[error("Invalid type table: {0}")]
    TypeTable(String),
}

impl ReconcileError {
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            ReconcileError::FieldRead { .. } | ReconcileError::TypeMappingMissing { .. }
        )
    }

    pub(crate) fn field_read(
        origin: Origin,
        field: &str,
        entry: u64,
        reason: impl Into<String>,
    ) -> Self {
        ReconcileError::FieldRead {
            origin,
            field: field.to_string(),
            entry,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
