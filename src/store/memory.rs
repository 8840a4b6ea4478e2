use super::{Cell, NativeField, Scalar, StoreAccessor};
use crate::{
    error::{ReconcileError, Result},
    types::{Origin, TypeTag},
};

#[derive(Debug, Clone)]
struct MemoryField {
    field: NativeField,
    entries: Vec<Option<Cell>>,
}

/// Store held entirely in memory, for callers that already decoded their data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    origin: Origin,
    name: String,
    entry_count: Option<u64>,
    fields: Vec<MemoryField>,
    native: Vec<NativeField>,
}

impl MemoryStore {
    pub fn new(origin: Origin, name: impl Into<String>) -> Self {
        Self {
            origin,
            name: name.into(),
            entry_count: None,
            fields: Vec::new(),
            native: Vec::new(),
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        entries: Vec<Option<Cell>>,
    ) -> Self {
        let field = NativeField::new(name, type_name);
        self.native.push(field.clone());
        self.fields.push(MemoryField { field, entries });
        self
    }

    /// Adds a scalar field with one filled value per entry.
    pub fn with_scalars(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        values: impl IntoIterator<Item = Scalar>,
    ) -> Self {
        let entries = values
            .into_iter()
            .map(|value| Some(Cell::Scalar(value)))
            .collect();
        self.with_field(name, type_name, entries)
    }

    /// Overrides the entry count, which otherwise is the longest field.
    pub fn with_entry_count(mut self, entry_count: u64) -> Self {
        self.entry_count = Some(entry_count);
        self
    }
}

impl StoreAccessor for MemoryStore {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn location(&self) -> &str {
        "memory"
    }

    fn object_name(&self) -> &str {
        &self.name
    }

    fn entry_count(&self) -> u64 {
        self.entry_count.unwrap_or_else(|| {
            self.fields
                .iter()
                .map(|field| field.entries.len() as u64)
                .max()
                .unwrap_or(0)
        })
    }

    fn native_fields(&self) -> &[NativeField] {
        &self.native
    }

    fn read_entry(&self, field: &str, tag: &TypeTag, entry: u64) -> Result<Option<Cell>> {
        let fail = |reason: String| ReconcileError::field_read(self.origin, field, entry, reason);
        if entry >= self.entry_count() {
            return Err(fail(format!("entry is out of range (0..{})", self.entry_count())));
        }
        let stored = self
            .fields
            .iter()
            .find(|candidate| candidate.field.name == field)
            .ok_or_else(|| fail("no such field".to_string()))?;
        let cell = usize::try_from(entry)
            .ok()
            .and_then(|index| stored.entries.get(index))
            .ok_or_else(|| fail("field holds fewer entries than the store".to_string()))?;
        let Some(cell) = cell else {
            return Ok(None);
        };
        let expected = tag
            .element_kind()
            .ok_or_else(|| fail(format!("type {tag} cannot be read as values")))?;
        let consistent = match (tag, cell) {
            (TypeTag::SequenceOf(_), Cell::Sequence(items)) => {
                items.iter().all(|item| item.kind() == expected)
            }
            (TypeTag::SequenceOf(_), Cell::Scalar(_)) | (_, Cell::Sequence(_)) => false,
            (_, Cell::Scalar(value)) => value.kind() == expected,
        };
        if !consistent {
            return Err(fail(format!("stored value does not match type {tag}")));
        }
        Ok(Some(cell.clone()))
    }
}
