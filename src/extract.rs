//! Value extraction into canonical, flattened buffers.
//!
//! Every public field with a scalar or one-level sequence type is read record
//! by record. Values land in the buffer of the field's element kind, in
//! field-then-record order; sequence values are flattened in record order and
//! then element order, so a `sequence<int32>` field and an `int32` field feed
//! the same buffer. Records that were never filled contribute nothing, which
//! is why buffer lengths and entry counts are compared separately.

use log::{debug, warn};
use serde::Serialize;

use crate::{
    error::{ReconcileError, Result},
    store::{Cell, Scalar, StoreAccessor},
    types::{FieldDescriptor, Origin, ScalarKind, Shape},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedBuffers {
    pub int32: Vec<i32>,
    pub float32: Vec<f32>,
    pub float64: Vec<f64>,
    pub boolean: Vec<bool>,
}

impl TypedBuffers {
    pub fn len(&self, kind: ScalarKind) -> usize {
        match kind {
            ScalarKind::Int32 => self.int32.len(),
            ScalarKind::Float32 => self.float32.len(),
            ScalarKind::Float64 => self.float64.len(),
            ScalarKind::Bool => self.boolean.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ScalarKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    fn append(&mut self, buffer: ValueBuffer) {
        match buffer {
            ValueBuffer::Int32(values) => self.int32.extend(values),
            ValueBuffer::Float32(values) => self.float32.extend(values),
            ValueBuffer::Float64(values) => self.float64.extend(values),
            ValueBuffer::Bool(values) => self.boolean.extend(values),
        }
    }
}

/// Values of a single field while it is being read.
#[derive(Debug, Clone, PartialEq)]
enum ValueBuffer {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
}

impl ValueBuffer {
    fn new(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int32 => ValueBuffer::Int32(Vec::new()),
            ScalarKind::Float32 => ValueBuffer::Float32(Vec::new()),
            ScalarKind::Float64 => ValueBuffer::Float64(Vec::new()),
            ScalarKind::Bool => ValueBuffer::Bool(Vec::new()),
        }
    }

    fn push(&mut self, value: Scalar) -> std::result::Result<(), String> {
        match (self, value) {
            (ValueBuffer::Int32(values), Scalar::Int32(v)) => values.push(v),
            (ValueBuffer::Float32(values), Scalar::Float32(v)) => values.push(v),
            (ValueBuffer::Float64(values), Scalar::Float64(v)) => values.push(v),
            (ValueBuffer::Bool(values), Scalar::Bool(v)) => values.push(v),
            (_, other) => return Err(format!("unexpected {} value", other.kind())),
        }
        Ok(())
    }
}

/// What was read from one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldExtract {
    pub origin: Origin,
    pub name: String,
    pub kind: ScalarKind,
    pub shape: Shape,
    pub entries_filled: u64,
    pub elements: usize,
    /// Per-record sequence lengths, in record order (empty for scalars).
    #[serde(skip)]
    pub record_lengths: Vec<usize>,
}

/// A field that could not be extracted; the run carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub origin: Origin,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub buffers: TypedBuffers,
    pub fields: Vec<FieldExtract>,
    pub failures: Vec<FieldFailure>,
}

/// Concatenates records in order and remembers each record's length.
pub fn flatten<T: Clone>(records: &[Vec<T>]) -> (Vec<T>, Vec<usize>) {
    let lengths = records.iter().map(Vec::len).collect();
    let flat = records.iter().flatten().cloned().collect();
    (flat, lengths)
}

/// Inverse of [`flatten`]. `None` when the lengths do not cover `flat` exactly.
pub fn split<T: Clone>(flat: &[T], lengths: &[usize]) -> Option<Vec<Vec<T>>> {
    let mut records = Vec::with_capacity(lengths.len());
    let mut rest = flat;
    for length in lengths {
        if *length > rest.len() {
            return None;
        }
        let (head, tail) = rest.split_at(*length);
        records.push(head.to_vec());
        rest = tail;
    }
    rest.is_empty().then_some(records)
}

fn read_field(
    store: &dyn StoreAccessor,
    field: &FieldDescriptor,
    kind: ScalarKind,
) -> Result<(ValueBuffer, FieldExtract)> {
    let mut buffer = ValueBuffer::new(kind);
    let mut extract = FieldExtract {
        origin: store.origin(),
        name: field.name.clone(),
        kind,
        shape: field.shape,
        entries_filled: 0,
        elements: 0,
        record_lengths: Vec::new(),
    };
    for entry in 0..store.entry_count() {
        let Some(cell) = store.read_entry(&field.name, &field.canonical_type, entry)? else {
            continue;
        };
        extract.entries_filled += 1;
        let fail =
            |reason: String| ReconcileError::field_read(store.origin(), &field.name, entry, reason);
        match cell {
            Cell::Scalar(value) => {
                buffer.push(value).map_err(fail)?;
                extract.elements += 1;
            }
            Cell::Sequence(items) => {
                extract.record_lengths.push(items.len());
                extract.elements += items.len();
                for value in items {
                    buffer.push(value).map_err(fail)?;
                }
            }
        }
    }
    Ok((buffer, extract))
}

/// Extracts every public field of `store` into per-kind buffers.
///
/// Field-level read failures discard that field's values and are recorded in
/// [`Extraction::failures`]; any other error aborts.
pub fn extract(store: &dyn StoreAccessor, fields: &[FieldDescriptor]) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    for field in fields {
        let Some(kind) = field.canonical_type.element_kind() else {
            if field.canonical_type.is_known() {
                debug!(
                    "Skipping {} field '{}': nested type {} has no flat buffer",
                    store.origin(),
                    field.name,
                    field.canonical_type
                );
                continue;
            }
            let err = ReconcileError::TypeMappingMissing {
                origin: store.origin(),
                field: field.name.clone(),
                spelling: field.native_type.clone(),
            };
            warn!("{err}");
            extraction.failures.push(FieldFailure {
                origin: store.origin(),
                field: field.name.clone(),
                reason: err.to_string(),
            });
            continue;
        };
        match read_field(store, field, kind) {
            Ok((buffer, summary)) => {
                debug!(
                    "Extracted {} {} value(s) from {} field '{}' ({} filled entr(ies))",
                    summary.elements,
                    kind,
                    store.origin(),
                    field.name,
                    summary.entries_filled
                );
                extraction.buffers.append(buffer);
                extraction.fields.push(summary);
            }
            Err(err) if err.is_field_level() => {
                warn!("{err}");
                extraction.failures.push(FieldFailure {
                    origin: store.origin(),
                    field: field.name.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(extraction)
}

impl Extraction {
    pub fn field(&self, name: &str) -> Option<&FieldExtract> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FieldExtract {
    pub fn is_sequence(&self) -> bool {
        self.shape == Shape::Sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{MemoryStore, describe},
        type_table::TypeTable,
    };
    use proptest::prelude::*;

    fn ints(values: &[i32]) -> Option<Cell> {
        Some(Cell::Sequence(values.iter().copied().map(Scalar::Int32).collect()))
    }

    #[test]
    fn scalars_and_sequences_share_a_buffer_in_field_then_record_order() {
        let store = MemoryStore::new(Origin::Legacy, "tree")
            .with_scalars("value", "Int_t", [Scalar::Int32(1), Scalar::Int32(2)])
            .with_field("hits", "vector<int>", vec![ints(&[10, 11]), ints(&[12])]);
        let fields = describe(&store, &TypeTable::default()).expect("describe");
        let extraction = extract(&store, &fields).expect("extract");
        assert_eq!(extraction.buffers.int32, vec![1, 2, 10, 11, 12]);
        let hits = extraction.field("hits").expect("hits summary");
        assert!(hits.is_sequence());
        assert_eq!(hits.record_lengths, vec![2, 1]);
        assert_eq!(hits.elements, 3);
        assert!(extraction.failures.is_empty());
    }

    #[test]
    fn unfilled_records_contribute_nothing() {
        let store = MemoryStore::new(Origin::Legacy, "tree").with_field(
            "value",
            "Int_t",
            vec![
                Some(Cell::Scalar(Scalar::Int32(0))),
                None,
                Some(Cell::Scalar(Scalar::Int32(2))),
            ],
        );
        let fields = describe(&store, &TypeTable::default()).expect("describe");
        let extraction = extract(&store, &fields).expect("extract");
        assert_eq!(extraction.buffers.int32, vec![0, 2]);
        assert_eq!(extraction.fields[0].entries_filled, 2);
    }

    #[test]
    fn failing_field_is_recorded_and_others_continue() {
        let store = MemoryStore::new(Origin::Columnar, "ntuple")
            .with_scalars("broken", "float", [Scalar::Int32(1)])
            .with_scalars("weight", "float", [Scalar::Float32(0.5)])
            .with_scalars("id", "std::int64_t", [Scalar::Int32(7)]);
        let fields = describe(&store, &TypeTable::default()).expect("describe");
        let extraction = extract(&store, &fields).expect("extract");
        assert_eq!(extraction.buffers.float32, vec![0.5]);
        assert!(extraction.buffers.int32.is_empty());
        let failed = extraction
            .failures
            .iter()
            .map(|failure| failure.field.as_str())
            .collect::<Vec<_>>();
        assert_eq!(failed, vec!["broken", "id"]);
        assert!(extraction.failures[1].reason.contains("std::int64_t"));
    }

    #[test]
    fn empty_store_yields_empty_buffers() {
        let store = MemoryStore::new(Origin::Legacy, "tree");
        let extraction = extract(&store, &[]).expect("extract");
        assert!(extraction.buffers.is_empty());
    }

    #[test]
    fn split_rejects_lengths_that_do_not_cover_the_buffer() {
        assert_eq!(split(&[1, 2, 3], &[1, 1]), None);
        assert_eq!(split(&[1, 2, 3], &[2, 2]), None);
        assert_eq!(split::<i32>(&[], &[0, 0]), Some(vec![vec![], vec![]]));
    }

    proptest! {
        #[test]
        fn flatten_then_split_recovers_records(
            records in proptest::collection::vec(proptest::collection::vec(any::<i32>(), 0..6), 0..12)
        ) {
            let (flat, lengths) = flatten(&records);
            prop_assert_eq!(flat.len(), lengths.iter().sum::<usize>());
            prop_assert_eq!(split(&flat, &lengths), Some(records));
        }
    }
}
