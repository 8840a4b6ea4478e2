//! Cell representation shared by the document-based backends.
//!
//! YAML and JSON stores deserialize every stored value into [`RawCell`]; the
//! typed conversion happens on read, against the canonical type the caller
//! asks for. Values of no known shape are kept as [`RawCell::Other`] so that
//! only the field holding them fails to read.

use serde::Deserialize;

use super::{Cell, Scalar, bits};
use crate::types::{ScalarKind, TypeTag};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<RawCell>),
    Packed(PackedBits),
    Other(serde_json::Value),
}

/// Bit-packed boolean sequence: `len` values stored LSB-first in `bits`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackedBits {
    pub len: usize,
    pub bits: Vec<u8>,
}

impl RawCell {
    fn describe(&self) -> &'static str {
        match self {
            RawCell::Bool(_) => "boolean",
            RawCell::Int(_) => "integer",
            RawCell::Float(_) => "float",
            RawCell::List(_) => "list",
            RawCell::Packed(_) => "packed bits",
            RawCell::Other(serde_json::Value::Null) => "null",
            RawCell::Other(serde_json::Value::String(_)) => "string",
            RawCell::Other(serde_json::Value::Object(_)) => "mapping",
            RawCell::Other(_) => "unsupported value",
        }
    }

    pub fn to_scalar(&self, kind: ScalarKind) -> Result<Scalar, String> {
        match (kind, self) {
            (ScalarKind::Int32, RawCell::Int(value)) => i32::try_from(*value)
                .map(Scalar::Int32)
                .map_err(|_| format!("{value} does not fit in int32")),
            (ScalarKind::Float32, RawCell::Float(value)) => Ok(Scalar::Float32(*value as f32)),
            (ScalarKind::Float32, RawCell::Int(value)) => Ok(Scalar::Float32(*value as f32)),
            (ScalarKind::Float64, RawCell::Float(value)) => Ok(Scalar::Float64(*value)),
            (ScalarKind::Float64, RawCell::Int(value)) => Ok(Scalar::Float64(*value as f64)),
            (ScalarKind::Bool, RawCell::Bool(value)) => Ok(Scalar::Bool(*value)),
            (ScalarKind::Bool, RawCell::Int(value @ (0 | 1))) => Ok(Scalar::Bool(*value == 1)),
            (kind, other) => Err(format!(
                "expected a {kind} value but found {}",
                other.describe()
            )),
        }
    }

    /// Converts a stored record value into a typed [`Cell`].
    pub fn to_cell(&self, tag: &TypeTag) -> Result<Cell, String> {
        let kind = tag
            .element_kind()
            .ok_or_else(|| format!("type {tag} cannot be read as values"))?;
        match (tag, self) {
            (TypeTag::SequenceOf(_), RawCell::List(items)) => items
                .iter()
                .map(|item| item.to_scalar(kind))
                .collect::<Result<Vec<_>, _>>()
                .map(Cell::Sequence),
            (TypeTag::SequenceOf(_), RawCell::Packed(packed)) if kind == ScalarKind::Bool => {
                bits::unpack(&packed.bits, packed.len)
                    .map(|values| Cell::Sequence(values.into_iter().map(Scalar::Bool).collect()))
                    .map_err(|err| err.to_string())
            }
            (TypeTag::SequenceOf(_), other) => Err(format!(
                "expected a {tag} value but found {}",
                other.describe()
            )),
            (_, scalar) => scalar.to_scalar(kind).map(Cell::Scalar),
        }
    }
}
