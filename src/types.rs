//! Canonical type model shared by every stage of a reconciliation run.
//!
//! Each store spells its types natively (`Int_t`, `std::int32_t`,
//! `vector<float>`, ...). The [`crate::type_table`] module maps those spellings
//! onto [`TypeTag`], which is what the matcher, classifier and extractor reason
//! about.

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub const NO_MATCH: &str = "No match";

/// Name of the synthetic item field that columnar sequence fields expose.
pub const PRIVATE_FIELD_NAME: &str = "_0";

pub fn is_private_field_name(name: &str) -> bool {
    name == PRIVATE_FIELD_NAME
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Legacy,
    Columnar,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Legacy => f.write_str("legacy"),
            Origin::Columnar => f.write_str("columnar"),
        }
    }
}

/// Element kind of a scalar or one-level sequence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Int32,
    Float32,
    Float64,
    Bool,
}

impl ScalarKind {
    /// Bucket order used by extraction and statistics.
    pub const ALL: [ScalarKind; 4] = [
        ScalarKind::Int32,
        ScalarKind::Float32,
        ScalarKind::Float64,
        ScalarKind::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Int32 => "int32",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int32,
    Float32,
    Float64,
    Bool,
    SequenceOf(Box<TypeTag>),
    Unknown,
}

impl TypeTag {
    pub fn sequence_of(inner: TypeTag) -> Self {
        TypeTag::SequenceOf(Box::new(inner))
    }

    pub fn is_known(&self) -> bool {
        match self {
            TypeTag::Unknown => false,
            TypeTag::SequenceOf(inner) => inner.is_known(),
            _ => true,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            TypeTag::SequenceOf(_) => Shape::Sequence,
            _ => Shape::Scalar,
        }
    }

    /// The scalar kind carried by this tag, for scalars and one-level
    /// sequences only. Nested sequences and unknown types have none.
    pub fn element_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeTag::Int32 => Some(ScalarKind::Int32),
            TypeTag::Float32 => Some(ScalarKind::Float32),
            TypeTag::Float64 => Some(ScalarKind::Float64),
            TypeTag::Bool => Some(ScalarKind::Bool),
            TypeTag::SequenceOf(inner) => match inner.as_ref() {
                TypeTag::SequenceOf(_) => None,
                other => other.element_kind(),
            },
            TypeTag::Unknown => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int32 => f.write_str("int32"),
            TypeTag::Float32 => f.write_str("float32"),
            TypeTag::Float64 => f.write_str("float64"),
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::SequenceOf(inner) => write!(f, "sequence<{inner}>"),
            TypeTag::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for TypeTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let lowered = token.to_ascii_lowercase();
        if let Some(rest) = lowered.strip_prefix("sequence<") {
            let inner = rest
                .strip_suffix('>')
                .ok_or_else(|| anyhow!("Unterminated sequence type '{token}'"))?;
            if inner.trim().is_empty() {
                bail!("Sequence type '{token}' is missing its element type");
            }
            return Ok(TypeTag::sequence_of(TypeTag::from_str(inner)?));
        }
        match lowered.as_str() {
            "int32" => Ok(TypeTag::Int32),
            "float32" => Ok(TypeTag::Float32),
            "float64" => Ok(TypeTag::Float64),
            "bool" => Ok(TypeTag::Bool),
            "unknown" => Ok(TypeTag::Unknown),
            _ => Err(anyhow!(
                "Unknown canonical type '{token}'. Supported: int32, float32, float64, bool, sequence<T>"
            )),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        TypeTag::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Scalar,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub native_type: String,
    pub canonical_type: TypeTag,
    pub shape: Shape,
    pub origin: Origin,
}
