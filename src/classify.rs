//! Three-tier type compatibility between matched fields.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{
    matcher::FieldCorrespondence,
    type_table::TypeTable,
    types::{FieldDescriptor, NO_MATCH, TypeTag},
};

/// Ordered from best to worst; the overall verdict of a run is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Exact,
    Near,
    Mismatch,
    Missing,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Exact => "exact",
            Severity::Near => "near",
            Severity::Mismatch => "mismatch",
            Severity::Missing => "missing",
        }
    }

    /// Verdict wording used when the severity summarises a whole run.
    pub fn verdict(&self) -> &'static str {
        match self {
            Severity::Exact => "TRUE",
            Severity::Near => "NOT EXACTLY",
            Severity::Mismatch => "FALSE",
            Severity::Missing => "MISSING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeComparison {
    pub field_name: String,
    pub legacy_type: String,
    pub columnar_type: String,
    pub legacy_canonical: TypeTag,
    pub columnar_canonical: TypeTag,
    pub severity: Severity,
}

pub fn classify_pair(legacy: &TypeTag, columnar: &TypeTag, table: &TypeTable) -> Severity {
    if !legacy.is_known() || !columnar.is_known() {
        Severity::Missing
    } else if legacy == columnar {
        Severity::Exact
    } else if table.is_near(legacy, columnar) {
        Severity::Near
    } else {
        Severity::Mismatch
    }
}

fn find<'a>(fields: &'a [FieldDescriptor], name: Option<&str>) -> Option<&'a FieldDescriptor> {
    let name = name?;
    fields.iter().find(|field| field.name == name)
}

/// One comparison per correspondence, in correspondence order.
///
/// A side without a partner field has no type to map and therefore reports
/// `Missing`. Each field is judged on its own; a `Missing` field never hides
/// findings for the fields after it.
pub fn compare_types(
    correspondences: &[FieldCorrespondence],
    legacy_fields: &[FieldDescriptor],
    columnar_fields: &[FieldDescriptor],
    table: &TypeTable,
) -> Vec<TypeComparison> {
    correspondences
        .iter()
        .map(|pair| {
            let legacy = find(legacy_fields, pair.legacy_name.as_deref());
            let columnar = find(columnar_fields, pair.columnar_name.as_deref());
            let legacy_canonical = legacy
                .map(|field| field.canonical_type.clone())
                .unwrap_or(TypeTag::Unknown);
            let columnar_canonical = columnar
                .map(|field| field.canonical_type.clone())
                .unwrap_or(TypeTag::Unknown);
            TypeComparison {
                field_name: pair.display_name().to_string(),
                legacy_type: legacy
                    .map(|field| field.native_type.clone())
                    .unwrap_or_else(|| NO_MATCH.to_string()),
                columnar_type: columnar
                    .map(|field| field.native_type.clone())
                    .unwrap_or_else(|| NO_MATCH.to_string()),
                severity: classify_pair(&legacy_canonical, &columnar_canonical, table),
                legacy_canonical,
                columnar_canonical,
            }
        })
        .collect()
}

pub fn overall_severity(comparisons: &[TypeComparison]) -> Severity {
    comparisons
        .iter()
        .map(|comparison| comparison.severity)
        .max()
        .unwrap_or(Severity::Exact)
}
