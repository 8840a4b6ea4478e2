//! Element-level comparison of matched sequence fields.
//!
//! For every matched pair where at least one side holds a sequence, the
//! report lists the element type each store spells inside its container and
//! how many elements each side produced once flattened.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::{
    extract::Extraction,
    matcher::FieldCorrespondence,
    types::{FieldDescriptor, NO_MATCH, Shape, TypeTag},
};

static CONTAINER: OnceLock<Option<Regex>> = OnceLock::new();

fn container_pattern() -> Option<&'static Regex> {
    CONTAINER
        .get_or_init(|| Regex::new(r"^\s*(?:\w+::)*(?:vector|RVec)\s*<\s*(.+?)\s*>\s*$").ok())
        .as_ref()
}

/// Element spelling inside a `vector<...>` style container, if `native` is one.
pub fn element_spelling(native: &str) -> Option<&str> {
    container_pattern()?
        .captures(native)
        .and_then(|captures| captures.get(1))
        .map(|element| element.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceComparison {
    pub field_name: String,
    pub legacy_element_type: String,
    pub columnar_element_type: String,
    pub legacy_elements: Option<usize>,
    pub columnar_elements: Option<usize>,
    pub matches: bool,
}

fn side_element_type(field: &FieldDescriptor) -> String {
    match (&field.canonical_type, field.shape) {
        (TypeTag::SequenceOf(inner), Shape::Sequence) => element_spelling(&field.native_type)
            .map(str::to_string)
            .unwrap_or_else(|| inner.to_string()),
        _ => NO_MATCH.to_string(),
    }
}

/// Compares matched sequence fields using both stores' extraction summaries.
///
/// Element counts are `None` when that side's field could not be extracted.
/// A pair matches when both sides are sequences of the same element kind with
/// identical per-record lengths.
pub fn compare_sequences(
    correspondences: &[FieldCorrespondence],
    legacy_fields: &[FieldDescriptor],
    columnar_fields: &[FieldDescriptor],
    legacy_extraction: &Extraction,
    columnar_extraction: &Extraction,
) -> Vec<SequenceComparison> {
    correspondences
        .iter()
        .filter(|pair| pair.is_matched())
        .filter_map(|pair| {
            let name = pair.display_name();
            let legacy = legacy_fields.iter().find(|field| field.name == name)?;
            let columnar = columnar_fields.iter().find(|field| field.name == name)?;
            if legacy.shape != Shape::Sequence && columnar.shape != Shape::Sequence {
                return None;
            }
            let legacy_extract = legacy_extraction.field(name);
            let columnar_extract = columnar_extraction.field(name);
            let matches = match (legacy_extract, columnar_extract) {
                (Some(left), Some(right)) => {
                    left.is_sequence()
                        && right.is_sequence()
                        && left.kind == right.kind
                        && left.record_lengths == right.record_lengths
                }
                _ => false,
            };
            Some(SequenceComparison {
                field_name: name.to_string(),
                legacy_element_type: side_element_type(legacy),
                columnar_element_type: side_element_type(columnar),
                legacy_elements: legacy_extract.map(|field| field.elements),
                columnar_elements: columnar_extract.map(|field| field.elements),
                matches,
            })
        })
        .collect()
}
