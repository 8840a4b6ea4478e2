//! Name-based field matching across the two stores.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::types::NO_MATCH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCorrespondence {
    #[serde(serialize_with = "name_or_no_match")]
    pub legacy_name: Option<String>,
    #[serde(serialize_with = "name_or_no_match")]
    pub columnar_name: Option<String>,
}

fn name_or_no_match<S>(name: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(name.as_deref().unwrap_or(NO_MATCH))
}

impl FieldCorrespondence {
    pub fn matched(name: &str) -> Self {
        Self {
            legacy_name: Some(name.to_string()),
            columnar_name: Some(name.to_string()),
        }
    }

    pub fn legacy_only(name: &str) -> Self {
        Self {
            legacy_name: Some(name.to_string()),
            columnar_name: None,
        }
    }

    pub fn columnar_only(name: &str) -> Self {
        Self {
            legacy_name: None,
            columnar_name: Some(name.to_string()),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.legacy_name.is_some() && self.columnar_name.is_some()
    }

    /// The name to report this correspondence under.
    pub fn display_name(&self) -> &str {
        self.legacy_name
            .as_deref()
            .or(self.columnar_name.as_deref())
            .unwrap_or(NO_MATCH)
    }
}

/// Pairs legacy fields with columnar fields by name.
///
/// Legacy fields drive the pass in declaration order; every columnar name is
/// consumed by at most one match. Columnar names left over afterwards follow
/// in their own declaration order.
pub fn match_fields<L, C>(legacy: &[L], columnar: &[C]) -> Vec<FieldCorrespondence>
where
    L: AsRef<str>,
    C: AsRef<str>,
{
    let mut remaining = columnar
        .iter()
        .map(|name| Some(name.as_ref()))
        .collect::<Vec<_>>();
    let mut lookup = HashMap::with_capacity(columnar.len());
    for (position, name) in columnar.iter().enumerate() {
        lookup.entry(name.as_ref()).or_insert(position);
    }

    let mut correspondences = Vec::with_capacity(legacy.len() + columnar.len());
    for name in legacy {
        let name = name.as_ref();
        match lookup.remove(name) {
            Some(position) => {
                remaining[position] = None;
                correspondences.push(FieldCorrespondence::matched(name));
            }
            None => correspondences.push(FieldCorrespondence::legacy_only(name)),
        }
    }
    correspondences.extend(
        remaining
            .into_iter()
            .flatten()
            .map(FieldCorrespondence::columnar_only),
    );
    correspondences
}

pub fn names_match(correspondences: &[FieldCorrespondence]) -> bool {
    correspondences.iter().all(FieldCorrespondence::is_matched)
}
