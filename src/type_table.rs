//! Native type spellings and the near-match relation, kept as plain data.
//!
//! The defaults cover the spellings produced by the legacy row store
//! (`Int_t`, `Float_t`, `vector<int>`, ...) and by the columnar store
//! (`std::int32_t`, `float`, `std::vector<float>`, ...). Additional spellings
//! can be loaded from a YAML file without touching the classifier:
//!
//! ```yaml
//! spellings:
//!   Long64_t: int32
//!   ROOT::RVec<float>: sequence<float32>
//! near:
//!   - [int32, float64]
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path, str::FromStr};

use log::debug;
use serde::Deserialize;

use crate::{
    error::{ReconcileError, Result},
    types::TypeTag,
};

const DEFAULT_SPELLINGS: &[(&str, &str)] = &[
    ("Int_t", "int32"),
    ("int", "int32"),
    ("int32_t", "int32"),
    ("std::int32_t", "int32"),
    ("Float_t", "float32"),
    ("float", "float32"),
    ("Double_t", "float64"),
    ("double", "float64"),
    ("Bool_t", "bool"),
    ("bool", "bool"),
    ("vector<int>", "sequence<int32>"),
    ("std::vector<int>", "sequence<int32>"),
    ("std::vector<std::int32_t>", "sequence<int32>"),
    ("vector<float>", "sequence<float32>"),
    ("std::vector<float>", "sequence<float32>"),
    ("vector<double>", "sequence<float64>"),
    ("std::vector<double>", "sequence<float64>"),
    ("vector<bool>", "sequence<bool>"),
    ("std::vector<bool>", "sequence<bool>"),
];

const DEFAULT_NEAR_PAIRS: &[(&str, &str)] = &[
    ("float32", "float64"),
    ("sequence<float32>", "sequence<float64>"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellingRule {
    pub native: String,
    pub canonical: TypeTag,
}

#[derive(Debug, Clone)]
pub struct TypeTable {
    spellings: Vec<SpellingRule>,
    near: Vec<(TypeTag, TypeTag)>,
}

/// YAML overlay for the built-in table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeTableConfig {
    #[serde(default)]
    pub replace_defaults: bool,
    #[serde(default)]
    pub spellings: BTreeMap<String, TypeTag>,
    #[serde(default)]
    pub near: Vec<(TypeTag, TypeTag)>,
}

impl Default for TypeTable {
    fn default() -> Self {
        let spellings = DEFAULT_SPELLINGS
            .iter()
            .map(|(native, canonical)| SpellingRule {
                native: (*native).to_string(),
                canonical: parse_builtin(canonical),
            })
            .collect();
        let near = DEFAULT_NEAR_PAIRS
            .iter()
            .map(|(left, right)| (parse_builtin(left), parse_builtin(right)))
            .collect();
        Self { spellings, near }
    }
}

fn parse_builtin(token: &str) -> TypeTag {
    TypeTag::from_str(token).unwrap_or(TypeTag::Unknown)
}

impl TypeTable {
    pub fn spellings(&self) -> &[SpellingRule] {
        &self.spellings
    }

    pub fn near_pairs(&self) -> &[(TypeTag, TypeTag)] {
        &self.near
    }

    /// Adds a spelling rule. Later rules take precedence over earlier ones.
    pub fn add_spelling(&mut self, native: impl Into<String>, canonical: TypeTag) {
        self.spellings.push(SpellingRule {
            native: native.into(),
            canonical,
        });
    }

    pub fn add_near_pair(&mut self, left: TypeTag, right: TypeTag) {
        self.near.push((left, right));
    }

    pub fn canonicalize(&self, native: &str) -> TypeTag {
        let native = native.trim();
        self.spellings
            .iter()
            .rev()
            .find(|rule| rule.native == native)
            .map(|rule| rule.canonical.clone())
            .unwrap_or(TypeTag::Unknown)
    }

    /// Symmetric near-match lookup.
    pub fn is_near(&self, left: &TypeTag, right: &TypeTag) -> bool {
        self.near
            .iter()
            .any(|(a, b)| (a == left && b == right) || (a == right && b == left))
    }

    pub fn apply(&mut self, config: TypeTableConfig) {
        if config.replace_defaults {
            self.spellings.clear();
            self.near.clear();
        }
        for (native, canonical) in config.spellings {
            self.add_spelling(native, canonical);
        }
        for (left, right) in config.near {
            self.add_near_pair(left, right);
        }
    }

    /// Builds the default table and applies the YAML overlay at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            ReconcileError::TypeTable(format!("Opening type table {path:?}: {err}"))
        })?;
        let config: TypeTableConfig = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| ReconcileError::TypeTable(format!("Parsing {path:?}: {err}")))?;
        let mut table = TypeTable::default();
        debug!(
            "Applying {} spelling(s) and {} near pair(s) from {:?}",
            config.spellings.len(),
            config.near.len(),
            path
        );
        table.apply(config);
        Ok(table)
    }
}
