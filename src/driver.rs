//! Reconciliation run: a strictly sequential pass over both stores.

use std::path::PathBuf;

use log::{debug, info};
use serde::Serialize;

use crate::{
    classify::{Severity, TypeComparison, compare_types, overall_severity},
    error::Result,
    extract::{Extraction, FieldExtract, FieldFailure, extract},
    matcher::{FieldCorrespondence, match_fields, names_match},
    sequences::{SequenceComparison, compare_sequences},
    stats::{StatsBucket, StatsComparison, aggregate, compare_buckets},
    store::{StoreAccessor, describe, open_columnar, open_legacy},
    type_table::TypeTable,
    types::{FieldDescriptor, Origin},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Opened,
    EntriesChecked,
    FieldsChecked,
    NamesMatched,
    TypesClassified,
    ValuesExtracted,
    StatsAggregated,
    Reported,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Opened => Some(Stage::EntriesChecked),
            Stage::EntriesChecked => Some(Stage::FieldsChecked),
            Stage::FieldsChecked => Some(Stage::NamesMatched),
            Stage::NamesMatched => Some(Stage::TypesClassified),
            Stage::TypesClassified => Some(Stage::ValuesExtracted),
            Stage::ValuesExtracted => Some(Stage::StatsAggregated),
            Stage::StatsAggregated => Some(Stage::Reported),
            Stage::Reported => None,
        }
    }
}

/// Where to find the two stores.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub legacy_path: PathBuf,
    pub legacy_table: String,
    pub columnar_path: PathBuf,
    pub columnar_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountComparison {
    pub legacy: u64,
    pub columnar: u64,
    pub matches: bool,
}

impl CountComparison {
    fn new(legacy: u64, columnar: u64) -> Self {
        Self {
            legacy,
            columnar,
            matches: legacy == columnar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub origin: Origin,
    pub location: String,
    pub object_name: String,
}

impl StoreSummary {
    fn of(store: &dyn StoreAccessor) -> Self {
        Self {
            origin: store.origin(),
            location: store.location().to_string(),
            object_name: store.object_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub legacy: StoreSummary,
    pub columnar: StoreSummary,
    pub entries: CountComparison,
    pub fields: CountComparison,
    pub correspondences: Vec<FieldCorrespondence>,
    pub names_match: bool,
    pub type_comparisons: Vec<TypeComparison>,
    pub type_verdict: Severity,
    pub sequence_comparisons: Vec<SequenceComparison>,
    pub legacy_fields: Vec<FieldExtract>,
    pub columnar_fields: Vec<FieldExtract>,
    pub failures: Vec<FieldFailure>,
    pub legacy_statistics: Vec<StatsBucket>,
    pub columnar_statistics: Vec<StatsBucket>,
    pub statistics: Vec<StatsComparison>,
}

impl ReconciliationReport {
    pub fn statistics_match(&self) -> bool {
        self.statistics.iter().all(|comparison| comparison.matches)
    }

    pub fn sequences_match(&self) -> bool {
        self.sequence_comparisons
            .iter()
            .all(|comparison| comparison.matches)
    }

    /// True when no divergence of any kind was found.
    pub fn is_consistent(&self) -> bool {
        self.entries.matches
            && self.fields.matches
            && self.names_match
            && self.type_verdict == Severity::Exact
            && self.sequences_match()
            && self.failures.is_empty()
            && self.statistics_match()
    }
}

pub struct Reconciler {
    legacy: Box<dyn StoreAccessor>,
    columnar: Box<dyn StoreAccessor>,
    table: TypeTable,
    stage: Stage,
}

impl Reconciler {
    /// Opens both stores; nothing is compared until [`Reconciler::run`].
    pub fn open(request: &ReconcileRequest, table: TypeTable) -> Result<Self> {
        let legacy = open_legacy(&request.legacy_path, &request.legacy_table)?;
        let columnar = open_columnar(&request.columnar_path, &request.columnar_name)?;
        Ok(Self::new(legacy, columnar, table))
    }

    pub fn new(
        legacy: Box<dyn StoreAccessor>,
        columnar: Box<dyn StoreAccessor>,
        table: TypeTable,
    ) -> Self {
        debug!(
            "Reconciling legacy '{}' ({}) against columnar '{}' ({})",
            legacy.object_name(),
            legacy.location(),
            columnar.object_name(),
            columnar.location()
        );
        Self {
            legacy,
            columnar,
            table,
            stage: Stage::Opened,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, to: Stage) {
        debug_assert_eq!(self.stage.next(), Some(to));
        debug!("Stage {:?} -> {:?}", self.stage, to);
        self.stage = to;
    }

    /// Runs every stage and returns the report. The stores are released when
    /// this returns, whatever the outcome.
    pub fn run(mut self) -> Result<ReconciliationReport> {
        let entries = CountComparison::new(self.legacy.entry_count(), self.columnar.entry_count());
        self.advance(Stage::EntriesChecked);

        let legacy_fields = describe(self.legacy.as_ref(), &self.table)?;
        let columnar_fields = describe(self.columnar.as_ref(), &self.table)?;
        let fields = CountComparison::new(
            legacy_fields.len() as u64,
            columnar_fields.len() as u64,
        );
        self.advance(Stage::FieldsChecked);

        let correspondences = match_fields(&names(&legacy_fields), &names(&columnar_fields));
        let names_match = names_match(&correspondences);
        self.advance(Stage::NamesMatched);

        let mut type_comparisons =
            compare_types(&correspondences, &legacy_fields, &columnar_fields, &self.table);
        self.advance(Stage::TypesClassified);

        let legacy_extraction = extract(self.legacy.as_ref(), &legacy_fields)?;
        let columnar_extraction = extract(self.columnar.as_ref(), &columnar_fields)?;
        let failures = legacy_extraction
            .failures
            .iter()
            .chain(&columnar_extraction.failures)
            .cloned()
            .collect::<Vec<_>>();
        escalate_failures(&mut type_comparisons, &correspondences, &failures);
        let type_verdict = overall_severity(&type_comparisons);
        let sequence_comparisons = compare_sequences(
            &correspondences,
            &legacy_fields,
            &columnar_fields,
            &legacy_extraction,
            &columnar_extraction,
        );
        self.advance(Stage::ValuesExtracted);

        let legacy_statistics = aggregate(&legacy_extraction.buffers);
        let columnar_statistics = aggregate(&columnar_extraction.buffers);
        let statistics = compare_buckets(&legacy_statistics, &columnar_statistics);
        self.advance(Stage::StatsAggregated);

        let Extraction {
            fields: legacy_field_extracts,
            ..
        } = legacy_extraction;
        let Extraction {
            fields: columnar_field_extracts,
            ..
        } = columnar_extraction;
        let report = ReconciliationReport {
            legacy: StoreSummary::of(self.legacy.as_ref()),
            columnar: StoreSummary::of(self.columnar.as_ref()),
            entries,
            fields,
            correspondences,
            names_match,
            type_comparisons,
            type_verdict,
            sequence_comparisons,
            legacy_fields: legacy_field_extracts,
            columnar_fields: columnar_field_extracts,
            failures,
            legacy_statistics,
            columnar_statistics,
            statistics,
        };
        self.advance(Stage::Reported);

        info!(
            "Entries {} vs {}, fields {} vs {}, names match: {}, types: {}, statistics match: {}",
            report.entries.legacy,
            report.entries.columnar,
            report.fields.legacy,
            report.fields.columnar,
            report.names_match,
            report.type_verdict.verdict(),
            report.statistics_match()
        );
        Ok(report)
    }
}

fn names(fields: &[FieldDescriptor]) -> Vec<&str> {
    fields.iter().map(|field| field.name.as_str()).collect()
}

/// A field whose values could not be read cannot be called compatible.
fn escalate_failures(
    comparisons: &mut [TypeComparison],
    correspondences: &[FieldCorrespondence],
    failures: &[FieldFailure],
) {
    for (comparison, pair) in comparisons.iter_mut().zip(correspondences) {
        let failed = failures.iter().any(|failure| {
            let name = match failure.origin {
                Origin::Legacy => pair.legacy_name.as_deref(),
                Origin::Columnar => pair.columnar_name.as_deref(),
            };
            name == Some(failure.field.as_str())
        });
        if failed && comparison.severity < Severity::Mismatch {
            comparison.severity = Severity::Mismatch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Scalar};

    fn store(origin: Origin, skip: Option<i32>) -> MemoryStore {
        let records = (0..10).filter(|value| Some(*value) != skip).collect::<Vec<_>>();
        let (int, float) = match origin {
            Origin::Legacy => ("Int_t", "Float_t"),
            Origin::Columnar => ("int", "float"),
        };
        MemoryStore::new(origin, "events")
            .with_scalars("value", int, records.iter().map(|v| Scalar::Int32(*v)))
            .with_scalars(
                "weight",
                float,
                records.iter().map(|v| Scalar::Float32(*v as f32 * 0.1)),
            )
    }

    #[test]
    fn stages_advance_in_order() {
        let mut stage = Stage::Opened;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(stage, Stage::Reported);
    }

    #[test]
    fn identical_stores_are_consistent() {
        let reconciler = Reconciler::new(
            Box::new(store(Origin::Legacy, None)),
            Box::new(store(Origin::Columnar, None)),
            TypeTable::default(),
        );
        assert_eq!(reconciler.stage(), Stage::Opened);
        let report = reconciler.run().expect("run");
        assert!(report.is_consistent());
        assert_eq!(report.type_verdict, Severity::Exact);
        assert_eq!(report.statistics[0].legacy.count, 10);
    }

    #[test]
    fn skipped_record_changes_counts_and_statistics() {
        let report = Reconciler::new(
            Box::new(store(Origin::Legacy, None)),
            Box::new(store(Origin::Columnar, Some(4))),
            TypeTable::default(),
        )
        .run()
        .expect("run");
        assert_eq!(report.entries, CountComparison::new(10, 9));
        assert!(!report.entries.matches);
        assert!(!report.statistics[0].matches);
        assert!(!report.is_consistent());
    }

    #[test]
    fn unreadable_field_escalates_to_mismatch() {
        let columnar = store(Origin::Columnar, None).with_scalars(
            "energy",
            "double",
            (0..10).map(|_| Scalar::Float32(1.0)),
        );
        let legacy = store(Origin::Legacy, None).with_scalars(
            "energy",
            "Double_t",
            (0..10).map(|_| Scalar::Float64(1.0)),
        );
        let report = Reconciler::new(Box::new(legacy), Box::new(columnar), TypeTable::default())
            .run()
            .expect("run");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].origin, Origin::Columnar);
        let energy = report
            .type_comparisons
            .iter()
            .find(|comparison| comparison.field_name == "energy")
            .expect("energy comparison");
        assert_eq!(energy.severity, Severity::Mismatch);
        assert_eq!(report.type_verdict, Severity::Mismatch);
    }
}
