//! Per-kind summary statistics over the flattened value buffers.

use serde::Serialize;

use crate::{extract::TypedBuffers, types::ScalarKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsBucket {
    pub canonical_type: ScalarKind,
    pub count: u64,
    pub mean: f64,
    pub stddev: f64,
}

impl StatsBucket {
    pub fn empty(canonical_type: ScalarKind) -> Self {
        Self {
            canonical_type,
            count: 0,
            mean: 0.0,
            stddev: 0.0,
        }
    }
}

struct StatsAccumulator {
    values: Vec<f64>,
    sum: f64,
}

impl StatsAccumulator {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            sum: 0.0,
        }
    }

    fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.values.push(value);
    }

    fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Population standard deviation, from a second pass over the values.
    fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let squares = self
            .values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>();
        Some((squares / self.values.len() as f64).sqrt())
    }

    fn finish(self, canonical_type: ScalarKind) -> StatsBucket {
        match (self.mean(), self.std_dev()) {
            (Some(mean), Some(stddev)) => StatsBucket {
                canonical_type,
                count: self.values.len() as u64,
                mean,
                stddev,
            },
            _ => StatsBucket::empty(canonical_type),
        }
    }
}

pub fn summarize(canonical_type: ScalarKind, values: impl IntoIterator<Item = f64>) -> StatsBucket {
    let mut accumulator = StatsAccumulator::new();
    for value in values {
        accumulator.add_value(value);
    }
    accumulator.finish(canonical_type)
}

/// One bucket per scalar kind, always all four, in [`ScalarKind::ALL`] order.
///
/// Booleans count as 0/1; `f32` values are widened before summing.
pub fn aggregate(buffers: &TypedBuffers) -> Vec<StatsBucket> {
    ScalarKind::ALL
        .iter()
        .map(|kind| match kind {
            ScalarKind::Int32 => summarize(*kind, buffers.int32.iter().copied().map(f64::from)),
            ScalarKind::Float32 => {
                summarize(*kind, buffers.float32.iter().copied().map(f64::from))
            }
            ScalarKind::Float64 => summarize(*kind, buffers.float64.iter().copied()),
            ScalarKind::Bool => summarize(
                *kind,
                buffers
                    .boolean
                    .iter()
                    .map(|flag| if *flag { 1.0 } else { 0.0 }),
            ),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsComparison {
    pub canonical_type: ScalarKind,
    pub legacy: StatsBucket,
    pub columnar: StatsBucket,
    pub matches: bool,
}

/// Pairs buckets of the same kind. Values must agree exactly.
pub fn compare_buckets(legacy: &[StatsBucket], columnar: &[StatsBucket]) -> Vec<StatsComparison> {
    ScalarKind::ALL
        .iter()
        .map(|kind| {
            let find = |buckets: &[StatsBucket]| {
                buckets
                    .iter()
                    .find(|bucket| bucket.canonical_type == *kind)
                    .copied()
                    .unwrap_or_else(|| StatsBucket::empty(*kind))
            };
            let legacy = find(legacy);
            let columnar = find(columnar);
            StatsComparison {
                canonical_type: *kind,
                matches: legacy == columnar,
                legacy,
                columnar,
            }
        })
        .collect()
}
