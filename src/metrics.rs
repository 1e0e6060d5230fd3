use serde::Serialize;

use crate::{
    error::{MetricError, Result},
    record::{Counter, RunRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub coverage: f64,       // [0, 1]
    pub uncovered: f64,      // 1 - coverage
    pub overprediction: f64, // [0, inf)
}

impl DerivedMetrics {
    /// Height of the stacked coverage bar. May exceed 1.
    pub fn total(&self) -> f64 {
        self.coverage + self.uncovered + self.overprediction
    }

    pub fn efficiency(&self) -> f64 {
        let total = self.total();
        if total == 0.0 { 0.0 } else { self.coverage / total }
    }
}

/// LLC read misses: demand loads, RFOs and prefetches that went to memory.
pub fn derive_read_misses(record: &RunRecord) -> Result<f64> {
    Ok(record.counter(Counter::LlcLoadMiss)?
        + record.counter(Counter::LlcRfoMiss)?
        + record.counter(Counter::LlcPrefetchMiss)?)
}

pub fn derive_coverage_metrics(baseline: &RunRecord, candidate: &RunRecord) -> Result<DerivedMetrics> {
    let baseline_load = baseline.counter(Counter::LlcLoadMiss)?;
    let candidate_load = candidate.counter(Counter::LlcLoadMiss)?;
    let baseline_read = derive_read_misses(baseline)?;
    let candidate_read = derive_read_misses(candidate)?;

    // A baseline without load misses has nothing to cover.
    let coverage = if baseline_load > 0.0 {
        ((baseline_load - candidate_load) / baseline_load).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let overprediction = if baseline_read > 0.0 {
        ((candidate_read - baseline_read) / baseline_read).max(0.0)
    } else {
        0.0
    };

    Ok(DerivedMetrics {
        coverage,
        uncovered: 1.0 - coverage,
        overprediction,
    })
}

pub fn derive_ipc_ratio(baseline: &RunRecord, candidate: &RunRecord) -> Result<f64> {
    let baseline_ipc = baseline.counter(Counter::Ipc)?;
    let candidate_ipc = candidate.counter(Counter::Ipc)?;
    if baseline_ipc == 0.0 {
        return Err(MetricError::DivisionByZero {
            trace: baseline.trace().to_string(),
            experiment: baseline.experiment().to_string(),
            counter: Counter::Ipc,
        });
    }
    Ok(candidate_ipc / baseline_ipc)
}

/// Speedup of an IPC ratio expressed as a signed percentage.
pub fn improvement_percent(ipc_ratio: f64) -> f64 {
    (ipc_ratio - 1.0) * 100.0
}
