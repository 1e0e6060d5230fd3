use serde::{Deserialize, Serialize};

use crate::{
    error::{MetricError, Result},
    record::experiment_label,
};

/// DRAM bandwidths (MTPS) simulated by the bandwidth sensitivity runs.
pub const DEFAULT_BANDWIDTHS_MTPS: [u32; 6] = [150, 300, 600, 1200, 4800, 9600];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetcherSpec {
    pub key: String,   // experiment key in the run table
    pub label: String, // name shown in reports
}

impl PrefetcherSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// How runs are collected into baseline/candidate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Trace name truncated at its first `-`
    #[default]
    Benchmark,
    /// Full trace name
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub baseline: String,
    pub prefetchers: Vec<PrefetcherSpec>, // report order
    pub bandwidth_mtps: Option<u32>,      // None selects the unsuffixed runs
    pub group_by: GroupBy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline: "nopref".to_string(),
            prefetchers: vec![
                PrefetcherSpec::new("spp", "SPP"),
                PrefetcherSpec::new("bingo", "Bingo"),
                PrefetcherSpec::new("mlop", "MLOP"),
                PrefetcherSpec::new("pythia", "Pythia"),
            ],
            bandwidth_mtps: None,
            group_by: GroupBy::Benchmark,
        }
    }
}

impl AnalysisConfig {
    pub fn baseline_experiment(&self) -> String {
        experiment_label(&self.baseline, self.bandwidth_mtps)
    }

    pub fn experiment_for(&self, prefetcher: &PrefetcherSpec) -> String {
        experiment_label(&prefetcher.key, self.bandwidth_mtps)
    }

    /// Labels identify prefetchers in results, so they must be unique.
    pub fn validate(&self) -> Result<()> {
        for (i, spec) in self.prefetchers.iter().enumerate() {
            if self.prefetchers[..i].iter().any(|p| p.label == spec.label) {
                return Err(MetricError::DuplicatePrefetcher(spec.label.clone()));
            }
        }
        Ok(())
    }

    pub fn prefetcher(&self, label: &str) -> Option<&PrefetcherSpec> {
        self.prefetchers.iter().find(|p| p.label == label)
    }
}

pub fn bandwidth_sweep(base: &AnalysisConfig, bandwidths: &[u32]) -> Vec<AnalysisConfig> {
    bandwidths
        .iter()
        .map(|&mtps| {
            let mut cfg = base.clone();
            cfg.bandwidth_mtps = Some(mtps);
            cfg
        })
        .collect()
}

/// Restricts `base` to the given prefetcher keys, keeping `base`'s order.
pub fn with_prefetchers(base: &AnalysisConfig, keys: &[&str]) -> AnalysisConfig {
    let mut cfg = base.clone();
    cfg.prefetchers.retain(|p| keys.contains(&p.key.as_str()));
    cfg
}
