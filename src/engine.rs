use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    aggregate::{
        AggregateStat, AggregationMode, RankKey, RatioTally, SortDirection, Summary, aggregate,
        rank, rank_by,
    },
    config::{AnalysisConfig, bandwidth_sweep},
    error::Result,
    group::group_runs,
    metrics::{DerivedMetrics, derive_coverage_metrics, derive_ipc_ratio, improvement_percent},
    record::{Counter, RunRecord},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMetrics {
    pub group: String,
    pub prefetcher: String, // report label
    pub metrics: DerivedMetrics,
    pub baseline_ipc: f64,
    pub candidate_ipc: f64,
    pub ipc_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairMetric {
    Coverage,
    Uncovered,
    Overprediction,
    Total,
    IpcRatio,
}

impl PairMetrics {
    pub fn value(&self, metric: PairMetric) -> f64 {
        match metric {
            PairMetric::Coverage => self.metrics.coverage,
            PairMetric::Uncovered => self.metrics.uncovered,
            PairMetric::Overprediction => self.metrics.overprediction,
            PairMetric::Total => self.metrics.total(),
            PairMetric::IpcRatio => self.ipc_ratio,
        }
    }

    pub fn improvement_percent(&self) -> f64 {
        improvement_percent(self.ipc_ratio)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricEngine {
    config: AnalysisConfig,
}

impl MetricEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Coverage and IPC metrics for every (group, prefetcher) pair that has
    /// both a baseline and a candidate run. Groups without a baseline are
    /// skipped.
    pub fn derive_pairs(&self, records: &[RunRecord]) -> Result<Vec<PairMetrics>> {
        self.config.validate()?;
        let baseline_exp = self.config.baseline_experiment();
        let mut pairs = Vec::new();
        for group in group_runs(records, self.config.group_by) {
            let Some(baseline) = group.run(&baseline_exp)? else {
                debug!(group = group.name(), baseline = %baseline_exp, "no baseline run, skipping group");
                continue;
            };
            for prefetcher in &self.config.prefetchers {
                let experiment = self.config.experiment_for(prefetcher);
                let Some(candidate) = group.run(&experiment)? else {
                    trace!(group = group.name(), %experiment, "no run for prefetcher");
                    continue;
                };
                let metrics = derive_coverage_metrics(baseline, candidate)?;
                let ipc_ratio = derive_ipc_ratio(baseline, candidate)?;
                trace!(
                    group = group.name(),
                    prefetcher = %prefetcher.label,
                    coverage = metrics.coverage,
                    overprediction = metrics.overprediction,
                    ipc_ratio,
                    "derived pair"
                );
                pairs.push(PairMetrics {
                    group: group.name().to_string(),
                    prefetcher: prefetcher.label.clone(),
                    metrics,
                    baseline_ipc: baseline.counter(Counter::Ipc)?,
                    candidate_ipc: candidate.counter(Counter::Ipc)?,
                    ipc_ratio,
                });
            }
        }
        Ok(pairs)
    }

    // configuration order; prefetchers without pairs are left out
    pub fn aggregate_by_prefetcher(&self, pairs: &[PairMetrics]) -> Result<Vec<AggregateStat>> {
        self.config.validate()?;
        let mut stats = Vec::new();
        for prefetcher in &self.config.prefetchers {
            let own: Vec<&PairMetrics> = pairs
                .iter()
                .filter(|p| p.prefetcher == prefetcher.label)
                .collect();
            if own.is_empty() {
                debug!(prefetcher = %prefetcher.label, "no pairs, no aggregate");
                continue;
            }
            let column = |metric: PairMetric| -> Vec<f64> { own.iter().map(|p| p.value(metric)).collect() };
            let ratios = column(PairMetric::IpcRatio);
            stats.push(AggregateStat {
                label: prefetcher.label.clone(),
                benchmarks: own.len(),
                coverage: aggregate(&column(PairMetric::Coverage), AggregationMode::Arithmetic)?,
                uncovered: aggregate(&column(PairMetric::Uncovered), AggregationMode::Arithmetic)?,
                overprediction: aggregate(
                    &column(PairMetric::Overprediction),
                    AggregationMode::Arithmetic,
                )?,
                total: aggregate(&column(PairMetric::Total), AggregationMode::Arithmetic)?,
                ipc_ratio_mean: aggregate(&ratios, AggregationMode::Arithmetic)?,
                ipc_ratio_geomean: aggregate(&ratios, AggregationMode::Geometric)?,
            });
        }
        Ok(stats)
    }

    pub fn analyze(&self, records: &[RunRecord]) -> Result<Analysis> {
        let pairs = self.derive_pairs(records)?;
        let aggregates = self.aggregate_by_prefetcher(&pairs)?;
        Ok(Analysis { pairs, aggregates })
    }

    /// IPC ratios only, per configured prefetcher. Needs no miss counters.
    pub fn ipc_ratios(&self, records: &[RunRecord]) -> Result<Vec<(String, Vec<f64>)>> {
        self.config.validate()?;
        let baseline_exp = self.config.baseline_experiment();
        let mut ratios: Vec<(String, Vec<f64>)> = self
            .config
            .prefetchers
            .iter()
            .map(|p| (p.label.clone(), Vec::new()))
            .collect();
        for group in group_runs(records, self.config.group_by) {
            let Some(baseline) = group.run(&baseline_exp)? else {
                debug!(group = group.name(), baseline = %baseline_exp, "no baseline run, skipping group");
                continue;
            };
            for (prefetcher, (_, values)) in self.config.prefetchers.iter().zip(ratios.iter_mut()) {
                if let Some(candidate) = group.run(&self.config.experiment_for(prefetcher))? {
                    values.push(derive_ipc_ratio(baseline, candidate)?);
                }
            }
        }
        ratios.retain(|(_, values)| !values.is_empty());
        Ok(ratios)
    }

    /// Geometric-mean IPC ratio of each prefetcher at each DRAM bandwidth.
    pub fn sweep_bandwidth(&self, records: &[RunRecord], bandwidths: &[u32]) -> Result<BandwidthSweep> {
        let mut points = Vec::new();
        for cfg in bandwidth_sweep(&self.config, bandwidths) {
            let bandwidth_mtps = cfg.bandwidth_mtps.unwrap_or_default();
            let engine = MetricEngine::new(cfg);
            let mut geomean_ipc_ratio = Vec::new();
            for (label, values) in engine.ipc_ratios(records)? {
                geomean_ipc_ratio.push((label, aggregate(&values, AggregationMode::Geometric)?));
            }
            debug!(bandwidth_mtps, prefetchers = geomean_ipc_ratio.len(), "bandwidth point");
            points.push(BandwidthPoint {
                bandwidth_mtps,
                geomean_ipc_ratio,
            });
        }
        Ok(BandwidthSweep { points })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub pairs: Vec<PairMetrics>,
    pub aggregates: Vec<AggregateStat>,
}

impl Analysis {
    pub fn aggregate(&self, label: &str) -> Option<&AggregateStat> {
        self.aggregates.iter().find(|a| a.label == label)
    }

    pub fn pairs_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a PairMetrics> + 'a {
        self.pairs.iter().filter(move |p| p.prefetcher == label)
    }

    pub fn rank_by(&self, key: RankKey, direction: SortDirection) -> Vec<(String, f64)> {
        rank_by(&self.aggregates, key, direction)
    }

    /// First entry of the ranking; ties go to the earlier prefetcher.
    pub fn best(&self, key: RankKey, direction: SortDirection) -> Option<(String, f64)> {
        self.rank_by(key, direction).into_iter().next()
    }

    pub fn summary(&self, label: &str, metric: PairMetric) -> Result<Summary> {
        let values: Vec<f64> = self.pairs_for(label).map(|p| p.value(metric)).collect();
        Summary::of(&values)
    }

    pub fn tally(&self, label: &str) -> RatioTally {
        let ratios: Vec<f64> = self.pairs_for(label).map(|p| p.ipc_ratio).collect();
        RatioTally::of(&ratios)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthPoint {
    pub bandwidth_mtps: u32,
    pub geomean_ipc_ratio: Vec<(String, f64)>, // configuration order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthSweep {
    pub points: Vec<BandwidthPoint>,
}

impl BandwidthSweep {
    /// `(bandwidth, geomean ratio)` for `label` at every bandwidth it was run.
    pub fn series(&self, label: &str) -> Vec<(u32, f64)> {
        self.points
            .iter()
            .filter_map(|point| {
                point
                    .geomean_ipc_ratio
                    .iter()
                    .find(|(l, _)| l == label)
                    .map(|&(_, ratio)| (point.bandwidth_mtps, ratio))
            })
            .collect()
    }

    pub fn ranking_at(&self, bandwidth_mtps: u32) -> Option<Vec<(String, f64)>> {
        let point = self.points.iter().find(|p| p.bandwidth_mtps == bandwidth_mtps)?;
        Some(rank(point.geomean_ipc_ratio.iter().cloned(), SortDirection::Descending))
    }

    pub fn best_at(&self, bandwidth_mtps: u32) -> Option<(String, f64)> {
        self.ranking_at(bandwidth_mtps)?.into_iter().next()
    }

    /// Change in geomean ratio per decade of bandwidth, lowest to highest
    /// swept point.
    pub fn sensitivity(&self, label: &str) -> Option<f64> {
        let series = self.series(label);
        let (&(low_bw, low), &(high_bw, high)) = (series.first()?, series.last()?);
        let decades = (high_bw as f64 / low_bw as f64).log10();
        (series.len() >= 2 && decades != 0.0).then(|| (high - low) / decades)
    }

    /// Speedup gained going from the lowest to the highest swept bandwidth,
    /// as a percentage.
    pub fn low_to_high_percent(&self, label: &str) -> Option<f64> {
        let series = self.series(label);
        let (&(_, low), &(_, high)) = (series.first()?, series.last()?);
        (series.len() >= 2 && low != 0.0).then(|| (high / low - 1.0) * 100.0)
    }
}
