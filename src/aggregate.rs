use serde::{Deserialize, Serialize};

use crate::error::{MetricError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    Arithmetic,
    Geometric,
}

/// Mean of `values` under `mode`.
///
/// Terms are summed in sorted order, so any permutation of the same values
/// produces a bit-identical result.
pub fn aggregate(values: &[f64], mode: AggregationMode) -> Result<f64> {
    if values.is_empty() {
        return Err(MetricError::EmptyInput);
    }
    let terms = match mode {
        AggregationMode::Arithmetic => values.to_vec(),
        AggregationMode::Geometric => {
            let bad = values.iter().enumerate().find(|(_, v)| v.is_nan() || **v <= 0.0);
            if let Some((index, &value)) = bad {
                return Err(MetricError::NonPositiveValue { index, value });
            }
            values.iter().map(|v| v.ln()).collect()
        }
    };
    let mean = sorted_sum(terms) / values.len() as f64;
    Ok(match mode {
        AggregationMode::Arithmetic => mean,
        AggregationMode::Geometric => mean.exp(),
    })
}

fn sorted_sum(mut terms: Vec<f64>) -> f64 {
    terms.sort_by(f64::total_cmp);
    terms.iter().sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64, // population
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Result<Self> {
        let mean = aggregate(values, AggregationMode::Arithmetic)?;
        let deviations: Vec<f64> = values.iter().map(|v| (v - mean).powi(2)).collect();
        let variance = sorted_sum(deviations) / values.len() as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Ok(Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatioTally {
    pub improved: usize,
    pub degraded: usize,
    pub unchanged: usize,
}

impl RatioTally {
    pub fn of(ratios: &[f64]) -> Self {
        let mut tally = Self::default();
        for &ratio in ratios {
            if ratio > 1.0 {
                tally.improved += 1;
            } else if ratio < 1.0 {
                tally.degraded += 1;
            } else {
                tally.unchanged += 1;
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.improved + self.degraded + self.unchanged
    }
}

/// `value` as a multiple of `reference`, e.g. one prefetcher against the best.
pub fn relative_ratio(value: f64, reference: f64) -> Option<f64> {
    (reference != 0.0).then(|| value / reference)
}

/// Miss fractions are arithmetic means; the IPC ratio is carried under both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStat {
    pub label: String,
    pub benchmarks: usize,
    pub coverage: f64,
    pub uncovered: f64,
    pub overprediction: f64,
    pub total: f64,
    pub ipc_ratio_mean: f64,
    pub ipc_ratio_geomean: f64,
}

impl AggregateStat {
    /// Ratio of means: mean coverage over mean total. Not the mean of the
    /// per-pair `DerivedMetrics::efficiency` values.
    pub fn efficiency(&self) -> f64 {
        if self.total == 0.0 { 0.0 } else { self.coverage / self.total }
    }

    pub fn value(&self, key: RankKey) -> f64 {
        match key {
            RankKey::Coverage => self.coverage,
            RankKey::Uncovered => self.uncovered,
            RankKey::Overprediction => self.overprediction,
            RankKey::Total => self.total,
            RankKey::Efficiency => self.efficiency(),
            RankKey::IpcRatio(AggregationMode::Arithmetic) => self.ipc_ratio_mean,
            RankKey::IpcRatio(AggregationMode::Geometric) => self.ipc_ratio_geomean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankKey {
    Coverage,
    Uncovered,
    Overprediction,
    Total,
    Efficiency,
    IpcRatio(AggregationMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Stable sort of `(label, value)` entries; equal values keep input order.
pub fn rank<I>(entries: I, direction: SortDirection) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut ranked: Vec<_> = entries.into_iter().collect();
    match direction {
        SortDirection::Ascending => ranked.sort_by(|a, b| a.1.total_cmp(&b.1)),
        SortDirection::Descending => ranked.sort_by(|a, b| b.1.total_cmp(&a.1)),
    }
    ranked
}

pub fn rank_by(aggregates: &[AggregateStat], key: RankKey, direction: SortDirection) -> Vec<(String, f64)> {
    rank(
        aggregates.iter().map(|stat| (stat.label.clone(), stat.value(key))),
        direction,
    )
}
