//! Prefetcher comparison metrics over cache simulation results.
//!
//! Runs are compared against the no-prefetch baseline of the same benchmark:
//! coverage of baseline load misses, extra read traffic (overprediction) and
//! IPC ratio. Per-benchmark values are then averaged per prefetcher and
//! ranked. Loading the run table and rendering reports are left to callers.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod metrics;
pub mod record;

pub use aggregate::{
    AggregateStat, AggregationMode, RankKey, RatioTally, SortDirection, Summary, aggregate,
    rank, rank_by, relative_ratio,
};
pub use config::{AnalysisConfig, DEFAULT_BANDWIDTHS_MTPS, GroupBy, PrefetcherSpec};
pub use engine::{Analysis, BandwidthPoint, BandwidthSweep, MetricEngine, PairMetric, PairMetrics};
pub use error::{MetricError, Result};
pub use group::{BenchmarkGroup, group_runs};
pub use metrics::{
    DerivedMetrics, derive_coverage_metrics, derive_ipc_ratio, derive_read_misses,
    improvement_percent,
};
pub use record::{Counter, Experiment, RunRecord, benchmark_name, experiment_label};
