use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, Result};

/// Marker separating the prefetcher key from the DRAM bandwidth in an
/// experiment label, e.g. `spp_MTPS600`.
pub const BANDWIDTH_MARKER: &str = "_MTPS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Counter {
    Ipc,
    LlcLoadMiss,
    LlcRfoMiss,
    LlcPrefetchMiss,
    LlcPrefetchHit,
    LlcTotalMiss,
}

impl Counter {
    pub const ALL: [Counter; 6] = [
        Counter::Ipc,
        Counter::LlcLoadMiss,
        Counter::LlcRfoMiss,
        Counter::LlcPrefetchMiss,
        Counter::LlcPrefetchHit,
        Counter::LlcTotalMiss,
    ];

    /// Column name as written by the simulator, without the core prefix.
    pub fn column_name(self) -> &'static str {
        match self {
            Counter::Ipc => "IPC",
            Counter::LlcLoadMiss => "LLC_load_miss",
            Counter::LlcRfoMiss => "LLC_RFO_miss",
            Counter::LlcPrefetchMiss => "LLC_prefetch_miss",
            Counter::LlcPrefetchHit => "LLC_prefetch_hit",
            Counter::LlcTotalMiss => "LLC_total_miss",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Counter {
    type Err = MetricError;

    /// Accepts `LLC_load_miss` as well as `Core_0_LLC_load_miss`.
    fn from_str(name: &str) -> Result<Self> {
        let bare = strip_core_prefix(name);
        Counter::ALL
            .into_iter()
            .find(|counter| counter.column_name() == bare)
            .ok_or_else(|| MetricError::UnknownCounter(name.to_string()))
    }
}

fn strip_core_prefix(name: &str) -> &str {
    let Some(rest) = name.strip_prefix("Core_") else {
        return name;
    };
    match rest.split_once('_') {
        Some((core, counter)) if !core.is_empty() && core.bytes().all(|b| b.is_ascii_digit()) => {
            counter
        }
        _ => name,
    }
}

/// One simulation result: a trace run under one experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    trace: String,
    experiment: String,
    counters: BTreeMap<Counter, f64>,
}

impl RunRecord {
    pub fn new(trace: impl Into<String>, experiment: impl Into<String>) -> Self {
        Self {
            trace: trace.into(),
            experiment: experiment.into(),
            counters: BTreeMap::new(),
        }
    }

    pub fn with_counter(mut self, counter: Counter, value: f64) -> Self {
        self.counters.insert(counter, value);
        self
    }

    /// Builds a record from a loaded row. Columns that are not one of the
    /// known counters are ignored.
    pub fn from_columns<'a, I>(
        trace: impl Into<String>,
        experiment: impl Into<String>,
        columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let counters = columns
            .into_iter()
            .filter_map(|(name, value)| name.parse::<Counter>().ok().map(|c| (c, value)))
            .collect();
        Self {
            trace: trace.into(),
            experiment: experiment.into(),
            counters,
        }
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn benchmark(&self) -> &str {
        benchmark_name(&self.trace)
    }

    /// Value of `counter`; absent and non-finite values are both errors.
    pub fn counter(&self, counter: Counter) -> Result<f64> {
        let value = self
            .counters
            .get(&counter)
            .copied()
            .ok_or_else(|| MetricError::MissingCounter {
                trace: self.trace.clone(),
                experiment: self.experiment.clone(),
                counter,
            })?;
        if !value.is_finite() {
            return Err(MetricError::NonFiniteCounter {
                trace: self.trace.clone(),
                experiment: self.experiment.clone(),
                counter,
                value,
            });
        }
        Ok(value)
    }

    pub fn counters(&self) -> impl Iterator<Item = (Counter, f64)> + '_ {
        self.counters.iter().map(|(&c, &v)| (c, v))
    }
}

/// Benchmark identity of a trace: everything before the first `-`.
pub fn benchmark_name(trace: &str) -> &str {
    trace.split('-').next().unwrap_or(trace)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Experiment<'a> {
    pub prefetcher: &'a str,
    pub bandwidth_mtps: Option<u32>,
}

impl<'a> Experiment<'a> {
    pub fn parse(label: &'a str) -> Self {
        if let Some((prefetcher, bandwidth)) = label.rsplit_once(BANDWIDTH_MARKER) {
            if let Ok(mtps) = bandwidth.parse() {
                return Self {
                    prefetcher,
                    bandwidth_mtps: Some(mtps),
                };
            }
        }
        Self {
            prefetcher: label,
            bandwidth_mtps: None,
        }
    }
}

impl fmt::Display for Experiment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bandwidth_mtps {
            Some(mtps) => write!(f, "{}{BANDWIDTH_MARKER}{mtps}", self.prefetcher),
            None => f.write_str(self.prefetcher),
        }
    }
}

pub fn experiment_label(prefetcher: &str, bandwidth_mtps: Option<u32>) -> String {
    Experiment {
        prefetcher,
        bandwidth_mtps,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IPC", Counter::Ipc)]
    #[case("Core_0_IPC", Counter::Ipc)]
    #[case("Core_0_LLC_load_miss", Counter::LlcLoadMiss)]
    #[case("Core_12_LLC_RFO_miss", Counter::LlcRfoMiss)]
    #[case("LLC_prefetch_miss", Counter::LlcPrefetchMiss)]
    #[case("Core_3_LLC_prefetch_hit", Counter::LlcPrefetchHit)]
    #[case("LLC_total_miss", Counter::LlcTotalMiss)]
    fn parses_counter_columns(#[case] name: &str, #[case] expected: Counter) {
        assert_eq!(name.parse::<Counter>(), Ok(expected));
    }

    #[rstest]
    #[case("Trace")]
    #[case("Core__IPC")]
    #[case("Core_x_IPC")]
    #[case("llc_load_miss")]
    fn rejects_unknown_columns(#[case] name: &str) {
        assert_eq!(
            name.parse::<Counter>(),
            Err(MetricError::UnknownCounter(name.to_string()))
        );
    }

    #[test]
    fn from_columns_keeps_only_counters() {
        let record = RunRecord::from_columns(
            "482.sphinx3-234B",
            "spp",
            [
                ("Core_0_IPC", 1.5),
                ("Core_0_LLC_load_miss", 1000.0),
                ("Core_0_L1D_load_miss", 9999.0),
                ("Instructions", 1e9),
            ],
        );
        assert_eq!(record.counter(Counter::Ipc), Ok(1.5));
        assert_eq!(record.counter(Counter::LlcLoadMiss), Ok(1000.0));
        assert_eq!(record.counters().count(), 2);
    }

    #[test]
    fn missing_counter_names_the_run() {
        let record = RunRecord::new("459.GemsFDTD-765B", "bingo");
        assert_eq!(
            record.counter(Counter::LlcRfoMiss),
            Err(MetricError::MissingCounter {
                trace: "459.GemsFDTD-765B".to_string(),
                experiment: "bingo".to_string(),
                counter: Counter::LlcRfoMiss,
            })
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_counter_is_rejected(#[case] value: f64) {
        let record = RunRecord::from_columns("a-1", "spp", [("Core_0_LLC_load_miss", value)]);
        assert!(matches!(
            record.counter(Counter::LlcLoadMiss),
            Err(MetricError::NonFiniteCounter { counter: Counter::LlcLoadMiss, .. })
        ));
    }

    #[rstest]
    #[case("482.sphinx3-234B", "482.sphinx3")]
    #[case("602.gcc_s-734B-extra", "602.gcc_s")]
    #[case("mcf", "mcf")]
    #[case("", "")]
    fn benchmark_is_trace_prefix(#[case] trace: &str, #[case] expected: &str) {
        assert_eq!(benchmark_name(trace), expected);
    }

    #[rstest]
    #[case("nopref", "nopref", None)]
    #[case("spp_MTPS150", "spp", Some(150))]
    #[case("pythia_MTPS9600", "pythia", Some(9600))]
    #[case("mlop_MTPSfast", "mlop_MTPSfast", None)]
    fn parses_experiment_labels(
        #[case] label: &str,
        #[case] prefetcher: &str,
        #[case] bandwidth: Option<u32>,
    ) {
        let exp = Experiment::parse(label);
        assert_eq!(exp.prefetcher, prefetcher);
        assert_eq!(exp.bandwidth_mtps, bandwidth);
    }

    #[test]
    fn experiment_label_appends_bandwidth() {
        assert_eq!(experiment_label("nopref", None), "nopref");
        assert_eq!(experiment_label("nopref", Some(600)), "nopref_MTPS600");
    }
}
