//! End-to-end runs of the engine over small hand-built run tables.

use anyhow::{Context, Result};
use prefetch_metrics::{
    AggregationMode, AnalysisConfig, Counter, MetricEngine, PairMetric, RankKey, RunRecord,
    SortDirection, aggregate, config::with_prefetchers, derive_coverage_metrics,
    derive_ipc_ratio, derive_read_misses, relative_ratio,
};

fn row(trace: &str, exp: &str, ipc: f64, load: f64, rfo: f64, prefetch: f64) -> RunRecord {
    RunRecord::from_columns(
        trace,
        exp,
        [
            ("Core_0_IPC", ipc),
            ("Core_0_LLC_load_miss", load),
            ("Core_0_LLC_RFO_miss", rfo),
            ("Core_0_LLC_prefetch_miss", prefetch),
            ("Core_0_LLC_prefetch_hit", 0.0),
            ("Core_0_LLC_total_miss", load + rfo + prefetch),
        ],
    )
}

#[test]
fn composition_shift_without_extra_traffic() -> Result<()> {
    let baseline = row("482.sphinx3-234B", "nopref", 1.0, 1000.0, 100.0, 50.0);
    let candidate = row("482.sphinx3-234B", "spp", 1.0, 200.0, 100.0, 300.0);

    assert_eq!(derive_read_misses(&baseline)?, 1150.0);
    assert_eq!(derive_read_misses(&candidate)?, 600.0);

    let m = derive_coverage_metrics(&baseline, &candidate)?;
    assert!((m.coverage - 0.8).abs() < 1e-12);
    assert!((m.uncovered - 0.2).abs() < 1e-12);
    assert_eq!(m.overprediction, 0.0);
    Ok(())
}

#[test]
fn identical_speedups_geomean_to_the_speedup() -> Result<()> {
    let mut ratios = Vec::new();
    for bench in ["a", "b", "c"] {
        let baseline = row(bench, "nopref", 1.0, 10.0, 0.0, 0.0);
        let candidate = row(bench, "pythia", 1.25, 10.0, 0.0, 0.0);
        ratios.push(derive_ipc_ratio(&baseline, &candidate)?);
    }
    assert_eq!(ratios, [1.25, 1.25, 1.25]);
    let geomean = aggregate(&ratios, AggregationMode::Geometric)?;
    assert!((geomean - 1.25).abs() < 1e-12);
    Ok(())
}

fn table() -> Vec<RunRecord> {
    vec![
        row("482.sphinx3-234B", "nopref", 1.00, 1000.0, 100.0, 0.0),
        row("482.sphinx3-234B", "spp", 1.20, 400.0, 100.0, 700.0),
        row("482.sphinx3-234B", "bingo", 1.30, 300.0, 100.0, 900.0),
        row("482.sphinx3-234B", "pythia", 1.25, 500.0, 100.0, 400.0),
        row("459.GemsFDTD-765B", "nopref", 0.50, 2000.0, 0.0, 0.0),
        row("459.GemsFDTD-765B", "spp", 0.55, 1000.0, 0.0, 1200.0),
        row("459.GemsFDTD-765B", "bingo", 0.45, 1500.0, 0.0, 1500.0),
        row("459.GemsFDTD-765B", "pythia", 0.60, 800.0, 0.0, 1200.0),
        // no baseline: ignored
        row("605.mcf_s-665B", "spp", 2.0, 1.0, 0.0, 0.0),
    ]
}

#[test]
fn full_analysis() -> Result<()> {
    let records = table();
    let cfg = with_prefetchers(&AnalysisConfig::default(), &["spp", "bingo", "pythia"]);
    let analysis = MetricEngine::new(cfg).analyze(&records)?;

    assert_eq!(analysis.pairs.len(), 6);
    let labels: Vec<_> = analysis.aggregates.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, ["SPP", "Bingo", "Pythia"]);

    for pair in &analysis.pairs {
        let m = pair.metrics;
        assert_eq!(m.coverage + m.uncovered, 1.0);
        assert!(m.overprediction >= 0.0);
    }

    // sphinx3: read 1100 -> 1200 (SPP), 1300 (Bingo), 1000 (Pythia)
    let spp = analysis.aggregate("SPP").context("SPP aggregate")?;
    let spp_sphinx_over = 100.0 / 1100.0;
    let spp_gems_over = 200.0 / 2000.0;
    assert!((spp.coverage - (0.6 + 0.5) / 2.0).abs() < 1e-12);
    assert!((spp.overprediction - (spp_sphinx_over + spp_gems_over) / 2.0).abs() < 1e-12);
    assert!((spp.ipc_ratio_mean - (1.2 + 1.1) / 2.0).abs() < 1e-12);
    assert!((spp.ipc_ratio_geomean - (1.2f64 * 1.1).sqrt()).abs() < 1e-12);

    let by_coverage = analysis.rank_by(RankKey::Coverage, SortDirection::Descending);
    let order: Vec<_> = by_coverage.iter().map(|(l, _)| l.as_str()).collect();
    // SPP 0.55, Bingo 0.475, Pythia 0.55: SPP stays ahead of Pythia on the tie
    assert_eq!(order, ["SPP", "Pythia", "Bingo"]);

    let by_over = analysis.rank_by(RankKey::Overprediction, SortDirection::Ascending);
    assert_eq!(by_over[0].0, "Pythia");

    let (best, best_ratio) = analysis
        .best(RankKey::IpcRatio(AggregationMode::Geometric), SortDirection::Descending)
        .context("best prefetcher")?;
    assert_eq!(best, "Pythia");
    let bingo = analysis.aggregate("Bingo").context("Bingo aggregate")?;
    let vs_best = relative_ratio(bingo.ipc_ratio_geomean, best_ratio).context("relative")?;
    assert!(vs_best < 1.0);

    let summary = analysis.summary("Pythia", PairMetric::IpcRatio)?;
    assert_eq!(summary.count, 2);
    assert_eq!(summary.min, 1.2);
    assert_eq!(summary.max, 1.25);

    let tally = analysis.tally("Bingo");
    assert_eq!((tally.improved, tally.degraded), (1, 1));
    Ok(())
}

#[test]
fn missing_counter_surfaces_through_the_engine() {
    let records = vec![
        row("a-1", "nopref", 1.0, 10.0, 0.0, 0.0),
        RunRecord::new("a-1", "spp").with_counter(Counter::Ipc, 1.0),
    ];
    let err = MetricEngine::default().analyze(&records).unwrap_err();
    assert_eq!(
        err.to_string(),
        "run a-1/spp has no LLC_load_miss counter"
    );
}

#[test]
fn empty_cell_is_not_ranked() {
    // a blank cell loaded as NaN
    let records = vec![
        row("a-1", "nopref", 1.0, 100.0, 0.0, 0.0),
        row("a-1", "spp", 1.1, 50.0, 0.0, 0.0),
        row("a-1", "bingo", 1.2, f64::NAN, 0.0, 0.0),
    ];
    let err = MetricEngine::default().analyze(&records).unwrap_err();
    assert_eq!(
        err.to_string(),
        "run a-1/bingo has non-finite LLC_load_miss = NaN"
    );
}
