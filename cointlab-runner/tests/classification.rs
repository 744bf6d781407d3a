//! Integration-order classification with the statistical oracle.
//!
//! Checks on synthetic series with a known order:
//! 1. White noise is I(0) without conflict
//! 2. A random walk is I(1)
//! 3. A double cumulative sum never exceeds the configured maximum order
//! 4. Short trending samples classify instead of failing the request

use cointlab_core::domain::TrendSpec;
use cointlab_core::{Series, StatisticalOracle, SyntheticGenerator};
use cointlab_runner::{AnalysisRequest, Analyzer, Classifier, NullObserver, Oracles, PipelineConfig};

const ORACLE: StatisticalOracle = StatisticalOracle::new();

fn classify(values: &[f64], trend: TrendSpec) -> cointlab_runner::IntegrationOrderResult {
    let config = PipelineConfig::default();
    Classifier::new(&ORACLE, &config, &NullObserver)
        .classify(0, values, trend)
        .unwrap()
}

// ── Known orders ─────────────────────────────────────────────────────

#[test]
fn white_noise_is_order_zero() {
    for seed in 0..10 {
        let x = SyntheticGenerator::new(seed).white_noise(200, 1.0);
        let r = classify(&x, TrendSpec::Constant);
        assert_eq!(r.order, 0, "seed {seed}");
        assert!(!r.has_conflict, "seed {seed}");
    }
}

#[test]
fn random_walk_is_order_one() {
    let hits = (0..20)
        .filter(|&seed| {
            let x = SyntheticGenerator::new(seed).random_walk(200, 1.0, 0.0);
            classify(&x, TrendSpec::Constant).order == 1
        })
        .count();
    assert!(hits >= 17, "order 1 for {hits} of 20 walks");
}

#[test]
fn double_cumulative_sum_stays_within_max_order() {
    let config = PipelineConfig::default();
    for seed in 0..10 {
        let x = SyntheticGenerator::new(seed).integrated_twice(200, 1.0);
        let r = classify(&x, TrendSpec::Constant);
        assert!(r.order <= config.max_integration_order, "seed {seed}: order {}", r.order);
        assert!(r.order >= 1, "seed {seed}");
    }
}

// ── Short samples ────────────────────────────────────────────────────

#[test]
fn short_trending_walk_classifies() {
    for seed in 0..20 {
        let x = SyntheticGenerator::new(seed).random_walk(24, 1.0, 0.5);
        let r = classify(&x, TrendSpec::ConstantTrend);
        assert!(r.order <= 2, "seed {seed}");
    }
}

#[test]
fn short_requests_do_not_fail_analysis() {
    let config = PipelineConfig::default();
    let analyzer = Analyzer::new(Oracles::statistical(), &config, &NullObserver);
    for n in [20, 22, 24, 27, 31, 39] {
        for seed in 0..5 {
            let mut g = SyntheticGenerator::new(seed);
            let series = vec![
                Series::new("disease_rate", g.random_walk(n, 1.0, 0.5)),
                Series::new("rainfall", g.integrated_twice(n, 1.0)),
                Series::new("shifted", g.level_shift(n, n / 2, 4.0, 1.0)),
            ];
            let request = AnalysisRequest::new(series, None);
            if let Err(e) = analyzer.analyze(&request) {
                panic!("n = {n}, seed = {seed}: {e}");
            }
        }
    }
}
