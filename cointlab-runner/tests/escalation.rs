//! Integration tests for regression escalation and the cointegration selector
//! using the statistical oracle on synthetic data with known structure.

use cointlab_core::domain::{Series, TrendSpec};
use cointlab_core::{StatisticalOracle, SyntheticGenerator};
use cointlab_runner::cointegration::{self, CointegrationTest};
use cointlab_runner::{EscalationBuilder, EscalationStage, NullObserver, PipelineConfig};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ── Escalation ───────────────────────────────────────────────────────

#[test]
fn white_noise_errors_stay_at_baseline() {
    let mut g = SyntheticGenerator::new(2024);
    let x1 = g.white_noise(200, 1.0);
    let x2 = g.white_noise(200, 1.0);
    let e = g.white_noise(200, 0.5);
    let y: Vec<f64> = (0..200).map(|i| 5.0 + 2.0 * x1[i] + 3.0 * x2[i] + e[i]).collect();

    let config = PipelineConfig::default();
    let r = EscalationBuilder::new(&config, &NullObserver)
        .build(&y, &[&x1, &x2], "y", &names(&["x1", "x2"]))
        .unwrap();

    assert!(r.r_squared > 0.9);
    assert!((r.coefficient("const").unwrap().value - 5.0).abs() < 0.5);
    assert!((r.coefficient("x1").unwrap().value - 2.0).abs() < 0.5);
    assert!((r.coefficient("x2").unwrap().value - 3.0).abs() < 0.5);
    assert!(r.coefficient("x1").unwrap().is_significant);
    assert_eq!(r.stage, EscalationStage::Baseline, "dw = {}", r.durbin_watson.statistic);
    assert_eq!(r.n_obs, 200);
    assert!(!r.has_lags);
    assert!(!r.uses_robust_covariance);
}

#[test]
fn persistent_errors_escalate_past_baseline() {
    let mut g = SyntheticGenerator::new(77);
    let x = g.white_noise(300, 1.0);
    let u = g.ar1(300, 0.9, 1.0);
    let y: Vec<f64> = (0..300).map(|i| 1.0 + 0.5 * x[i] + u[i]).collect();

    let config = PipelineConfig::default();
    let r = EscalationBuilder::new(&config, &NullObserver)
        .build(&y, &[&x], "y", &names(&["x"]))
        .unwrap();

    assert_ne!(r.stage, EscalationStage::Baseline);
    match r.stage {
        EscalationStage::Lagged { lags } => {
            assert!(lags >= 1);
            assert!(r.has_lags);
            assert!(r.coefficient("lag1_y").is_some());
            assert_eq!(r.n_obs, 300 - lags);
        }
        EscalationStage::RobustCovariance { .. } => {
            assert!(r.uses_robust_covariance);
            assert_eq!(r.n_obs, 300);
        }
        EscalationStage::Baseline => unreachable!(),
    }
}

#[test]
fn predictor_name_mismatch_is_rejected() {
    let config = PipelineConfig::default();
    let x = vec![1.0, 2.0, 3.0, 4.0];
    let err = EscalationBuilder::new(&config, &NullObserver)
        .build(&x, &[&x], "y", &[])
        .unwrap_err();
    assert!(err.to_string().contains("predictors"));
}

// ── Cointegration selector ───────────────────────────────────────────

#[test]
fn noisy_copy_of_a_walk_is_cointegrated() {
    let (x, y) = SyntheticGenerator::new(31).cointegrated_pair(300, 0.5);
    let series = vec![Series::new("y", y), Series::new("x", x)];
    let config = PipelineConfig::default();
    let r = cointegration::check(
        &series,
        TrendSpec::Constant,
        &StatisticalOracle::new(),
        &config,
        &NullObserver,
    )
    .unwrap();
    assert_eq!(r.test_type, CointegrationTest::Aeg);
    assert_eq!(r.n_series, 2);
    assert!(r.is_cointegrated);
    assert!(r.aeg_result.unwrap().p_value < 0.01);
}

#[test]
fn three_walks_sharing_a_trend_use_the_rank_test() {
    let mut g = SyntheticGenerator::new(32);
    let common = g.random_walk(300, 1.0, 0.0);
    let series: Vec<Series> = (0..3)
        .map(|j| {
            let noise = g.white_noise(300, 0.5);
            let values = common.iter().zip(&noise).map(|(c, e)| c + e).collect();
            Series::new(format!("s{j}"), values)
        })
        .collect();
    let config = PipelineConfig::default();
    let r = cointegration::check(
        &series,
        TrendSpec::Constant,
        &StatisticalOracle::new(),
        &config,
        &NullObserver,
    )
    .unwrap();
    assert_eq!(r.test_type, CointegrationTest::Johansen);
    assert_eq!(r.n_series, 3);
    assert!(r.is_cointegrated);
    assert!(r.n_cointegration_relations.unwrap() >= 1);
    assert_eq!(r.johansen_trace_stats.as_ref().unwrap().len(), 3);
    assert!(r.lag_order.unwrap() >= 1);
}
