//! End-to-end tests for the analysis pipeline.
//!
//! Runs full requests through [`Analyzer`] and checks:
//! 1. Target selection and the reordered output
//! 2. Model dispatch for each model type
//! 3. Segmentation into periods on detected breaks
//! 4. Validation and failure codes
//! 5. Determinism of repeated runs

mod common;

use cointlab_core::{Scenario, Series};
use cointlab_runner::{
    AnalysisRequest, Analyzer, ModelKind, ModelType, NullObserver, Oracles, PeriodType,
    PipelineConfig, RecordingObserver, TargetReason, TraceEvent, Transformation,
};
use common::Scripted;

fn analyze_with(oracle: &Scripted, request: &AnalysisRequest) -> cointlab_runner::AnalysisResult {
    let config = PipelineConfig::default();
    Analyzer::new(Oracles::uniform(oracle), &config, &NullObserver)
        .analyze(request)
        .unwrap()
}

// ── Statistical oracle ───────────────────────────────────────────────

#[test]
fn white_noise_gets_levels_regression() {
    let request = AnalysisRequest::new(Scenario::WhiteNoise.generate(200, 42), None);
    let config = PipelineConfig::default();
    let result = Analyzer::new(Oracles::statistical(), &config, &NullObserver)
        .analyze(&request)
        .unwrap();

    assert_eq!(result.target_variable, "disease_rate");
    assert_eq!(result.target_index, 1);
    assert_eq!(result.variable_names, vec!["disease_rate", "t"]);
    assert_eq!(result.model_type, ModelType::FullStationary);
    assert!(result.series_orders.iter().all(|o| o.order() == 0));
    assert!(!result.has_structural_break);

    let models = result.model_results.unwrap();
    assert_eq!(models.outcome.model, Some(ModelKind::LevelsOls));
    let regression = models.outcome.regression.unwrap();
    assert_eq!(regression.dependent_variable, "disease_rate");
    assert_eq!(regression.coefficients[0].name, "const");
}

#[test]
fn repeated_analysis_is_byte_identical() {
    let request = AnalysisRequest::new(Scenario::Cointegrated.generate(150, 7), None);
    let config = PipelineConfig::default();
    let analyzer = Analyzer::new(Oracles::statistical(), &config, &NullObserver);
    let first = analyzer.analyze(&request).unwrap().to_json(false).unwrap();
    let second = analyzer.analyze(&request).unwrap().to_json(false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn input_hash_is_request_fingerprint() {
    let request = AnalysisRequest::new(Scenario::WhiteNoise.generate(60, 1), None);
    let config = PipelineConfig::default();
    let result = Analyzer::new(Oracles::statistical(), &config, &NullObserver)
        .analyze(&request)
        .unwrap();
    assert_eq!(result.input_hash, request.fingerprint());
    assert_eq!(result.schema_version, cointlab_runner::SCHEMA_VERSION);
}

// ── Model dispatch ───────────────────────────────────────────────────

#[test]
fn cointegrated_walks_get_error_correction() {
    let oracle = Scripted {
        cointegrated: true,
        ..Default::default()
    };
    let request = AnalysisRequest::new(Scenario::Cointegrated.generate(300, 3), None);
    let result = analyze_with(&oracle, &request);

    assert_eq!(result.target_variable, "respiratory_disease_rate");
    assert_eq!(result.model_type, ModelType::FullNonStationary);
    let models = result.model_results.unwrap();
    assert_eq!(models.outcome.model, Some(ModelKind::ErrorCorrection));
    assert!(models.outcome.cointegration.unwrap().is_cointegrated);
    let long_run = models.outcome.long_run.unwrap();
    assert_eq!(long_run.dependent_variable, "respiratory_disease_rate");
    let short_run = models.outcome.regression.unwrap();
    assert_eq!(short_run.dependent_variable, "Δrespiratory_disease_rate");
    assert!(short_run.coefficient("ECT(-1)").is_some());
}

#[test]
fn independent_walks_get_var_on_differences() {
    let oracle = Scripted::default();
    let request = AnalysisRequest::new(Scenario::RandomWalk.generate(300, 4), None);
    let result = analyze_with(&oracle, &request);

    assert_eq!(result.model_type, ModelType::FullNonStationary);
    let models = result.model_results.unwrap();
    assert_eq!(models.outcome.model, Some(ModelKind::VarDifferences));
    assert!(!models.outcome.cointegration.unwrap().is_cointegrated);
    let p = models.outcome.var_lag_order.unwrap();
    assert!(p >= 1);
    let regression = models.outcome.regression.unwrap();
    assert_eq!(regression.dependent_variable, "Δgdp");
    assert_eq!(regression.coefficients.len(), 1 + 2 * p);
}

#[test]
fn mixed_orders_are_differenced_to_stationarity() {
    let oracle = Scripted::default();
    let request = AnalysisRequest::new(Scenario::Mixed.generate(250, 5), None);
    let result = analyze_with(&oracle, &request);

    assert_eq!(result.target_variable, "hospital_admissions");
    assert_eq!(result.model_type, ModelType::Mixed);
    let transformations = result.transformations.unwrap();
    assert_eq!(transformations[0].transformation, Transformation::FirstDifference);
    assert_eq!(transformations[1].transformation, Transformation::None);
    let models = result.model_results.unwrap();
    assert_eq!(models.outcome.model, Some(ModelKind::MixedRegression));
    let regression = models.outcome.regression.unwrap();
    assert_eq!(regression.dependent_variable, "Δhospital_admissions");
    assert!(regression.coefficient("rainfall").is_some());
}

// ── Segmentation ─────────────────────────────────────────────────────

#[test]
fn level_shift_is_split_into_two_periods() {
    let oracle = Scripted {
        conflict_len: Some(200),
        break_at: 100,
        ..Default::default()
    };
    let request = AnalysisRequest::new(Scenario::LevelShift.generate(200, 6), None);
    let result = analyze_with(&oracle, &request);

    assert!(result.has_structural_break);
    let indices: Vec<usize> = result.structural_breaks.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![100]);
    assert!(result.transformations.is_none());

    let models = result.model_results.unwrap();
    assert!(models.outcome.model.is_none());
    let periods = models.periods.unwrap();
    assert_eq!(periods[0].period_type, PeriodType::BeforeBreak);
    assert_eq!(periods[1].period_type, PeriodType::AfterBreak);
    assert_eq!(periods[0].data_size + periods[1].data_size, 200);

    let period_results = models.period_results.unwrap();
    assert_eq!(period_results.len(), 2);
    for pr in &period_results {
        assert_eq!(pr.model_type, Some(ModelType::FullStationary));
        assert_eq!(pr.outcome.model, Some(ModelKind::LevelsOls));
        assert_eq!(pr.series_orders.len(), 2);
    }
}

#[test]
fn failing_period_does_not_sink_the_others() {
    let oracle = Scripted {
        conflict_len: Some(200),
        break_at: 5,
        ..Default::default()
    };
    let request = AnalysisRequest::new(Scenario::WhiteNoise.generate(200, 8), None);
    let result = analyze_with(&oracle, &request);

    let period_results = result.model_results.unwrap().period_results.unwrap();
    assert_eq!(period_results.len(), 2);
    let message = period_results[0].outcome.error_message.as_deref().unwrap();
    assert!(message.starts_with("period analysis failed:"), "{message}");
    assert!(period_results[0].model_type.is_none());
    assert!(period_results[1].outcome.error_message.is_none());
    assert_eq!(period_results[1].outcome.model, Some(ModelKind::LevelsOls));
}

// ── Target selection ─────────────────────────────────────────────────

#[test]
fn explicit_target_is_moved_first() {
    let oracle = Scripted::default();
    let request = AnalysisRequest::new(Scenario::RandomWalk.generate(120, 9), Some(1));
    let result = analyze_with(&oracle, &request);
    assert_eq!(result.target_index, 1);
    assert_eq!(result.target_variable, "consumption");
    assert_eq!(result.variable_names, vec!["consumption", "gdp"]);
    assert_eq!(result.series_orders[0].variable_name, "consumption");
}

#[test]
fn trace_records_target_and_model_type() {
    let oracle = Scripted::default();
    let config = PipelineConfig::default();
    let recorder = RecordingObserver::new();
    let request = AnalysisRequest::new(Scenario::WhiteNoise.generate(80, 10), None);
    Analyzer::new(Oracles::uniform(&oracle), &config, &recorder)
        .analyze(&request)
        .unwrap();

    let events = recorder.into_events();
    assert!(matches!(
        &events[0],
        TraceEvent::TargetSelected { index: 1, reason: TargetReason::Keyword { keyword }, .. }
            if keyword == "disease"
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, TraceEvent::ModelTypeDecided { model_type: ModelType::FullStationary, .. })));
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn validation_failures_carry_codes() {
    let config = PipelineConfig::default();
    let analyzer = Analyzer::new(Oracles::statistical(), &config, &NullObserver);
    let noise = Scenario::WhiteNoise.generate(40, 11);

    let single = AnalysisRequest::new(noise[..1].to_vec(), None);
    assert_eq!(analyzer.analyze(&single).unwrap_err().code(), "INSUFFICIENT_SERIES");

    let short = AnalysisRequest::new(Scenario::WhiteNoise.generate(10, 11), None);
    assert_eq!(analyzer.analyze(&short).unwrap_err().code(), "SERIES_TOO_SHORT");

    let bad_target = AnalysisRequest::new(noise.clone(), Some(2));
    assert_eq!(analyzer.analyze(&bad_target).unwrap_err().code(), "INVALID_TARGET_INDEX");

    let mut with_nan = noise;
    with_nan[1].values[3] = f64::NAN;
    let nan = AnalysisRequest::new(with_nan, None);
    assert_eq!(analyzer.analyze(&nan).unwrap_err().code(), "NON_FINITE_VALUE");
}

#[test]
fn profiling_failure_is_analysis_failed() {
    let oracle = Scripted {
        min_len: 1000,
        ..Default::default()
    };
    let config = PipelineConfig::default();
    let request = AnalysisRequest::new(
        vec![
            Series::new("a", (0..50).map(|i| (i as f64 * 0.3).sin()).collect()),
            Series::new("b", (0..50).map(|i| (i as f64 * 0.7).cos()).collect()),
        ],
        None,
    );
    let recorder = RecordingObserver::new();
    let err = Analyzer::new(Oracles::uniform(&oracle), &config, &recorder)
        .analyze(&request)
        .unwrap_err();
    assert_eq!(err.code(), "ANALYSIS_FAILED");

    let events = recorder.into_events();
    assert!(matches!(
        events.last(),
        Some(TraceEvent::StageFailed {
            stage: "profiling",
            ..
        })
    ));
}
