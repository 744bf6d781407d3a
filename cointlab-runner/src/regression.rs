//! Regression escalation — baseline OLS, then lags, then HAC covariance.
//!
//! Each stage is only attempted when the previous one leaves Durbin–Watson
//! outside the accepted band:
//! 1. Baseline OLS with intercept
//! 2. AIC-selected lags of the dependent variable and every predictor
//! 3. The baseline model again, with Newey–West standard errors

use cointlab_core::stats::ols::{self, CovarianceType, OlsFit};
use cointlab_core::StatsError;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::observer::{AnalysisObserver, TraceEvent};

/// Name given to the lagged error-correction term.
pub const ECT_NAME: &str = "ECT(-1)";

/// Terminal state of the escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationStage {
    Baseline,
    Lagged { lags: usize },
    RobustCovariance { lags: usize },
}

impl EscalationStage {
    pub fn lags(self) -> usize {
        match self {
            EscalationStage::Baseline => 0,
            EscalationStage::Lagged { lags } | EscalationStage::RobustCovariance { lags } => lags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub value: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub is_significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurbinWatson {
    pub statistic: f64,
    pub has_autocorrelation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub dependent_variable: String,
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub durbin_watson: DurbinWatson,
    pub n_obs: usize,
    pub stage: EscalationStage,
    pub has_lags: bool,
    pub uses_robust_covariance: bool,
}

impl RegressionResult {
    /// Report an OLS fit. `names` labels `fit.params` in order.
    pub fn from_fit(
        fit: &OlsFit,
        dependent_variable: &str,
        names: &[String],
        stage: EscalationStage,
        config: &PipelineConfig,
    ) -> Self {
        let coefficients = names
            .iter()
            .zip(&fit.params)
            .zip(&fit.std_errors)
            .zip(fit.t_values.iter().zip(&fit.p_values))
            .map(|(((name, &value), &std_error), (&t_value, &p_value))| Coefficient {
                name: name.clone(),
                value,
                std_error,
                t_value,
                p_value,
                is_significant: p_value < config.significance,
            })
            .collect();
        let statistic = fit.durbin_watson();
        Self {
            dependent_variable: dependent_variable.to_string(),
            coefficients,
            r_squared: fit.r_squared,
            adj_r_squared: fit.adj_r_squared,
            f_statistic: fit.f_statistic,
            f_pvalue: fit.f_pvalue,
            durbin_watson: DurbinWatson {
                statistic,
                has_autocorrelation: config.is_autocorrelated(statistic),
            },
            n_obs: fit.n_obs,
            stage,
            has_lags: stage.lags() > 0,
            uses_robust_covariance: matches!(stage, EscalationStage::RobustCovariance { .. }),
        }
    }

    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// `name`, `Δname` or `Δ²name` depending on how often it was differenced.
pub fn display_name(name: &str, order: usize) -> String {
    match order {
        0 => name.to_string(),
        1 => format!("Δ{name}"),
        2 => format!("Δ²{name}"),
        d => format!("Δ^{d}{name}"),
    }
}

/// Dependent variable and regressors with `lags` lags appended.
///
/// The first `lags` observations are dropped. Column order is the
/// predictors, lags `1..=lags` of `y`, then each predictor's lags.
pub fn lagged_design(y: &[f64], predictors: &[&[f64]], lags: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = y.len();
    let window = |values: &[f64], lag: usize| values[lags - lag..n - lag].to_vec();

    let mut columns: Vec<Vec<f64>> = predictors.iter().map(|x| window(x, 0)).collect();
    columns.extend((1..=lags).map(|lag| window(y, lag)));
    for x in predictors {
        columns.extend((1..=lags).map(|lag| window(x, lag)));
    }
    (window(y, 0), columns)
}

/// Coefficient names matching [`lagged_design`], intercept first.
pub fn lagged_names(dependent: &str, predictors: &[String], lags: usize) -> Vec<String> {
    let mut names = vec!["const".to_string()];
    names.extend(predictors.iter().cloned());
    names.extend((1..=lags).map(|lag| format!("lag{lag}_{dependent}")));
    for name in predictors {
        names.extend((1..=lags).map(|lag| format!("lag{lag}_{name}")));
    }
    names
}

/// Runs the three-stage escalation.
pub struct EscalationBuilder<'a> {
    config: &'a PipelineConfig,
    observer: &'a dyn AnalysisObserver,
}

impl<'a> EscalationBuilder<'a> {
    pub fn new(config: &'a PipelineConfig, observer: &'a dyn AnalysisObserver) -> Self {
        Self { config, observer }
    }

    /// Regress `y` on an intercept and `predictors`, escalating on autocorrelation.
    pub fn build(
        &self,
        y: &[f64],
        predictors: &[&[f64]],
        dependent: &str,
        predictor_names: &[String],
    ) -> Result<RegressionResult, StatsError> {
        if predictors.len() != predictor_names.len() {
            return Err(StatsError::DimensionMismatch(format!(
                "{} predictors but {} names",
                predictors.len(),
                predictor_names.len()
            )));
        }
        let n = y.len();
        let mut base_names = vec!["const".to_string()];
        base_names.extend(predictor_names.iter().cloned());

        let baseline = ols::fit(y, predictors, true, CovarianceType::NonRobust)?;
        let result = RegressionResult::from_fit(
            &baseline,
            dependent,
            &base_names,
            EscalationStage::Baseline,
            self.config,
        );
        self.report(&result);
        if !result.durbin_watson.has_autocorrelation {
            return Ok(result);
        }

        let lags = self.select_lags(y, predictors);
        self.observer.on_event(&TraceEvent::LagOrderSelected {
            context: "regression",
            lag_order: lags,
        });
        if n > lags + self.config.min_lag_headroom {
            let (y_lagged, columns) = lagged_design(y, predictors, lags);
            let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
            let fit = ols::fit(&y_lagged, &refs, true, CovarianceType::NonRobust)?;
            let result = RegressionResult::from_fit(
                &fit,
                dependent,
                &lagged_names(dependent, predictor_names, lags),
                EscalationStage::Lagged { lags },
                self.config,
            );
            self.report(&result);
            if !result.durbin_watson.has_autocorrelation {
                return Ok(result);
            }
        }

        let robust = ols::fit(y, predictors, true, CovarianceType::Hac { max_lags: None })?;
        let result = RegressionResult::from_fit(
            &robust,
            dependent,
            &base_names,
            EscalationStage::RobustCovariance { lags: 0 },
            self.config,
        );
        self.report(&result);
        Ok(result)
    }

    /// Lag count in `1..=max_regression_lags` minimising `n ln(RSS/n) + 2p`.
    ///
    /// Infeasible or failing candidates are skipped; ties keep the smaller lag.
    pub fn select_lags(&self, y: &[f64], predictors: &[&[f64]]) -> usize {
        let n = y.len();
        let mut best: Option<(f64, usize)> = None;
        for lags in 1..=self.config.max_regression_lags {
            if n <= lags + self.config.min_lag_headroom {
                continue;
            }
            let (y_lagged, columns) = lagged_design(y, predictors, lags);
            let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
            let Ok(fit) = ols::fit(&y_lagged, &refs, true, CovarianceType::NonRobust) else {
                continue;
            };
            let aic = fit.aic();
            if aic.is_finite() && best.map_or(true, |(b, _)| aic < b) {
                best = Some((aic, lags));
            }
        }
        best.map_or(1, |(_, lags)| lags)
    }

    fn report(&self, result: &RegressionResult) {
        self.observer.on_event(&TraceEvent::Escalation {
            dependent_variable: result.dependent_variable.clone(),
            stage: result.stage,
            durbin_watson: result.durbin_watson.statistic,
            autocorrelated: result.durbin_watson.has_autocorrelation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{NullObserver, RecordingObserver};

    #[test]
    fn lagged_design_aligns_columns() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x = [10.0, 20.0, 30.0, 40.0, 50.0];
        let (yl, cols) = lagged_design(&y, &[&x], 2);
        assert_eq!(yl, vec![3.0, 4.0, 5.0]);
        assert_eq!(cols[0], vec![30.0, 40.0, 50.0]);
        assert_eq!(cols[1], vec![2.0, 3.0, 4.0]);
        assert_eq!(cols[2], vec![1.0, 2.0, 3.0]);
        assert_eq!(cols[3], vec![20.0, 30.0, 40.0]);
        assert_eq!(cols[4], vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn lagged_names_follow_design_order() {
        let names = lagged_names("y", &["a".to_string(), "b".to_string()], 1);
        assert_eq!(names, vec!["const", "a", "b", "lag1_y", "lag1_a", "lag1_b"]);
    }

    #[test]
    fn display_names_mark_differences() {
        assert_eq!(display_name("gdp", 0), "gdp");
        assert_eq!(display_name("gdp", 1), "Δgdp");
        assert_eq!(display_name("gdp", 2), "Δ²gdp");
    }

    #[test]
    fn stage_serializes_tagged() {
        let json = serde_json::to_value(EscalationStage::Lagged { lags: 3 }).unwrap();
        assert_eq!(json["kind"], "lagged");
        assert_eq!(json["lags"], 3);
        let json = serde_json::to_value(EscalationStage::Baseline).unwrap();
        assert_eq!(json["kind"], "baseline");
    }

    #[test]
    fn alternating_residuals_escalate() {
        // Residuals that flip sign every step push DW far above 2.5.
        let n = 60;
        let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let flip = if i % 2 == 0 { 0.5 } else { -0.5 };
                let jitter = ((i * 7919 + 3) % 11) as f64 / 110.0;
                1.0 + 2.0 * v + flip + jitter
            })
            .collect();
        let config = PipelineConfig::default();
        let rec = RecordingObserver::new();
        let r = EscalationBuilder::new(&config, &rec)
            .build(&y, &[&x], "y", &["x".to_string()])
            .unwrap();
        assert_ne!(r.stage, EscalationStage::Baseline);
        assert!(r.has_lags || r.uses_robust_covariance);
        let stages = rec
            .events()
            .iter()
            .filter(|e| matches!(e, TraceEvent::Escalation { .. }))
            .count();
        assert!(stages >= 2);
    }

    #[test]
    fn lag_selection_falls_back_to_one_when_infeasible() {
        let config = PipelineConfig::default();
        let b = EscalationBuilder::new(&config, &NullObserver);
        let y: Vec<f64> = (0..11).map(|i| i as f64).collect();
        assert_eq!(b.select_lags(&y, &[]), 1);
    }

    #[test]
    fn mismatched_names_are_rejected() {
        let config = PipelineConfig::default();
        let b = EscalationBuilder::new(&config, &NullObserver);
        let y = vec![1.0; 30];
        assert!(b.build(&y, &[&y], "y", &[]).is_err());
    }
}
