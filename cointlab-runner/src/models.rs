//! Model builders — dispatch a profiled block to levels OLS, ECM, VAR or mixed regression.
//!
//! Every stage catches its own failure and reports it as `error_message`
//! naming the stage; a failed block never aborts the analysis.

use cointlab_core::domain::{difference, difference_n, Series, TrendSpec};
use cointlab_core::stats::linalg::{series_matrix, to_dvector};
use cointlab_core::stats::ols::{self, CovarianceType};
use cointlab_core::stats::var;
use cointlab_core::StatsError;

use crate::analysis::Oracles;
use crate::cointegration::{self, CointegrationResult};
use crate::config::PipelineConfig;
use crate::decider::ModelType;
use crate::observer::{AnalysisObserver, TraceEvent};
use crate::profile::BlockProfile;
use crate::regression::{
    display_name, EscalationBuilder, EscalationStage, RegressionResult, ECT_NAME,
};
use crate::result::{ModelKind, ModelOutcome, Transformation, TransformationInfo};

/// Model of one block plus the transformations applied, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltModel {
    pub outcome: ModelOutcome,
    pub transformations: Option<Vec<TransformationInfo>>,
}

/// Long-run and short-run equations of an error-correction model.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCorrectionFit {
    pub long_run: RegressionResult,
    pub short_run: RegressionResult,
}

pub struct ModelBuilder<'a> {
    oracles: Oracles<'a>,
    config: &'a PipelineConfig,
    observer: &'a dyn AnalysisObserver,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        oracles: Oracles<'a>,
        config: &'a PipelineConfig,
        observer: &'a dyn AnalysisObserver,
    ) -> Self {
        Self {
            oracles,
            config,
            observer,
        }
    }

    /// Fit the model implied by `profile.model_type`. Series 0 is the dependent variable.
    pub fn build(&self, series: &[Series], profile: &BlockProfile) -> BuiltModel {
        match profile.model_type {
            ModelType::FullStationary => BuiltModel {
                outcome: match self.levels(series) {
                    Ok(regression) => ModelOutcome {
                        model: Some(ModelKind::LevelsOls),
                        regression: Some(regression),
                        ..Default::default()
                    },
                    Err(e) => self.failed("levels regression", e),
                },
                transformations: None,
            },
            ModelType::FullNonStationary => BuiltModel {
                outcome: self.non_stationary(series, profile.target_trend()),
                transformations: None,
            },
            ModelType::Mixed => {
                let orders = profile.orders();
                match self.mixed(series, &orders) {
                    Ok((regression, transformations)) => BuiltModel {
                        outcome: ModelOutcome {
                            model: Some(ModelKind::MixedRegression),
                            regression: Some(regression),
                            ..Default::default()
                        },
                        transformations: Some(transformations),
                    },
                    Err(e) => BuiltModel {
                        outcome: self.failed("mixed-order regression", e),
                        transformations: Some(transformations_for(series, &orders)),
                    },
                }
            }
        }
    }

    /// Escalated regression of series 0 on the others, in levels.
    pub fn levels(&self, series: &[Series]) -> Result<RegressionResult, StatsError> {
        let (target, rest) = split_target(series)?;
        let predictors: Vec<&[f64]> = rest.iter().map(Series::values).collect();
        let names: Vec<String> = rest.iter().map(|s| s.name.clone()).collect();
        EscalationBuilder::new(self.config, self.observer).build(
            target.values(),
            &predictors,
            &target.name,
            &names,
        )
    }

    fn non_stationary(&self, series: &[Series], trend: TrendSpec) -> ModelOutcome {
        let coint = match cointegration::check(
            series,
            trend,
            self.oracles.cointegration,
            self.config,
            self.observer,
        ) {
            Ok(c) => c,
            Err(e) => return self.failed("cointegration test", e),
        };

        if coint.is_cointegrated {
            return match self.error_correction(series, trend) {
                Ok(ecm) => ModelOutcome {
                    model: Some(ModelKind::ErrorCorrection),
                    cointegration: Some(coint),
                    regression: Some(ecm.short_run),
                    long_run: Some(ecm.long_run),
                    ..Default::default()
                },
                Err(e) => self.failed_with(coint, "error-correction model", e),
            };
        }

        match self.var_on_differences(series) {
            Ok((regression, lag_order)) => ModelOutcome {
                model: Some(ModelKind::VarDifferences),
                cointegration: Some(coint),
                regression: Some(regression),
                var_lag_order: Some(lag_order),
                ..Default::default()
            },
            Err(e) => self.failed_with(coint, "VAR model", e),
        }
    }

    /// Long-run OLS in levels, then an escalated short-run regression of
    /// `Δy` on the lagged equilibrium error and the predictors' differences.
    pub fn error_correction(
        &self,
        series: &[Series],
        trend: TrendSpec,
    ) -> Result<ErrorCorrectionFit, StatsError> {
        let (target, rest) = split_target(series)?;
        let y = target.values();
        let n = y.len();

        let time: Vec<f64> = (0..n).map(|t| t as f64).collect();
        let mut long_columns: Vec<&[f64]> = Vec::with_capacity(rest.len() + 1);
        let mut long_names = vec!["const".to_string()];
        if trend == TrendSpec::ConstantTrend {
            long_columns.push(&time);
            long_names.push("trend".to_string());
        }
        for s in rest {
            long_columns.push(s.values());
            long_names.push(s.name.clone());
        }
        let long_fit = ols::fit(y, &long_columns, true, CovarianceType::NonRobust)?;
        let long_run = RegressionResult::from_fit(
            &long_fit,
            &target.name,
            &long_names,
            EscalationStage::Baseline,
            self.config,
        );

        let ect_lagged = &long_fit.residuals[..n.saturating_sub(1)];
        let dy = difference(y);
        let dx: Vec<Vec<f64>> = rest.iter().map(|s| difference(s.values())).collect();
        let mut predictors: Vec<&[f64]> = vec![ect_lagged];
        predictors.extend(dx.iter().map(Vec::as_slice));
        let mut names = vec![ECT_NAME.to_string()];
        names.extend(rest.iter().map(|s| display_name(&s.name, 1)));

        let short_run = EscalationBuilder::new(self.config, self.observer).build(
            &dy,
            &predictors,
            &display_name(&target.name, 1),
            &names,
        )?;
        if let Some(ect) = short_run.coefficient(ECT_NAME) {
            if ect.value >= 0.0 {
                self.observer.on_event(&TraceEvent::Warning {
                    message: format!(
                        "error-correction coefficient is non-negative ({:.4}); no adjustment toward equilibrium",
                        ect.value
                    ),
                });
            }
        }
        Ok(ErrorCorrectionFit {
            long_run,
            short_run,
        })
    }

    /// VAR on first differences; reports the target equation and the lag order.
    ///
    /// If the target equation's residuals are autocorrelated it is refit with
    /// HAC covariance.
    pub fn var_on_differences(&self, series: &[Series]) -> Result<(RegressionResult, usize), StatsError> {
        let (target, _) = split_target(series)?;
        let diffs: Vec<Vec<f64>> = series.iter().map(|s| difference(s.values())).collect();
        let columns: Vec<&[f64]> = diffs.iter().map(Vec::as_slice).collect();
        let data = series_matrix(&columns)?;

        let max_lags = var::feasible_max_lag(data.nrows(), data.ncols(), self.config.var_max_lags);
        let lag_order = match var::select_order(&data, max_lags) {
            Ok(p) => p.max(1),
            Err(e) => {
                self.observer.on_event(&TraceEvent::Warning {
                    message: format!("VAR lag selection failed ({e}), using lag 1"),
                });
                1
            }
        };
        self.observer.on_event(&TraceEvent::LagOrderSelected {
            context: "var",
            lag_order,
        });

        let fit = var::fit(&data, lag_order)?;
        let dependent = display_name(&target.name, 1);
        let names: Vec<String> = (0..fit.params.nrows())
            .map(|row| match fit.regressor_at(row) {
                None => "const".to_string(),
                Some((lag, j)) => format!("lag{lag}_{}", display_name(&series[j].name, 1)),
            })
            .collect();
        let y0 = to_dvector(&diffs[0][lag_order..]);

        let equation = ols::fit_matrix(&y0, &fit.design, Some(0), CovarianceType::NonRobust)?;
        let mut result = RegressionResult::from_fit(
            &equation,
            &dependent,
            &names,
            EscalationStage::Lagged { lags: lag_order },
            self.config,
        );
        // System estimates use normal inference.
        for (row, c) in result.coefficients.iter_mut().enumerate() {
            c.std_error = fit.std_errors[(row, 0)];
            c.t_value = fit.t_values[(row, 0)];
            c.p_value = fit.p_values[(row, 0)];
            c.is_significant = c.p_value < self.config.significance;
        }
        self.observer.on_event(&TraceEvent::Escalation {
            dependent_variable: dependent.clone(),
            stage: result.stage,
            durbin_watson: result.durbin_watson.statistic,
            autocorrelated: result.durbin_watson.has_autocorrelation,
        });
        if !result.durbin_watson.has_autocorrelation {
            return Ok((result, lag_order));
        }

        let robust = ols::fit_matrix(
            &y0,
            &fit.design,
            Some(0),
            CovarianceType::Hac { max_lags: None },
        )?;
        let result = RegressionResult::from_fit(
            &robust,
            &dependent,
            &names,
            EscalationStage::RobustCovariance { lags: lag_order },
            self.config,
        );
        self.observer.on_event(&TraceEvent::Escalation {
            dependent_variable: dependent,
            stage: result.stage,
            durbin_watson: result.durbin_watson.statistic,
            autocorrelated: result.durbin_watson.has_autocorrelation,
        });
        Ok((result, lag_order))
    }

    /// Difference each series by its order, tail-align, and run the escalation.
    pub fn mixed(
        &self,
        series: &[Series],
        orders: &[usize],
    ) -> Result<(RegressionResult, Vec<TransformationInfo>), StatsError> {
        if orders.len() != series.len() {
            return Err(StatsError::DimensionMismatch(format!(
                "{} series but {} orders",
                series.len(),
                orders.len()
            )));
        }
        let (target, rest) = split_target(series)?;
        let transformed: Vec<Vec<f64>> = series
            .iter()
            .zip(orders)
            .map(|(s, &d)| difference_n(s.values(), d))
            .collect();
        let aligned_len = transformed.iter().map(Vec::len).min().unwrap_or(0);
        let aligned: Vec<&[f64]> = transformed
            .iter()
            .map(|v| &v[v.len() - aligned_len..])
            .collect();

        let names: Vec<String> = rest
            .iter()
            .zip(&orders[1..])
            .map(|(s, &d)| display_name(&s.name, d))
            .collect();
        let regression = EscalationBuilder::new(self.config, self.observer).build(
            aligned[0],
            &aligned[1..],
            &display_name(&target.name, orders[0]),
            &names,
        )?;
        Ok((regression, transformations_for(series, orders)))
    }

    fn failed(&self, stage: &'static str, e: StatsError) -> ModelOutcome {
        let message = e.to_string();
        self.observer.on_event(&TraceEvent::StageFailed {
            stage,
            message: message.clone(),
        });
        ModelOutcome::failed(format!("{stage} failed: {message}"))
    }

    fn failed_with(&self, coint: CointegrationResult, stage: &'static str, e: StatsError) -> ModelOutcome {
        ModelOutcome {
            cointegration: Some(coint),
            ..self.failed(stage, e)
        }
    }
}

fn split_target(series: &[Series]) -> Result<(&Series, &[Series]), StatsError> {
    match series.split_first() {
        Some((target, rest)) if !rest.is_empty() => Ok((target, rest)),
        _ => Err(StatsError::DimensionMismatch(format!(
            "a model needs a target and at least one predictor, got {} series",
            series.len()
        ))),
    }
}

fn transformations_for(series: &[Series], orders: &[usize]) -> Vec<TransformationInfo> {
    series
        .iter()
        .zip(orders)
        .enumerate()
        .map(|(series_index, (s, &order))| TransformationInfo {
            series_index,
            variable_name: s.name.clone(),
            original_order: order,
            transformation: Transformation::for_order(order),
        })
        .collect()
}
