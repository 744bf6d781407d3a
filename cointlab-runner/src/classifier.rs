//! Integration-order classifier — the unit-root / stationarity decision table.
//!
//! At each order the current (differenced) series is tested with both a
//! unit-root test and a stationarity test. Agreement decides immediately;
//! disagreement is arbitrated by a break-robust unit-root test when the
//! sample is long enough.

use cointlab_core::domain::{is_degenerate, difference};
use cointlab_core::domain::{BreakVerdict, StationarityVerdict, TrendSpec, UnitRootVerdict};
use cointlab_core::oracle::StationarityOracle;
use cointlab_core::StatsError;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::observer::{AnalysisObserver, TraceEvent};

/// Integration order of one series with the verdicts that decided it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOrderResult {
    pub order: usize,
    pub adf: UnitRootVerdict,
    pub kpss: StationarityVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub za: Option<BreakVerdict>,
    pub has_conflict: bool,
    /// Break index in the input series' index space.
    pub structural_break: Option<usize>,
}

/// Runs the decision table against a stationarity oracle.
pub struct Classifier<'a> {
    oracle: &'a dyn StationarityOracle,
    config: &'a PipelineConfig,
    observer: &'a dyn AnalysisObserver,
}

impl<'a> Classifier<'a> {
    pub fn new(
        oracle: &'a dyn StationarityOracle,
        config: &'a PipelineConfig,
        observer: &'a dyn AnalysisObserver,
    ) -> Self {
        Self {
            oracle,
            config,
            observer,
        }
    }

    /// Classify `values` with the externally chosen deterministic terms.
    ///
    /// `series_index` only labels trace events.
    pub fn classify(
        &self,
        series_index: usize,
        values: &[f64],
        trend: TrendSpec,
    ) -> Result<IntegrationOrderResult, StatsError> {
        let max_order = self.config.max_integration_order;
        let mut current = values.to_vec();
        let mut last: Option<(UnitRootVerdict, StationarityVerdict)> = None;

        for order in 0..=max_order {
            if is_degenerate(&current, self.config.constant_variance_epsilon) {
                self.observer.on_event(&TraceEvent::DegenerateSeries {
                    series_index,
                    order,
                });
                let result = IntegrationOrderResult {
                    order,
                    adf: UnitRootVerdict::degenerate(current.len()),
                    kpss: StationarityVerdict::degenerate(),
                    za: None,
                    has_conflict: false,
                    structural_break: None,
                };
                return Ok(self.resolved(series_index, result));
            }

            let adf = self.oracle.unit_root(&current)?;
            let kpss = self.oracle.stationarity(&current, trend)?;
            self.observer.on_event(&TraceEvent::OrderStep {
                series_index,
                order,
                n_obs: current.len(),
                unit_root_stationary: adf.is_stationary,
                stationarity_stationary: kpss.is_stationary,
            });
            let can_difference = order < max_order;

            let outcome = |order, za, has_conflict, structural_break| IntegrationOrderResult {
                order,
                adf: adf.clone(),
                kpss: kpss.clone(),
                za,
                has_conflict,
                structural_break,
            };

            match (adf.is_stationary, kpss.is_stationary) {
                (true, true) => {
                    return Ok(self.resolved(series_index, outcome(order, None, false, None)));
                }
                (false, false) => {
                    if !can_difference {
                        return Ok(self.resolved(series_index, outcome(max_order, None, false, None)));
                    }
                }
                (false, true) => match self.break_test(series_index, order, &current, trend)? {
                    None => {
                        if !can_difference {
                            return Ok(self.resolved(series_index, outcome(max_order, None, true, None)));
                        }
                    }
                    Some(za) => {
                        let brk = break_index(&za, order);
                        if za.is_stationary {
                            return Ok(self.resolved(series_index, outcome(order, Some(za), false, brk)));
                        }
                        if !can_difference {
                            return Ok(self.resolved(series_index, outcome(max_order, Some(za), true, brk)));
                        }
                    }
                },
                (true, false) => {
                    let result = match self.break_test(series_index, order, &current, trend)? {
                        None => outcome(order, None, true, None),
                        Some(za) => {
                            let conflict = !za.is_stationary;
                            outcome(order, Some(za), conflict, None)
                        }
                    };
                    return Ok(self.resolved(series_index, result));
                }
            }

            last = Some((adf, kpss));
            current = difference(&current);
        }

        // Only reachable if every order asked to difference; keep the last verdicts.
        let (adf, kpss) = match last {
            Some(v) => v,
            None => {
                return Err(StatsError::Unsupported(
                    "classification requires at least one test order".into(),
                ))
            }
        };
        Ok(self.resolved(
            series_index,
            IntegrationOrderResult {
                order: max_order,
                adf,
                kpss,
                za: None,
                has_conflict: false,
                structural_break: None,
            },
        ))
    }

    /// Run the break oracle, or `None` when the sample is too short for it.
    ///
    /// A sample above the configured minimum can still be too short for the
    /// oracle's lag search; that is treated the same way.
    fn break_test(
        &self,
        series_index: usize,
        order: usize,
        current: &[f64],
        trend: TrendSpec,
    ) -> Result<Option<BreakVerdict>, StatsError> {
        if current.len() < self.config.min_break_test_observations {
            self.skipped(series_index, order, current.len());
            return Ok(None);
        }
        let za = match self.oracle.structural_break(current, trend) {
            Ok(za) => za,
            Err(StatsError::InsufficientData { .. }) => {
                self.skipped(series_index, order, current.len());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.observer.on_event(&TraceEvent::BreakTestRun {
            series_index,
            order,
            breakpoint: break_index(&za, order),
            is_stationary: za.is_stationary,
        });
        Ok(Some(za))
    }

    fn skipped(&self, series_index: usize, order: usize, n_obs: usize) {
        self.observer.on_event(&TraceEvent::BreakTestSkipped {
            series_index,
            order,
            n_obs,
        });
    }

    fn resolved(&self, series_index: usize, result: IntegrationOrderResult) -> IntegrationOrderResult {
        self.observer.on_event(&TraceEvent::OrderResolved {
            series_index,
            order: result.order,
            has_conflict: result.has_conflict,
            structural_break: result.structural_break,
        });
        result
    }
}

/// Break location mapped back to the undifferenced series. Zero means none.
fn break_index(za: &BreakVerdict, differences: usize) -> Option<usize> {
    (za.breakpoint > 0).then_some(za.breakpoint + differences)
}
