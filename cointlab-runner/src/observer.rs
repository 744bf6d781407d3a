//! Decision trace — typed events emitted at every pipeline decision.
//!
//! The pipeline never logs directly; it reports to an injected
//! [`AnalysisObserver`]. Three sinks ship with the crate:
//! - [`TracingObserver`] forwards events to `tracing` with structured fields
//! - [`NullObserver`] discards them
//! - [`RecordingObserver`] keeps them in memory for tests and `--trace` output

use std::sync::Mutex;

use cointlab_core::TrendSpec;
use serde::Serialize;

use crate::cointegration::CointegrationTest;
use crate::decider::ModelType;
use crate::regression::EscalationStage;

/// How the dependent variable was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetReason {
    Explicit,
    Keyword { keyword: String },
    Default,
}

/// One step of the decision trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    TargetSelected {
        index: usize,
        name: String,
        reason: TargetReason,
    },
    TrendSpecChosen {
        series_index: usize,
        trend: TrendSpec,
        trend_strength: f64,
        period: Option<usize>,
    },
    OrderStep {
        series_index: usize,
        order: usize,
        n_obs: usize,
        unit_root_stationary: bool,
        stationarity_stationary: bool,
    },
    DegenerateSeries {
        series_index: usize,
        order: usize,
    },
    BreakTestRun {
        series_index: usize,
        order: usize,
        breakpoint: Option<usize>,
        is_stationary: bool,
    },
    BreakTestSkipped {
        series_index: usize,
        order: usize,
        n_obs: usize,
    },
    OrderResolved {
        series_index: usize,
        order: usize,
        has_conflict: bool,
        structural_break: Option<usize>,
    },
    ModelTypeDecided {
        orders: Vec<usize>,
        model_type: ModelType,
    },
    BreaksMerged {
        candidates: usize,
        kept: Vec<usize>,
    },
    PeriodProfiled {
        period_number: usize,
        start_index: usize,
        end_index: usize,
        model_type: Option<ModelType>,
        error: Option<String>,
    },
    CointegrationChecked {
        test_type: CointegrationTest,
        is_cointegrated: bool,
        relations: Option<usize>,
    },
    Escalation {
        dependent_variable: String,
        stage: EscalationStage,
        durbin_watson: f64,
        autocorrelated: bool,
    },
    LagOrderSelected {
        context: &'static str,
        lag_order: usize,
    },
    StageFailed {
        stage: &'static str,
        message: String,
    },
    Warning {
        message: String,
    },
}

/// Receives the decision trace of an analysis.
///
/// Implementations must be cheap: the classifier emits several events per series.
pub trait AnalysisObserver: Send + Sync {
    fn on_event(&self, event: &TraceEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {
    fn on_event(&self, _event: &TraceEvent) {}
}

/// Forwards events to the `tracing` subscriber.
///
/// Order steps and break tests are `debug`, decisions are `info`,
/// failures and warnings are `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_event(&self, event: &TraceEvent) {
        match event {
            TraceEvent::TargetSelected {
                index,
                name,
                reason,
            } => {
                tracing::info!(index, name = %name, reason = ?reason, "target variable selected");
            }
            TraceEvent::TrendSpecChosen {
                series_index,
                trend,
                trend_strength,
                period,
            } => {
                tracing::debug!(series_index, trend = %trend, trend_strength, period = ?period, "trend spec chosen");
            }
            TraceEvent::OrderStep {
                series_index,
                order,
                n_obs,
                unit_root_stationary,
                stationarity_stationary,
            } => {
                tracing::debug!(
                    series_index,
                    order,
                    n_obs,
                    unit_root_stationary,
                    stationarity_stationary,
                    "integration order step"
                );
            }
            TraceEvent::DegenerateSeries {
                series_index,
                order,
            } => {
                tracing::debug!(series_index, order, "constant series treated as stationary");
            }
            TraceEvent::BreakTestRun {
                series_index,
                order,
                breakpoint,
                is_stationary,
            } => {
                tracing::debug!(series_index, order, breakpoint = ?breakpoint, is_stationary, "break test");
            }
            TraceEvent::BreakTestSkipped {
                series_index,
                order,
                n_obs,
            } => {
                tracing::debug!(series_index, order, n_obs, "break test skipped, sample too short");
            }
            TraceEvent::OrderResolved {
                series_index,
                order,
                has_conflict,
                structural_break,
            } => {
                tracing::info!(
                    series_index,
                    order,
                    has_conflict,
                    structural_break = ?structural_break,
                    "integration order resolved"
                );
            }
            TraceEvent::ModelTypeDecided { orders, model_type } => {
                tracing::info!(orders = ?orders, model_type = ?model_type, "model type decided");
            }
            TraceEvent::BreaksMerged { candidates, kept } => {
                tracing::info!(candidates, kept = ?kept, "breakpoints merged");
            }
            TraceEvent::PeriodProfiled {
                period_number,
                start_index,
                end_index,
                model_type,
                error,
            } => match error {
                Some(message) => tracing::warn!(
                    period_number,
                    start_index,
                    end_index,
                    error = %message,
                    "period profiling failed"
                ),
                None => tracing::info!(
                    period_number,
                    start_index,
                    end_index,
                    model_type = ?model_type,
                    "period profiled"
                ),
            },
            TraceEvent::CointegrationChecked {
                test_type,
                is_cointegrated,
                relations,
            } => {
                tracing::info!(test_type = ?test_type, is_cointegrated, relations = ?relations, "cointegration checked");
            }
            TraceEvent::Escalation {
                dependent_variable,
                stage,
                durbin_watson,
                autocorrelated,
            } => {
                tracing::info!(
                    dependent_variable = %dependent_variable,
                    stage = ?stage,
                    durbin_watson,
                    autocorrelated,
                    "regression stage"
                );
            }
            TraceEvent::LagOrderSelected { context, lag_order } => {
                tracing::debug!(context, lag_order, "lag order selected");
            }
            TraceEvent::StageFailed { stage, message } => {
                tracing::warn!(stage, error = %message, "stage failed");
            }
            TraceEvent::Warning { message } => {
                tracing::warn!("{message}");
            }
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        match self.events.into_inner() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AnalysisObserver for RecordingObserver {
    fn on_event(&self, event: &TraceEvent) {
        let mut guard = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(event.clone());
    }
}

/// Fans one event out to two sinks.
pub struct Tee<'a> {
    first: &'a dyn AnalysisObserver,
    second: &'a dyn AnalysisObserver,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn AnalysisObserver, second: &'a dyn AnalysisObserver) -> Self {
        Self { first, second }
    }
}

impl AnalysisObserver for Tee<'_> {
    fn on_event(&self, event: &TraceEvent) {
        self.first.on_event(event);
        self.second.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let rec = RecordingObserver::new();
        rec.on_event(&TraceEvent::Warning {
            message: "a".into(),
        });
        rec.on_event(&TraceEvent::DegenerateSeries {
            series_index: 1,
            order: 0,
        });
        let events = rec.into_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TraceEvent::Warning { .. }));
    }

    #[test]
    fn tee_forwards_to_both() {
        let a = RecordingObserver::new();
        let b = RecordingObserver::new();
        let tee = Tee::new(&a, &b);
        tee.on_event(&TraceEvent::BreaksMerged {
            candidates: 3,
            kept: vec![40],
        });
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(TraceEvent::LagOrderSelected {
            context: "var",
            lag_order: 2,
        })
        .unwrap();
        assert_eq!(json["event"], "lag_order_selected");
        assert_eq!(json["lag_order"], 2);
    }

    #[test]
    fn null_and_tracing_observers_accept_events() {
        let event = TraceEvent::StageFailed {
            stage: "var",
            message: "singular".into(),
        };
        NullObserver.on_event(&event);
        TracingObserver.on_event(&event);
    }
}
