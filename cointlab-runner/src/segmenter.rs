//! Structural-break segmenter — merge per-series breaks and split the sample.
//!
//! Break candidates from every series are sorted and merged within a
//! tolerance window; the surviving breakpoints cut `[0, N)` into half-open
//! periods which are profiled independently. Periods are not segmented again.

use cointlab_core::domain::Series;
use cointlab_core::StatsError;
use serde::{Deserialize, Serialize};

use crate::decider::ModelType;
use crate::observer::{AnalysisObserver, TraceEvent};
use crate::profile::{BlockProfile, SeriesOrder};

/// A break reported by one series before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakCandidate {
    pub index: usize,
    pub series_index: usize,
}

/// A merged breakpoint, attributed to the series that reported it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralBreak {
    pub index: usize,
    pub series_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    BeforeBreak,
    AfterBreak,
    Custom,
}

/// One half-open window `[start_index, end_index)` of the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub period_number: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub data_size: usize,
    pub period_type: PeriodType,
}

/// A period with its sliced series and profiling outcome.
#[derive(Debug, Clone)]
pub struct PeriodData {
    pub period: Period,
    pub series: Vec<Series>,
    pub profile: Result<BlockProfile, StatsError>,
}

/// Segmentation of a block.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub model_type: ModelType,
    pub structural_breaks: Vec<StructuralBreak>,
    pub periods: Vec<PeriodData>,
}

impl PreparedData {
    pub fn has_structural_break(&self) -> bool {
        !self.structural_breaks.is_empty()
    }
}

/// Break indices strictly inside `(0, n_obs)`, in series order.
pub fn collect_candidates(orders: &[SeriesOrder], n_obs: usize) -> Vec<BreakCandidate> {
    orders
        .iter()
        .filter_map(|o| {
            o.integration
                .structural_break
                .filter(|&idx| idx > 0 && idx < n_obs)
                .map(|index| BreakCandidate {
                    index,
                    series_index: o.series_index,
                })
        })
        .collect()
}

/// Stable-sort by index and drop candidates within `tolerance` of the last kept one.
pub fn merge_breakpoints(candidates: &[BreakCandidate], tolerance: usize) -> Vec<StructuralBreak> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|c| c.index);
    let mut kept: Vec<StructuralBreak> = Vec::new();
    for c in sorted {
        let merge = kept
            .last()
            .is_some_and(|last| c.index - last.index < tolerance);
        if !merge {
            kept.push(StructuralBreak {
                index: c.index,
                series_index: c.series_index,
            });
        }
    }
    kept
}

/// Periods delimited by `[0, bp_1, …, bp_k, n_obs]`.
pub fn periods(breaks: &[StructuralBreak], n_obs: usize) -> Vec<Period> {
    let mut bounds = Vec::with_capacity(breaks.len() + 2);
    bounds.push(0);
    bounds.extend(breaks.iter().map(|b| b.index));
    bounds.push(n_obs);

    let count = bounds.len() - 1;
    bounds
        .windows(2)
        .enumerate()
        .map(|(i, w)| Period {
            period_number: i + 1,
            start_index: w[0],
            end_index: w[1],
            data_size: w[1] - w[0],
            period_type: match (count, i) {
                (2, 0) => PeriodType::BeforeBreak,
                (2, _) => PeriodType::AfterBreak,
                _ => PeriodType::Custom,
            },
        })
        .collect()
}

/// Merge the block's breaks and profile each resulting period.
///
/// `profiler` is applied to every period; its failure is stored on that
/// period and does not affect the others.
pub fn prepare(
    series: &[Series],
    profile: &BlockProfile,
    tolerance: usize,
    profiler: &dyn Fn(&[Series]) -> Result<BlockProfile, StatsError>,
    observer: &dyn AnalysisObserver,
) -> PreparedData {
    let n_obs = series.first().map_or(0, Series::len);
    let candidates = collect_candidates(&profile.series_orders, n_obs);
    let structural_breaks = merge_breakpoints(&candidates, tolerance);
    if candidates.is_empty() {
        return PreparedData {
            model_type: profile.model_type,
            structural_breaks,
            periods: Vec::new(),
        };
    }
    observer.on_event(&TraceEvent::BreaksMerged {
        candidates: candidates.len(),
        kept: structural_breaks.iter().map(|b| b.index).collect(),
    });

    let periods = periods(&structural_breaks, n_obs)
        .into_iter()
        .map(|period| {
            let sliced: Vec<Series> = series
                .iter()
                .map(|s| s.slice(period.start_index, period.end_index))
                .collect();
            let profile = profiler(&sliced);
            observer.on_event(&TraceEvent::PeriodProfiled {
                period_number: period.period_number,
                start_index: period.start_index,
                end_index: period.end_index,
                model_type: profile.as_ref().ok().map(|p| p.model_type),
                error: profile.as_ref().err().map(ToString::to_string),
            });
            PeriodData {
                period,
                series: sliced,
                profile,
            }
        })
        .collect();

    PreparedData {
        model_type: profile.model_type,
        structural_breaks,
        periods,
    }
}
