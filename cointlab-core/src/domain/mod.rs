//! Domain types for cointlab.

pub mod series;
pub mod trend;
pub mod verdict;

pub use series::{difference, difference_n, is_degenerate, mean, variance, Series};
pub use trend::TrendSpec;
pub use verdict::{
    BreakVerdict, CriticalValues, KpssCriticalValues, PairwiseCointegration, RankCointegration,
    SeasonalTrendVerdict, StationarityVerdict, UnitRootVerdict,
};
