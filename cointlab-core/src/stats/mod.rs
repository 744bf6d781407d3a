//! Statistical routines backing the default oracles.

pub mod adf;
pub mod cointegration;
pub mod decomposition;
pub mod distributions;
pub mod kpss;
pub mod linalg;
pub mod mackinnon;
pub mod ols;
pub mod var;
pub mod zivot_andrews;

pub use adf::{adf_test, AdfOptions};
pub use cointegration::{engle_granger, johansen, MAX_JOHANSEN_SERIES};
pub use decomposition::{
    autocorrelation_at_lag, decompose, fallback_period, find_period_via_acf,
    seasonal_trend_strength, Decomposition,
};
pub use kpss::kpss_test;
pub use ols::{durbin_watson, CovarianceType, OlsFit};
pub use var::VarFit;
pub use zivot_andrews::{zivot_andrews_test, ZivotAndrewsOptions};
