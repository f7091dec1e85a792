//! Derived analytics over a fitted quantile family
//!
//! Everything in this module consumes the dataset and one or more fitted
//! curves; nothing here mutates the registry. The operations mirror the
//! questions a fitted quantile family can answer:
//!
//! - [`residuals`]/[`mean_error`]: how far is each point from a curve?
//! - [`residual_outliers`]: which points have anomalous residuals,
//!   under a swappable identification rule ([`OutlierIdentifier`])?
//! - [`band_outliers`]: which points escape the band between a low and a
//!   high fitted quantile?
//! - [`path_points`]: which points track a given quantile curve?
//! - [`ConditionalCdf`]: what is the distribution of y at a fixed x,
//!   reconstructed from the family?
//! - [`Simulation`]: draw new synthetic series consistent with the family.
//!
//! All of these are also reachable as methods on
//! [`crate::QuantileAnalysis`], which resolves the fits from its registry
//! first.

use crate::value::{CoordExt, Value};

pub(crate) mod cdf;
pub(crate) mod outliers;
pub(crate) mod residuals;
pub(crate) mod simulate;

pub use cdf::ConditionalCdf;
pub use outliers::{band_outliers, residual_outliers, OutlierIdentifier};
pub use residuals::{mean_error, path_points, residuals, ErrorMode, ZeroPolicy};
pub use simulate::{Simulation, XSampling};

/// Residuals smaller than this fraction of the data's y-scale are treated
/// as exactly zero for classification purposes.
const ZERO_FRACTION: f64 = 1e-9;

/// The classification tolerance for a dataset: 1e-9 relative to its
/// y-scale, with a floor of 1e-9 for data clustered around zero.
pub(crate) fn zero_tolerance<T: Value>(data: &[(T, T)]) -> T {
    let scale = data
        .y_range()
        .map(|r| nalgebra::RealField::max(Value::abs(r.start), Value::abs(r.end)))
        .unwrap_or_else(T::one);
    <T as Value>::from_f64(ZERO_FRACTION) * nalgebra::RealField::max(scale, T::one())
}
