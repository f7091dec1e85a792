//! Outlier classification from fitted quantiles.
//!
//! Two complementary views:
//!
//! - **Residual-based** ([`residual_outliers`]): compute residuals against
//!   one designated fit, then flag points whose residual falls outside a
//!   fence derived from the residual distribution. The fence rule is a
//!   swappable [`OutlierIdentifier`] strategy.
//! - **Band-based** ([`band_outliers`]): flag points that escape the band
//!   between a low and a high fitted quantile. This is the primary
//!   contextual method — membership in the band, not residual statistics.

use crate::{
    analytics::{residuals::ErrorMode, zero_tolerance},
    error::{Error, Result},
    registry::FittedCurve,
    statistics,
    value::Value,
};

/// Strategy for turning a residual distribution into an outlier fence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierIdentifier<T: Value> {
    /// Tukey's rule: outside `[Q1 - factor·IQR, Q3 + factor·IQR]`.
    ///
    /// The classic factor is 1.5 (the [`Default`] strategy).
    Quartile {
        /// Multiplier on the interquartile range.
        factor: T,
    },

    /// Hampel's rule: farther than `factor` scaled MADs from the median.
    ///
    /// The MAD is scaled by 1.4826 so the factor is comparable to
    /// standard deviations under normality; 3 is the classic choice.
    Hampel {
        /// Multiplier on the scaled median absolute deviation.
        factor: T,
    },
}

impl<T: Value> Default for OutlierIdentifier<T> {
    fn default() -> Self {
        Self::Quartile {
            factor: <T as Value>::from_f64(1.5),
        }
    }
}

/// Consistency constant relating the MAD to the standard deviation under
/// normality.
const MAD_SCALE: f64 = 1.4826;

impl<T: Value> OutlierIdentifier<T> {
    /// Computes the `(lower, upper)` fence for a residual distribution.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] for an empty residual set.
    pub fn fences(&self, residuals: &[T]) -> Result<(T, T)> {
        match *self {
            Self::Quartile { factor } => {
                let (q1, q3) = statistics::quartiles(residuals).ok_or(Error::NoData)?;
                let iqr = q3 - q1;
                Ok((q1 - factor * iqr, q3 + factor * iqr))
            }
            Self::Hampel { factor } => {
                let center = statistics::median(residuals).ok_or(Error::NoData)?;
                let mad = statistics::median_absolute_deviation(residuals).ok_or(Error::NoData)?;
                let spread = factor * <T as Value>::from_f64(MAD_SCALE) * mad;
                Ok((center - spread, center + spread))
            }
        }
    }
}

/// Flags the observations whose residual against `curve` falls outside the
/// identifier's fence.
///
/// Returns the flagged observations with their original coordinates.
///
/// # Errors
/// Propagates residual-computation failures; see
/// [`crate::analytics::residuals`].
pub fn residual_outliers<T: Value>(
    data: &[(T, T)],
    curve: &FittedCurve<T>,
    identifier: &OutlierIdentifier<T>,
    mode: ErrorMode,
) -> Result<Vec<(T, T)>> {
    let residuals = super::residuals::residuals(data, curve, mode)?;
    let (lower, upper) = identifier.fences(&residuals)?;

    // Under ZeroPolicy::Skip the residual sequence may be shorter than the
    // dataset; re-derive per-point residuals for the pairing instead
    let tolerance = zero_tolerance(data);
    let mut flagged = Vec::new();
    for &(x, y) in data {
        let fitted = curve.y(x);
        let residual = match mode {
            ErrorMode::Absolute => y - fitted,
            ErrorMode::Relative(_) => {
                if Value::abs(fitted) <= tolerance {
                    continue;
                }
                (y - fitted) / fitted
            }
        };
        if residual < lower || residual > upper {
            flagged.push((x, y));
        }
    }
    Ok(flagged)
}

/// Flags the observations outside the band between two fitted quantiles.
///
/// A point is an outlier when `y < f_lo(x)` or `y > f_hi(x)` beyond the
/// data-scale epsilon.
pub fn band_outliers<T: Value>(
    data: &[(T, T)],
    low: &FittedCurve<T>,
    high: &FittedCurve<T>,
) -> Vec<(T, T)> {
    let tolerance = zero_tolerance(data);
    data.iter()
        .copied()
        .filter(|&(x, y)| y < low.y(x) - tolerance || y > high.y(x) + tolerance)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        assert_close,
        basis::{Basis, BasisFunction, BasisSpec},
        registry::FittedCurve,
    };

    fn constant_curve(value: f64) -> FittedCurve<f64> {
        let funcs: Vec<Arc<dyn BasisFunction<f64>>> = vec![Arc::new(|_x: f64| 1.0)];
        let basis = Basis::build(&BasisSpec::functions(funcs), (0.0, 1.0)).unwrap();
        FittedCurve::new(Arc::new(basis), vec![value])
    }

    #[test]
    fn test_quartile_fences() {
        let residuals: Vec<f64> = (1..=9).map(f64::from).collect();
        let identifier = OutlierIdentifier::default();
        let (lower, upper) = identifier.fences(&residuals).unwrap();
        // Q1 = 3, Q3 = 7, IQR = 4
        assert_close!(lower, -3.0, 1e-12);
        assert_close!(upper, 13.0, 1e-12);
    }

    #[test]
    fn test_hampel_fences() {
        let residuals = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let identifier = OutlierIdentifier::Hampel { factor: 3.0 };
        let (lower, upper) = identifier.fences(&residuals).unwrap();
        // median = 3, MAD = 1
        assert_close!(lower, 3.0 - 3.0 * 1.4826, 1e-9);
        assert_close!(upper, 3.0 + 3.0 * 1.4826, 1e-9);
    }

    #[test]
    fn test_residual_outliers_flags_the_spike() {
        let mut data: Vec<(f64, f64)> = (0..40).map(|i| (f64::from(i), f64::from(i % 3))).collect();
        data.push((40.0, 100.0));
        let curve = constant_curve(1.0);
        let flagged = residual_outliers(
            &data,
            &curve,
            &OutlierIdentifier::default(),
            ErrorMode::Absolute,
        )
        .unwrap();
        assert_eq!(flagged, vec![(40.0, 100.0)]);
    }

    #[test]
    fn test_band_outliers() {
        let data = vec![(0.0, 0.5), (1.0, 3.0), (2.0, -1.0), (3.0, 1.0)];
        let low = constant_curve(0.0);
        let high = constant_curve(2.0);
        let flagged = band_outliers(&data, &low, &high);
        assert_eq!(flagged, vec![(1.0, 3.0), (2.0, -1.0)]);
    }

    #[test]
    fn test_band_keeps_boundary_points() {
        let data = vec![(0.0, 0.0), (1.0, 2.0)];
        let low = constant_curve(0.0);
        let high = constant_curve(2.0);
        assert!(band_outliers(&data, &low, &high).is_empty());
    }
}
