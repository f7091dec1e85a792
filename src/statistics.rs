//! Descriptive statistics consumed by the analytics layer
//!
//! This module provides the small set of summary statistics the outlier
//! and error analytics are built on.
//!
//! # Error Metrics
//! - [`mean_absolute_error`]: Average absolute difference between observed and predicted values. Lower is better.
//!
//! # Descriptive Statistics
//! - [`mean`]: Arithmetic mean of a dataset.
//! - [`median`]: Middle value of a dataset (interpolated for even sizes).
//! - [`quartiles`]: First and third quartiles, the backbone of the Tukey fence rule.
//! - [`median_absolute_deviation`]: Median distance from the median, the backbone of the Hampel rule.
//! - [`quantile_sorted`]: Linear-interpolation sample quantile over pre-sorted data.
use crate::value::Value;

/// Computes the arithmetic mean of a dataset.
///
/// Returns NaN for an empty iterator, consistent with the underlying
/// division.
pub fn mean<T: Value>(values: impl Iterator<Item = T>) -> T {
    let mut sum = T::zero();
    let mut n = T::zero();
    for value in values {
        sum += value;
        n += T::one();
    }
    sum / n
}

/// Computes the mean absolute error between observed and predicted values.
///
/// ```math
/// MAE = Σ |y_i - y_fit_i| / n
/// ```
pub fn mean_absolute_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    mean(y.zip(y_fit).map(|(a, b)| a.abs_sub(b)))
}

/// Computes the sample quantile of pre-sorted data by linear interpolation.
///
/// Uses the `h = (n - 1)·p` positioning rule (R's type 7, the common
/// default). Returns `None` for empty input.
///
/// # Parameters
/// - `sorted`: The data, sorted ascending.
/// - `p`: The probability, clamped to `[0, 1]`.
pub fn quantile_sorted<T: Value>(sorted: &[T], p: T) -> Option<T> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    let p = nalgebra::RealField::clamp(p, T::zero(), T::one());
    let h = T::from_positive_int(n - 1) * p;
    let low = num_traits::float::FloatCore::floor(h);
    let index = low.as_usize().unwrap_or(0).min(n - 2);
    let weight = h - T::from_positive_int(index);
    Some(sorted[index] + weight * (sorted[index + 1] - sorted[index]))
}

/// Computes the median of a dataset.
///
/// Returns `None` for empty input.
pub fn median<T: Value>(values: &[T]) -> Option<T> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    quantile_sorted(&sorted, <T as Value>::from_f64(0.5))
}

/// Computes the first and third quartiles of a dataset.
///
/// Returns `None` for empty input. The interquartile range `Q3 - Q1` and
/// the derived Tukey fences `[Q1 - k·IQR, Q3 + k·IQR]` are the classic
/// spread measure behind residual-based outlier detection.
pub fn quartiles<T: Value>(values: &[T]) -> Option<(T, T)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = quantile_sorted(&sorted, <T as Value>::from_f64(0.25))?;
    let q3 = quantile_sorted(&sorted, <T as Value>::from_f64(0.75))?;
    Some((q1, q3))
}

/// Computes the median absolute deviation (MAD) of a dataset.
///
/// ```math
/// MAD = median(|x_i - median(x)|)
/// ```
///
/// Returns `None` for empty input. Multiply by 1.4826 to make it a
/// consistent estimate of the standard deviation under normality.
pub fn median_absolute_deviation<T: Value>(values: &[T]) -> Option<T> {
    let center = median(values)?;
    let deviations: Vec<T> = values.iter().map(|&v| v.abs_sub(center)).collect();
    median(&deviations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn test_mean() {
        let m = mean([1.0, 2.0, 3.0, 4.0].into_iter());
        assert_close!(m, 2.5, 1e-12);
    }

    #[test]
    fn test_mean_absolute_error() {
        let y = [1.0, 2.0, 3.0];
        let y_fit = [1.5, 1.5, 3.0];
        let mae = mean_absolute_error(y.into_iter(), y_fit.into_iter());
        assert_close!(mae, 1.0 / 3.0, 1e-12);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_close!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0, 1e-12);
        assert_close!(median(&[4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5, 1e-12);
    }

    #[test]
    fn test_quartiles() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let (q1, q3) = quartiles(&values).unwrap();
        assert_close!(q1, 3.0, 1e-12);
        assert_close!(q3, 7.0, 1e-12);
    }

    #[test]
    fn test_quantile_sorted_endpoints() {
        let values = [1.0, 2.0, 3.0];
        assert_close!(quantile_sorted(&values, 0.0).unwrap(), 1.0, 1e-12);
        assert_close!(quantile_sorted(&values, 1.0).unwrap(), 3.0, 1e-12);
    }

    #[test]
    fn test_mad() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_close!(median_absolute_deviation(&values).unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(median::<f64>(&[]).is_none());
        assert!(quartiles::<f64>(&[]).is_none());
        assert!(median_absolute_deviation::<f64>(&[]).is_none());
    }
}
