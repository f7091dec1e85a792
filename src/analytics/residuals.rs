//! Per-point errors against a fitted curve, and the points that track it.

use crate::{
    analytics::zero_tolerance,
    error::{Error, Result},
    registry::FittedCurve,
    statistics,
    value::Value,
};

/// What to do when a relative error divides by a zero fitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroPolicy {
    /// Fail the whole operation with [`Error::DivisionByZero`].
    #[default]
    Fail,

    /// Silently drop the offending point from the result.
    Skip,
}

/// How residuals are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Raw residual `y - f(x)`.
    #[default]
    Absolute,

    /// Residual relative to the fitted value, `(y - f(x)) / f(x)`.
    ///
    /// Fitted values within the data-scale epsilon of zero follow the
    /// attached [`ZeroPolicy`].
    Relative(ZeroPolicy),
}

/// Computes the residual of one observation, honoring the zero policy.
///
/// `Ok(None)` means the point was skipped.
fn residual_at<T: Value>(
    curve: &FittedCurve<T>,
    x: T,
    y: T,
    index: usize,
    mode: ErrorMode,
    tolerance: T,
) -> Result<Option<T>> {
    let fitted = curve.y(x);
    let residual = y - fitted;
    match mode {
        ErrorMode::Absolute => Ok(Some(residual)),
        ErrorMode::Relative(policy) => {
            if Value::abs(fitted) <= tolerance {
                match policy {
                    ZeroPolicy::Fail => Err(Error::DivisionByZero(index)),
                    ZeroPolicy::Skip => Ok(None),
                }
            } else {
                Ok(Some(residual / fitted))
            }
        }
    }
}

/// Computes the per-point residuals of a dataset against a fitted curve.
///
/// With [`ErrorMode::Relative`] and [`ZeroPolicy::Skip`], points whose
/// fitted value is zero are dropped, so the result may be shorter than
/// the dataset.
///
/// # Errors
/// Returns [`Error::DivisionByZero`] under [`ZeroPolicy::Fail`] when a
/// fitted value is within the data-scale epsilon of zero.
pub fn residuals<T: Value>(
    data: &[(T, T)],
    curve: &FittedCurve<T>,
    mode: ErrorMode,
) -> Result<Vec<T>> {
    let tolerance = zero_tolerance(data);
    let mut result = Vec::with_capacity(data.len());
    for (i, &(x, y)) in data.iter().enumerate() {
        if let Some(residual) = residual_at(curve, x, y, i, mode, tolerance)? {
            result.push(residual);
        }
    }
    Ok(result)
}

/// Reduces the residuals of a dataset against a fitted curve to their mean.
///
/// # Errors
/// Propagates the same failures as [`residuals`].
pub fn mean_error<T: Value>(
    data: &[(T, T)],
    curve: &FittedCurve<T>,
    mode: ErrorMode,
) -> Result<T> {
    let residuals = residuals(data, curve, mode)?;
    if residuals.is_empty() {
        return Err(Error::NoData);
    }
    Ok(statistics::mean(residuals.into_iter()))
}

/// Selects the points whose distance to a fitted curve is within `threshold`.
///
/// Distance is the magnitude of the residual under `mode`; points that
/// track the curve this closely are returned with their original
/// coordinates.
///
/// # Errors
/// Propagates the same failures as [`residuals`].
pub fn path_points<T: Value>(
    data: &[(T, T)],
    curve: &FittedCurve<T>,
    threshold: T,
    mode: ErrorMode,
) -> Result<Vec<(T, T)>> {
    let tolerance = zero_tolerance(data);
    let mut result = Vec::new();
    for (i, &(x, y)) in data.iter().enumerate() {
        if let Some(residual) = residual_at(curve, x, y, i, mode, tolerance)? {
            if Value::abs(residual) <= threshold {
                result.push((x, y));
            }
        }
    }
    Ok(result)
}
