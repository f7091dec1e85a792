//! Conditional CDF reconstruction from a fitted quantile family.
//!
//! Evaluating every fit of a τ-ascending family at a fixed x₀ yields the
//! pairs `(f_τ(x₀), τ)` — a sample of the inverse CDF of y at x₀. Linear
//! interpolation between them (and linear end-segment extrapolation,
//! clamped to `[0, 1]`) answers `P(Y ≤ y | X = x₀)` for arbitrary y, and
//! the inverse direction evaluates the conditional quantile function.
//!
//! Independently solved per-τ fits can cross at a given x₀. Crossing is a
//! known artifact of quantile regression, not an error: the evaluated
//! values are repaired by sorting them and re-pairing with the ascending
//! τ (isotonic repair), and the repair is observable through
//! [`ConditionalCdf::crossing_repaired`].

use crate::{
    error::{Error, Result},
    registry::FittedCurve,
    solver::quantile::validate_probability,
    value::Value,
};

/// A monotone piecewise-linear approximation of the CDF of y at a fixed x.
///
/// Build one with [`crate::QuantileAnalysis::conditional_cdf`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalCdf<T: Value> {
    x0: T,
    /// Fitted quantile values, ascending after any repair.
    values: Vec<T>,
    /// The probabilities the family was fit at, ascending.
    probabilities: Vec<T>,
    crossing_repaired: bool,
}

impl<T: Value> ConditionalCdf<T> {
    /// Reconstructs the CDF at `x0` from a τ-ascending quantile family.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when fewer than two quantile fits are
    /// available; interpolation needs at least one segment.
    pub fn from_family(x0: T, family: &[(T, &FittedCurve<T>)]) -> Result<Self> {
        let points: Vec<(T, T)> = family
            .iter()
            .map(|&(tau, curve)| (curve.y(x0), tau))
            .collect();
        Self::from_points(x0, points)
    }

    /// Builds the CDF from already-evaluated `(value, τ)` points.
    pub(crate) fn from_points(x0: T, points: Vec<(T, T)>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::NoSuchFit(
                "a quantile family of at least two fits".to_string(),
            ));
        }

        let probabilities: Vec<T> = points.iter().map(|&(_, tau)| tau).collect();
        let mut values: Vec<T> = points.iter().map(|&(value, _)| value).collect();
        debug_assert!(probabilities.windows(2).all(|w| w[0] < w[1]));

        // Quantile crossing: the fitted values are not monotone in τ.
        // Repair by sorting, pairing the sorted values with the ascending
        // probabilities; flag the repair when it exceeds noise level
        let scale = values
            .iter()
            .fold(T::one(), |acc, &v| nalgebra::RealField::max(acc, Value::abs(v)));
        let tolerance = nalgebra::ComplexField::sqrt(T::epsilon()) * scale;
        let crossing_repaired = values.windows(2).any(|w| w[1] < w[0] - tolerance);
        if values.windows(2).any(|w| w[1] < w[0]) {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        }

        Ok(Self {
            x0,
            values,
            probabilities,
            crossing_repaired,
        })
    }

    /// The x the family was evaluated at.
    #[must_use]
    pub fn x0(&self) -> T {
        self.x0
    }

    /// The fitted quantile values backing the interpolation, ascending.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The probabilities the family was fit at, ascending.
    #[must_use]
    pub fn probabilities(&self) -> &[T] {
        &self.probabilities
    }

    /// Whether quantile crossing was detected and repaired at this x.
    #[must_use]
    pub fn crossing_repaired(&self) -> bool {
        self.crossing_repaired
    }

    /// Evaluates `P(Y ≤ y | X = x₀)`.
    ///
    /// Piecewise-linear between the fitted quantile values; beyond them,
    /// the end segments extrapolate linearly and the result is clamped to
    /// `[0, 1]`.
    #[must_use]
    pub fn evaluate(&self, y: T) -> T {
        let values = &self.values;
        let probs = &self.probabilities;
        let last = values.len() - 1;

        let p = if y <= values[0] {
            match values.iter().position(|&v| v > values[0]) {
                Some(next) => {
                    let slope = (probs[next] - probs[0]) / (values[next] - values[0]);
                    probs[0] + (y - values[0]) * slope
                }
                // All fitted values equal: a point mass
                None => {
                    if y < values[0] {
                        T::zero()
                    } else {
                        probs[last]
                    }
                }
            }
        } else if y >= values[last] {
            match values.iter().rposition(|&v| v < values[last]) {
                Some(prev) => {
                    let slope = (probs[last] - probs[prev]) / (values[last] - values[prev]);
                    probs[last] + (y - values[last]) * slope
                }
                None => probs[last],
            }
        } else {
            // Last index with value <= y; ties collapse to the upper
            // probability of the vertical jump
            let j = values.iter().rposition(|&v| v <= y).unwrap_or(0);
            let slope = (probs[j + 1] - probs[j]) / (values[j + 1] - values[j]);
            probs[j] + (y - values[j]) * slope
        };

        nalgebra::RealField::clamp(p, T::zero(), T::one())
    }

    /// Evaluates the conditional quantile function at probability `p`.
    ///
    /// The inverse of [`Self::evaluate`], with the same end-segment
    /// extrapolation for probabilities outside the fitted range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidProbability`] for `p` outside (0, 1).
    pub fn quantile(&self, p: T) -> Result<T> {
        validate_probability(p)?;
        Ok(self.quantile_unchecked(p))
    }

    pub(crate) fn quantile_unchecked(&self, p: T) -> T {
        let values = &self.values;
        let probs = &self.probabilities;
        let last = probs.len() - 1;

        if p <= probs[0] {
            let slope = (values[1] - values[0]) / (probs[1] - probs[0]);
            return values[0] + (p - probs[0]) * slope;
        }
        if p >= probs[last] {
            let slope = (values[last] - values[last - 1]) / (probs[last] - probs[last - 1]);
            return values[last] + (p - probs[last]) * slope;
        }

        let j = probs.iter().rposition(|&q| q <= p).unwrap_or(0);
        let weight = (p - probs[j]) / (probs[j + 1] - probs[j]);
        values[j] + weight * (values[j + 1] - values[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    fn sample_cdf() -> ConditionalCdf<f64> {
        ConditionalCdf::from_points(
            0.0,
            vec![(1.0, 0.1), (2.0, 0.25), (3.0, 0.5), (4.0, 0.75), (5.0, 0.9)],
        )
        .unwrap()
    }

    #[test]
    fn test_endpoints_return_fitted_probabilities() {
        let cdf = sample_cdf();
        assert_close!(cdf.evaluate(1.0), 0.1, 1e-12);
        assert_close!(cdf.evaluate(5.0), 0.9, 1e-12);
    }

    #[test]
    fn test_interpolation_between_fits() {
        let cdf = sample_cdf();
        assert_close!(cdf.evaluate(2.5), 0.375, 1e-12);
        assert_close!(cdf.evaluate(3.0), 0.5, 1e-12);
    }

    #[test]
    fn test_non_decreasing_in_y() {
        let cdf = sample_cdf();
        let mut previous = 0.0;
        for i in 0..=60 {
            let y = -1.0 + 8.0 * f64::from(i) / 60.0;
            let p = cdf.evaluate(y);
            assert!(p >= previous);
            assert!((0.0..=1.0).contains(&p));
            previous = p;
        }
    }

    #[test]
    fn test_extrapolation_clamps() {
        let cdf = sample_cdf();
        assert_close!(cdf.evaluate(-100.0), 0.0, 1e-12);
        assert_close!(cdf.evaluate(100.0), 1.0, 1e-12);
    }

    #[test]
    fn test_quantile_round_trip() {
        let cdf = sample_cdf();
        for &p in &[0.1, 0.3, 0.5, 0.62, 0.9] {
            let y = cdf.quantile(p).unwrap();
            assert_close!(cdf.evaluate(y), p, 1e-9);
        }
    }

    #[test]
    fn test_quantile_validates_probability() {
        let cdf = sample_cdf();
        assert!(matches!(
            cdf.quantile(0.0).unwrap_err(),
            Error::InvalidProbability(_)
        ));
        assert!(matches!(
            cdf.quantile(1.2).unwrap_err(),
            Error::InvalidProbability(_)
        ));
    }

    #[test]
    fn test_crossing_is_repaired_and_flagged() {
        let cdf = ConditionalCdf::from_points(
            0.0,
            vec![(1.0, 0.1), (3.0, 0.5), (2.0, 0.9)],
        )
        .unwrap();
        assert!(cdf.crossing_repaired());
        assert_eq!(cdf.values(), &[1.0, 2.0, 3.0]);
        // Monotone after repair
        assert!(cdf.evaluate(2.5) >= cdf.evaluate(1.5));
    }

    #[test]
    fn test_monotone_family_is_not_flagged() {
        let cdf = sample_cdf();
        assert!(!cdf.crossing_repaired());
    }

    #[test]
    fn test_single_fit_is_rejected() {
        let err = ConditionalCdf::from_points(0.0, vec![(1.0, 0.5)]).unwrap_err();
        assert!(matches!(err, Error::NoSuchFit(_)));
    }
}
