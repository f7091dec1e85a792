//! Pinball-loss minimization as a linear program.
//!
//! For a probability τ the regression quantile minimizes
//! `Σᵢ ρ_τ(yᵢ − Σⱼ cⱼ φⱼ(xᵢ))` with `ρ_τ(u) = τ·u` for `u ≥ 0` and
//! `(τ − 1)·u` otherwise. Splitting the coefficients into `c = c⁺ − c⁻`
//! and each residual into `u = u⁺ − u⁻` (all parts non-negative) turns
//! this into the standard-form program
//!
//! ```text
//! minimize  τ·Σu⁺ + (1 − τ)·Σu⁻
//! subject to Φc⁺ − Φc⁻ + u⁺ − u⁻ = y
//! ```
//!
//! Rows with negative y are negated so that one residual slack per row
//! forms an immediate starting basis for the simplex engine.

use nalgebra::{DMatrix, DVector};

use crate::{
    basis::Basis,
    error::{Error, Result},
    solver::{simplex, SolverOptions},
    value::Value,
};

/// Checks that a probability lies strictly inside (0, 1).
pub(crate) fn validate_probability<T: Value>(tau: T) -> Result<()> {
    if !tau.finite() || tau <= T::zero() || tau >= T::one() {
        return Err(Error::InvalidProbability(format!("{tau:?}")));
    }
    Ok(())
}

/// Fits basis coefficients minimizing the pinball loss at probability `tau`.
///
/// # Errors
/// - [`Error::InvalidProbability`] for τ outside (0, 1).
/// - [`Error::Solver`] when the program is unbounded or degenerate.
/// - [`Error::SolverTimeout`] when the iteration budget is exhausted.
pub(crate) fn fit<T: Value>(
    data: &[(T, T)],
    basis: &Basis<T>,
    tau: T,
    options: &SolverOptions,
) -> Result<Vec<T>> {
    validate_probability(tau)?;
    if data.is_empty() {
        return Err(Error::NoData);
    }

    let n = data.len();
    let d = basis.len();
    let cols = 2 * d + 2 * n;

    // Column layout: [c⁺ | c⁻ | u⁺ | u⁻]
    let mut a = DMatrix::zeros(n, cols);
    let mut b = DVector::zeros(n);
    let mut c = DVector::zeros(cols);
    let mut starting_basis = Vec::with_capacity(n);

    let mut row = vec![T::zero(); d];
    for (i, &(x, y)) in data.iter().enumerate() {
        basis.eval_into(x, &mut row);
        let negate = y < T::zero();
        let sign = if negate { -T::one() } else { T::one() };

        for (j, &phi) in row.iter().enumerate() {
            a[(i, j)] = sign * phi;
            a[(i, d + j)] = -sign * phi;
        }
        a[(i, 2 * d + i)] = sign;
        a[(i, 2 * d + n + i)] = -sign;
        b[i] = sign * y;

        // The slack whose column is +1 after the sign flip
        starting_basis.push(if negate { 2 * d + n + i } else { 2 * d + i });
    }

    for i in 0..n {
        c[2 * d + i] = tau;
        c[2 * d + n + i] = T::one() - tau;
    }

    let solution = simplex::solve(
        simplex::StandardLp {
            a,
            b,
            c,
            basis: starting_basis,
        },
        options,
    )?;

    Ok((0..d).map(|j| solution[j] - solution[d + j]).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        assert_close,
        basis::{BasisFunction, BasisSpec},
    };

    fn constant_basis() -> Basis<f64> {
        let funcs: Vec<Arc<dyn BasisFunction<f64>>> = vec![Arc::new(|_x: f64| 1.0)];
        Basis::build(&BasisSpec::functions(funcs), (0.0, 1.0)).unwrap()
    }

    #[test]
    fn test_intercept_only_median() {
        // With a constant basis the τ-fit is the sample τ-quantile
        let data: Vec<(f64, f64)> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y))
            .collect();
        let coefficients = fit(&data, &constant_basis(), 0.5, &SolverOptions::default()).unwrap();
        assert_eq!(coefficients.len(), 1);
        assert_close!(coefficients[0], 3.0, 1e-9);
    }

    #[test]
    fn test_intercept_only_lower_quantile() {
        let data: Vec<(f64, f64)> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y))
            .collect();
        let coefficients = fit(&data, &constant_basis(), 0.25, &SolverOptions::default()).unwrap();
        assert_close!(coefficients[0], 2.0, 1e-9);
    }

    #[test]
    fn test_negative_responses() {
        let data: Vec<(f64, f64)> = [-5.0, -4.0, -3.0, -2.0, -1.0]
            .iter()
            .enumerate()
            .map(|(i, &y)| (i as f64, y))
            .collect();
        let coefficients = fit(&data, &constant_basis(), 0.5, &SolverOptions::default()).unwrap();
        assert_close!(coefficients[0], -3.0, 1e-9);
    }

    #[test]
    fn test_line_interpolates_two_points() {
        // Two points, two-dimensional basis: the median fit is exact
        let funcs: Vec<Arc<dyn BasisFunction<f64>>> =
            vec![Arc::new(|_x: f64| 1.0), Arc::new(|x: f64| x)];
        let basis = Basis::build(&BasisSpec::functions(funcs), (0.0, 1.0)).unwrap();
        let data = vec![(0.0, 1.0), (1.0, 3.0)];
        let coefficients = fit(&data, &basis, 0.5, &SolverOptions::default()).unwrap();
        assert_close!(coefficients[0], 1.0, 1e-9);
        assert_close!(coefficients[1], 2.0, 1e-9);
    }

    #[test]
    fn test_invalid_probability() {
        let data = vec![(0.0, 1.0)];
        for tau in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = fit(&data, &constant_basis(), tau, &SolverOptions::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidProbability(_)));
        }
    }

    #[test]
    fn test_empty_data() {
        let err = fit(&[], &constant_basis(), 0.5, &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NoData));
    }
}
