//! Ordinary least squares over the shared basis layer.
//!
//! Solves `min ‖Φc − y‖²` through the SVD of the design matrix rather
//! than the normal equations, trading a constant factor for conditioning.
//! Rank-deficient designs either fail or return the least-norm
//! (pseudo-inverse) solution, controlled by
//! [`SolverOptions::least_norm_fallback`].

use nalgebra::SVD;

use crate::{
    basis::Basis,
    error::{Error, Result},
    solver::SolverOptions,
    value::Value,
};

/// Fits basis coefficients minimizing the squared loss.
///
/// # Errors
/// Returns [`Error::Solver`] when the design matrix is rank-deficient and
/// the least-norm fallback is disabled, or when the decomposition fails.
pub(crate) fn fit<T: Value>(
    data: &[(T, T)],
    basis: &Basis<T>,
    options: &SolverOptions,
) -> Result<Vec<T>> {
    if data.is_empty() {
        return Err(Error::NoData);
    }

    let d = basis.len();
    let (phi, b) = basis.design_matrix(data);

    let decomp = SVD::new_unordered(phi, true, true);

    // Effective-rank cutoff ~= machine_epsilon * max(size) * max_singular
    let max_size = data.len().max(d);
    let sigma_max = decomp.singular_values.max();
    let epsilon = T::epsilon() * T::try_cast(max_size)? * sigma_max;

    let rank = decomp
        .singular_values
        .iter()
        .filter(|&&sigma| sigma > epsilon)
        .count();
    if rank < d && !options.least_norm_fallback {
        return Err(Error::Solver(format!(
            "design matrix is rank-deficient (rank {rank} of {d}) and the least-norm fallback is disabled"
        )));
    }

    let coefficients = decomp
        .solve(&b, epsilon)
        .map_err(|e| Error::Solver(e.to_string()))?;
    Ok(coefficients.data.into())
}
