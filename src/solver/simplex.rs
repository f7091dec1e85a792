//! Dense tableau simplex method for the quantile-regression linear program.
//!
//! The caller provides a standard-form problem — minimize `cᵀx` subject to
//! `Ax = b`, `x ≥ 0`, with `b ≥ 0` — together with an initial basic
//! feasible solution whose basis columns are already unit columns of `A`.
//! The quantile formulation always has one (the residual slack of each
//! row), so no phase-1 is needed.
//!
//! Pricing is Dantzig's rule (most negative reduced cost). A run of
//! degenerate pivots switches pricing to Bland's rule, which cannot
//! cycle; ratio-test ties are broken toward the smaller basic index for
//! the same reason. An unbounded ray fails with [`Error::Solver`] and an
//! exhausted iteration budget with [`Error::SolverTimeout`].

use nalgebra::{DMatrix, DVector};

use crate::{
    error::{Error, Result},
    solver::SolverOptions,
    value::Value,
};

/// A standard-form linear program with a known starting basis.
pub(crate) struct StandardLp<T: Value> {
    /// Constraint matrix, one row per equality.
    pub a: DMatrix<T>,
    /// Right-hand side, non-negative.
    pub b: DVector<T>,
    /// Objective coefficients.
    pub c: DVector<T>,
    /// Column index of the basic variable for each row. Each listed
    /// column must be a unit column of `a` with its 1 in that row.
    pub basis: Vec<usize>,
}

/// Number of consecutive degenerate pivots tolerated before switching to
/// Bland's rule, relative to the row count.
const STALL_FACTOR: usize = 2;

pub(crate) fn solve<T: Value>(lp: StandardLp<T>, options: &SolverOptions) -> Result<DVector<T>> {
    let StandardLp {
        mut a,
        mut b,
        c,
        mut basis,
    } = lp;
    let m = a.nrows();
    let n = a.ncols();
    debug_assert_eq!(basis.len(), m);
    debug_assert_eq!(b.len(), m);
    debug_assert_eq!(c.len(), n);

    let tol = nalgebra::ComplexField::sqrt(T::epsilon());

    // Reduced costs priced against the initial basis
    let mut reduced = c.clone();
    for i in 0..m {
        let cb = c[basis[i]];
        if cb != T::zero() {
            for j in 0..n {
                reduced[j] -= cb * a[(i, j)];
            }
        }
    }

    let mut stalled = 0usize;
    let stall_limit = STALL_FACTOR * m.max(8);

    for _ in 0..options.max_iterations {
        let use_bland = stalled > stall_limit;
        let entering = if use_bland {
            (0..n).find(|&j| reduced[j] < -tol)
        } else {
            let mut best: Option<(usize, T)> = None;
            for j in 0..n {
                if reduced[j] < -tol {
                    match best {
                        Some((_, value)) if reduced[j] >= value => {}
                        _ => best = Some((j, reduced[j])),
                    }
                }
            }
            best.map(|(j, _)| j)
        };

        let Some(entering) = entering else {
            // Optimal: read the basic values off the right-hand side
            let mut x = DVector::zeros(n);
            for i in 0..m {
                x[basis[i]] = nalgebra::RealField::max(b[i], T::zero());
            }
            return Ok(x);
        };

        // Ratio test over positive pivot candidates
        let mut leaving: Option<(usize, T)> = None;
        for i in 0..m {
            let pivot = a[(i, entering)];
            if pivot > tol {
                let ratio = b[i] / pivot;
                leaving = match leaving {
                    None => Some((i, ratio)),
                    Some((row, best_ratio)) => {
                        if ratio < best_ratio
                            || (ratio == best_ratio && basis[i] < basis[row])
                        {
                            Some((i, ratio))
                        } else {
                            Some((row, best_ratio))
                        }
                    }
                };
            }
        }
        let Some((leaving, theta)) = leaving else {
            return Err(Error::Solver(
                "linear program is unbounded; the basis cannot represent the data".to_string(),
            ));
        };

        if theta <= tol {
            stalled += 1;
        } else {
            stalled = 0;
        }

        // Pivot: normalize the leaving row, then eliminate the entering
        // column from every other row and the reduced-cost row
        let pivot = a[(leaving, entering)];
        for j in 0..n {
            a[(leaving, j)] /= pivot;
        }
        b[leaving] /= pivot;

        for i in 0..m {
            if i == leaving {
                continue;
            }
            let factor = a[(i, entering)];
            if factor == T::zero() {
                continue;
            }
            for j in 0..n {
                let delta = factor * a[(leaving, j)];
                a[(i, j)] -= delta;
            }
            let delta = factor * b[leaving];
            b[i] -= delta;
            if b[i] < T::zero() && b[i] > -tol {
                b[i] = T::zero();
            }
        }

        let cost_factor = reduced[entering];
        for j in 0..n {
            reduced[j] -= cost_factor * a[(leaving, j)];
        }

        basis[leaving] = entering;
    }

    Err(Error::SolverTimeout(options.max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    /// max x + y s.t. x + 2y <= 4, 3x + y <= 6 — as a minimization with
    /// slack columns forming the starting basis.
    fn sample_lp() -> StandardLp<f64> {
        let a = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 1.0, 0.0, 3.0, 1.0, 0.0, 1.0]);
        let b = DVector::from_vec(vec![4.0, 6.0]);
        let c = DVector::from_vec(vec![-1.0, -1.0, 0.0, 0.0]);
        StandardLp {
            a,
            b,
            c,
            basis: vec![2, 3],
        }
    }

    #[test]
    fn test_solves_small_lp() {
        let x = solve(sample_lp(), &SolverOptions::default()).unwrap();
        // Optimum at the vertex x = 1.6, y = 1.2
        assert_close!(x[0], 1.6, 1e-9);
        assert_close!(x[1], 1.2, 1e-9);
        assert_close!(x[2], 0.0, 1e-9);
        assert_close!(x[3], 0.0, 1e-9);
    }

    #[test]
    fn test_detects_unbounded() {
        // min -x s.t. x - y = 0 — x can grow without bound
        let a = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        let b = DVector::from_vec(vec![0.0]);
        let c = DVector::from_vec(vec![-1.0, 0.0]);
        let lp = StandardLp {
            a,
            b,
            c,
            basis: vec![0],
        };
        let err = solve(lp, &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Solver(_)));
    }

    #[test]
    fn test_iteration_budget() {
        let options = SolverOptions {
            max_iterations: 0,
            ..SolverOptions::default()
        };
        let err = solve(sample_lp(), &options).unwrap_err();
        assert!(matches!(err, Error::SolverTimeout(0)));
    }

    #[test]
    fn test_already_optimal() {
        // min x + y from the all-slack vertex: nothing to do
        let a = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 1.0, 0.0, 3.0, 1.0, 0.0, 1.0]);
        let b = DVector::from_vec(vec![4.0, 6.0]);
        let c = DVector::from_vec(vec![1.0, 1.0, 0.0, 0.0]);
        let lp = StandardLp {
            a,
            b,
            c,
            basis: vec![2, 3],
        };
        let x = solve(lp, &SolverOptions::default()).unwrap();
        assert_close!(x[0], 0.0, 1e-12);
        assert_close!(x[1], 0.0, 1e-12);
    }
}
