//! Solvers for quantile and least-squares regression
//!
//! Two solvers share the basis layer:
//!
//! - The **quantile solver** ([`solver::quantile`](self)) minimizes the
//!   pinball loss for a probability τ by restating it as a linear program
//!   and running a dense simplex method over the resulting tableau.
//! - The **least-squares solver** minimizes the squared loss via the SVD
//!   of the design matrix, for trend extraction and comparison.
//!
//! Both are internal; they are driven through
//! [`crate::QuantileAnalysis`]. The public surface of this module is
//! [`SolverOptions`], which bounds the simplex iteration count and selects
//! the rank-deficiency policy for least squares.

pub(crate) mod least_squares;
pub(crate) mod quantile;
pub(crate) mod simplex;

/// Configuration for the fitting solvers.
///
/// # Example
/// ```rust
/// use quantreg::SolverOptions;
///
/// let options = SolverOptions {
///     max_iterations: 5_000,
///     ..SolverOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
    /// Iteration budget for the simplex method.
    ///
    /// A solve that exceeds this budget fails with
    /// [`crate::Error::SolverTimeout`] instead of hanging. The default of
    /// 100 000 is far beyond what well-conditioned problems need.
    pub max_iterations: usize,

    /// Whether least squares may fall back to the least-norm solution
    /// when the design matrix is rank-deficient.
    ///
    /// Enabled by default: the pseudo-inverse solution is returned and no
    /// error is raised. Disable to fail with [`crate::Error::Solver`]
    /// instead.
    pub least_norm_fallback: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            least_norm_fallback: true,
        }
    }
}
