//! Error types for quantile-regression fitting and analytics
//!
//! This module defines the common errors encountered when building a basis,
//! running the solvers, or deriving analytics from fitted quantiles, along
//! with a convenient `Result` alias.

/// Errors that can occur during quantile-regression fitting or analysis.
///
/// This enum represents the common failure modes when constructing a basis,
/// solving for coefficients, or consuming the fitted quantile family.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cannot perform fitting because there is no data.
    #[error("No data available for fitting")]
    NoData,

    /// The dataset contains a NaN or infinite coordinate.
    ///
    /// The engine only accepts finite observations; clean the data before
    /// constructing the analysis.
    #[error("Observation {0} has a non-finite coordinate")]
    NonFinite(usize),

    /// The basis specification is malformed.
    ///
    /// Covers degenerate x-ranges, invalid knot vectors, and empty
    /// function lists.
    #[error("Invalid basis specification: {0}")]
    InvalidBasis(String),

    /// A probability was outside the open interval (0, 1).
    ///
    /// Regression quantiles are only defined for probabilities strictly
    /// between 0 and 1.
    #[error("Probability must lie strictly between 0 and 1: {0}")]
    InvalidProbability(String),

    /// The solver failed to produce a solution.
    ///
    /// For the quantile solver this means the linear program was detected
    /// as unbounded or numerically degenerate; for least squares it means
    /// a rank-deficient design matrix with the least-norm fallback
    /// disabled.
    #[error("Failed to solve: {0}")]
    Solver(String),

    /// The solver exceeded its iteration budget.
    ///
    /// Raise the `max_iterations` field of [`crate::SolverOptions`] for
    /// very large or highly degenerate problems.
    #[error("Solver exceeded its iteration budget of {0}")]
    SolverTimeout(usize),

    /// A derived-analytics operation was invoked before the fit it needs
    /// was recorded.
    #[error("No fit recorded for {0}; run the corresponding fitting step first")]
    NoSuchFit(String),

    /// A relative error was requested against a fitted value of zero.
    ///
    /// Use [`crate::analytics::ZeroPolicy::Skip`] to drop such points
    /// instead of failing.
    #[error("Division by zero: fitted value at observation {0} is zero")]
    DivisionByZero(usize),

    /// A numeric value could not be cast to the target type. This is usually a custom type much smaller than f64/f32
    #[error("Failed to cast value to target type")]
    CastFailed,
}

/// Result type for quantile-regression operations
pub type Result<T> = std::result::Result<T, Error>;
