//! Function bases for quantile regression
//!
//! This module defines the basis layer shared by both solvers. A
//! [`BasisSpec`] describes the basis to build — either a clamped B-spline
//! over the data's x-range or an explicit, caller-supplied function list —
//! and [`Basis::build`] turns it into an evaluable [`Basis`].
//!
//! # Choosing a basis
//! - **For most users**, a cubic B-spline ([`BasisSpec::cubic`]) is
//!   recommended: it adapts to local structure and stays numerically
//!   stable when evaluated off-sample.
//! - Supply explicit functions ([`BasisSpec::functions`]) when the shape
//!   of the trend is known, e.g. `1`, `x`, `sin(2πx)`.
//!
//! # Rolling your own functions
//! Custom basis functions implement [`BasisFunction`]: a pure
//! scalar-in/scalar-out contract. Any `Fn(T) -> T + Send + Sync` closure
//! qualifies through the blanket implementation:
//!
//! ```rust
//! use std::sync::Arc;
//! use quantreg::basis::{Basis, BasisFunction, BasisSpec};
//!
//! let funcs: Vec<Arc<dyn BasisFunction<f64>>> = vec![
//!     Arc::new(|_x: f64| 1.0),
//!     Arc::new(|x: f64| x),
//! ];
//! let basis = Basis::build(&BasisSpec::functions(funcs), (0.0, 10.0)).unwrap();
//! assert_eq!(basis.len(), 2);
//! ```

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::{
    error::{Error, Result},
    value::Value,
};

pub(crate) mod bspline;
pub use bspline::BSplineBasis;

/// A single basis function: a pure scalar-to-scalar mapping.
///
/// Implementations must be side-effect free; the engine evaluates them at
/// arbitrary points, possibly concurrently across worker threads.
pub trait BasisFunction<T: Value>: Send + Sync {
    /// Evaluates the function at `x`.
    fn eval(&self, x: T) -> T;
}

impl<T: Value, F> BasisFunction<T> for F
where
    F: Fn(T) -> T + Send + Sync,
{
    fn eval(&self, x: T) -> T {
        self(x)
    }
}

/// Where the internal knots of a B-spline basis come from.
#[derive(Debug, Clone, PartialEq)]
pub enum KnotSpec<T: Value> {
    /// Place this many internal knots uniformly over the data's x-range.
    Count(usize),

    /// Use these internal knot positions, which must be finite,
    /// non-decreasing, and lie inside the data's x-range.
    Positions(Vec<T>),
}

/// Specification of the function basis to fit against.
///
/// The two variants correspond to the two modes of the basis builder:
/// a B-spline constructed from knots and a degree, or an explicit list of
/// caller-supplied functions (in which case no knot logic applies).
#[derive(Clone)]
pub enum BasisSpec<T: Value> {
    /// A clamped B-spline basis of the given polynomial degree.
    BSpline {
        /// Internal knot placement.
        knots: KnotSpec<T>,
        /// Polynomial degree of the spline pieces.
        degree: usize,
    },

    /// An explicit ordered list of basis functions.
    Functions(Vec<Arc<dyn BasisFunction<T>>>),
}

impl<T: Value> BasisSpec<T> {
    /// A B-spline basis with the given knots and degree.
    #[must_use]
    pub fn bspline(knots: KnotSpec<T>, degree: usize) -> Self {
        Self::BSpline { knots, degree }
    }

    /// A cubic B-spline basis with `knots` uniform internal knots.
    ///
    /// This is the default basis of the engine (degree 3).
    #[must_use]
    pub fn cubic(knots: usize) -> Self {
        Self::BSpline {
            knots: KnotSpec::Count(knots),
            degree: 3,
        }
    }

    /// An explicit function basis.
    #[must_use]
    pub fn functions(funcs: Vec<Arc<dyn BasisFunction<T>>>) -> Self {
        Self::Functions(funcs)
    }
}

impl<T: Value> std::fmt::Debug for BasisSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BSpline { knots, degree } => f
                .debug_struct("BSpline")
                .field("knots", knots)
                .field("degree", degree)
                .finish(),
            Self::Functions(funcs) => {
                f.debug_tuple("Functions").field(&funcs.len()).finish()
            }
        }
    }
}

/// A built, evaluable function basis.
///
/// Construct with [`Basis::build`]; both solvers consume the basis through
/// [`Basis::design_matrix`], and fitted curves evaluate it at arbitrary
/// points through [`Basis::eval_into`].
#[derive(Clone)]
pub struct Basis<T: Value> {
    kind: BasisKind<T>,
}

#[derive(Clone)]
enum BasisKind<T: Value> {
    BSpline(BSplineBasis<T>),
    Functions(Vec<Arc<dyn BasisFunction<T>>>),
}

impl<T: Value> Basis<T> {
    /// Builds a basis from its specification and the data's x-range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBasis`] for degenerate ranges, malformed
    /// knot vectors, or an empty function list.
    pub fn build(spec: &BasisSpec<T>, x_range: (T, T)) -> Result<Self> {
        let kind = match spec {
            BasisSpec::BSpline { knots, degree } => {
                let bspline = match knots {
                    KnotSpec::Count(count) => BSplineBasis::uniform(x_range, *count, *degree)?,
                    KnotSpec::Positions(positions) => {
                        BSplineBasis::from_internal_knots(x_range, positions, *degree)?
                    }
                };
                BasisKind::BSpline(bspline)
            }
            BasisSpec::Functions(funcs) => {
                if funcs.is_empty() {
                    return Err(Error::InvalidBasis(
                        "explicit basis must contain at least one function".to_string(),
                    ));
                }
                BasisKind::Functions(funcs.clone())
            }
        };
        Ok(Self { kind })
    }

    /// Number of basis functions (the dimension `d` of the fit).
    pub fn len(&self) -> usize {
        match &self.kind {
            BasisKind::BSpline(bspline) => bspline.len(),
            BasisKind::Functions(funcs) => funcs.len(),
        }
    }

    /// Returns true if the basis has no functions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates the `j`-th basis function at `x`.
    ///
    /// # Panics
    /// Panics if `j` is out of bounds.
    pub fn eval_function(&self, j: usize, x: T) -> T {
        match &self.kind {
            BasisKind::BSpline(bspline) => bspline.eval_function(j, x),
            BasisKind::Functions(funcs) => funcs[j].eval(x),
        }
    }

    /// Writes the values of every basis function at `x` into `row`.
    ///
    /// `row` must have length [`Self::len`].
    pub fn eval_into(&self, x: T, row: &mut [T]) {
        match &self.kind {
            BasisKind::BSpline(bspline) => bspline.eval_into(x, row),
            BasisKind::Functions(funcs) => {
                for (value, func) in row.iter_mut().zip(funcs.iter()) {
                    *value = func.eval(x);
                }
            }
        }
    }

    /// Turns a dataset into a design matrix and y-values vector.
    ///
    /// The matrix has one row per observation and one column per basis
    /// function.
    pub(crate) fn design_matrix(&self, data: &[(T, T)]) -> (DMatrix<T>, DVector<T>) {
        let d = self.len();
        let mut phi = DMatrix::zeros(data.len(), d);
        let b = DVector::from_iterator(data.len(), data.iter().map(|&(_, y)| y));

        let mut buffer = vec![T::zero(); d];
        for (i, &(x, _)) in data.iter().enumerate() {
            self.eval_into(x, &mut buffer);
            for (j, &value) in buffer.iter().enumerate() {
                phi[(i, j)] = value;
            }
        }

        (phi, b)
    }
}

impl<T: Value> std::fmt::Debug for Basis<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            BasisKind::BSpline(bspline) => f.debug_tuple("BSpline").field(bspline).finish(),
            BasisKind::Functions(funcs) => {
                f.debug_tuple("Functions").field(&funcs.len()).finish()
            }
        }
    }
}
