//! Clamped B-spline basis over a data range.
//!
//! The knot vector repeats each boundary `degree + 1` times so the basis is
//! clamped: the first function takes the value 1 at the range minimum and
//! the last takes the value 1 at the maximum. Internal knots either come
//! from a uniform partition of the range or are supplied explicitly.
//!
//! Evaluation uses the span-based Cox–de Boor recurrence (Algorithm A2.2
//! of *The NURBS Book*), which only touches the `degree + 1` functions
//! that are non-zero at a given point. Points outside the knot domain are
//! evaluated against the boundary span, so fitted curves extrapolate
//! polynomially instead of collapsing to zero off-sample.

use crate::{
    error::{Error, Result},
    value::Value,
};

/// A clamped B-spline basis with a fixed knot vector and degree.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis<T: Value> {
    knots: Vec<T>,
    degree: usize,
    num_basis: usize,
}

impl<T: Value> BSplineBasis<T> {
    /// Builds the basis from `internal` knots placed uniformly over `(min, max)`.
    ///
    /// The resulting dimension is `internal + degree + 1`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBasis`] when the range is degenerate or
    /// reversed.
    pub fn uniform(range: (T, T), internal: usize, degree: usize) -> Result<Self> {
        let (min, max) = range;
        if !min.finite() || !max.finite() || min > max {
            return Err(Error::InvalidBasis(format!(
                "invalid x-range {min:?}..{max:?}"
            )));
        }
        if min == max {
            return Err(Error::InvalidBasis(
                "x-range has zero width; cannot place knots".to_string(),
            ));
        }

        let h = (max - min) / T::from_positive_int(internal + 1);
        let positions: Vec<T> = (1..=internal)
            .map(|i| min + T::from_positive_int(i) * h)
            .collect();
        Self::from_internal_knots(range, &positions, degree)
    }

    /// Builds the basis from explicit internal knot positions.
    ///
    /// Positions must be finite, non-decreasing, and lie inside the data
    /// range; the clamped boundary knots are derived from the range itself.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBasis`] when the range is degenerate or a
    /// position violates the constraints above.
    pub fn from_internal_knots(range: (T, T), positions: &[T], degree: usize) -> Result<Self> {
        let (min, max) = range;
        if !min.finite() || !max.finite() || min >= max {
            return Err(Error::InvalidBasis(format!(
                "invalid x-range {min:?}..{max:?}"
            )));
        }

        for pair in positions.windows(2) {
            if pair[0] > pair[1] {
                return Err(Error::InvalidBasis(format!(
                    "internal knots must be non-decreasing, found {:?} after {:?}",
                    pair[1], pair[0]
                )));
            }
        }
        for &p in positions {
            if !p.finite() || p < min || p > max {
                return Err(Error::InvalidBasis(format!(
                    "internal knot {p:?} lies outside the x-range {min:?}..{max:?}"
                )));
            }
        }

        let mut knots = Vec::with_capacity(positions.len() + 2 * (degree + 1));
        for _ in 0..=degree {
            knots.push(min);
        }
        knots.extend_from_slice(positions);
        for _ in 0..=degree {
            knots.push(max);
        }

        let num_basis = knots.len() - degree - 1;
        Ok(Self {
            knots,
            degree,
            num_basis,
        })
    }

    /// Number of basis functions.
    pub fn len(&self) -> usize {
        self.num_basis
    }

    /// Returns true if the basis is empty.
    pub fn is_empty(&self) -> bool {
        self.num_basis == 0
    }

    /// The spline degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The full clamped knot vector.
    pub fn knots(&self) -> &[T] {
        &self.knots
    }

    /// Finds the knot span containing `x`, clamped to the boundary spans.
    fn find_span(&self, x: T) -> usize {
        let p = self.degree;
        let high = self.num_basis;
        if x >= self.knots[high] {
            return high - 1;
        }
        if x <= self.knots[p] {
            return p;
        }

        let mut lo = p;
        let mut hi = high;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if x < self.knots[mid] {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        lo
    }

    /// Evaluates the `degree + 1` functions that are non-zero on `span`.
    fn eval_span(&self, span: usize, x: T) -> Vec<T> {
        let p = self.degree;
        let mut values = vec![T::zero(); p + 1];
        let mut left = vec![T::zero(); p + 1];
        let mut right = vec![T::zero(); p + 1];

        values[0] = T::one();
        for j in 1..=p {
            left[j] = x - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - x;
            let mut saved = T::zero();
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom == T::zero() {
                    T::zero()
                } else {
                    values[r] / denom
                };
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }
        values
    }

    /// Writes the values of every basis function at `x` into `row`.
    ///
    /// `row` must have length [`Self::len`]; entries outside the active
    /// span are zeroed.
    pub fn eval_into(&self, x: T, row: &mut [T]) {
        debug_assert_eq!(row.len(), self.num_basis);
        for value in row.iter_mut() {
            *value = T::zero();
        }

        let span = self.find_span(x);
        let values = self.eval_span(span, x);
        for (offset, value) in values.into_iter().enumerate() {
            let j = span - self.degree + offset;
            if j < self.num_basis {
                row[j] = value;
            }
        }
    }

    /// Evaluates the `j`-th basis function at `x`.
    pub fn eval_function(&self, j: usize, x: T) -> T {
        let span = self.find_span(x);
        if j + self.degree < span || j > span {
            return T::zero();
        }
        let values = self.eval_span(span, x);
        values[j + self.degree - span]
    }
}
