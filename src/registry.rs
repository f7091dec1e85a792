//! Fitted curves and the registry that accumulates them.
//!
//! Every successful solve produces a [`FittedCurve`]: a coefficient vector
//! bound to the basis it was fit against, evaluable at arbitrary x. The
//! [`FitRegistry`] maps a [`FitKey`] — a probability for quantile fits, or
//! the least-squares sentinel — to its curve. Re-fitting a key overwrites
//! the previous entry; looking up a missing key fails loudly with
//! [`Error::NoSuchFit`] so derived analytics never operate on a silent
//! default.

use std::sync::Arc;

use crate::{
    basis::Basis,
    error::{Error, Result},
    value::{SteppedValues, Value},
};

/// Identifies one fit in the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitKey<T: Value> {
    /// A regression quantile at this probability.
    Quantile(T),

    /// The least-squares trend fit.
    LeastSquares,
}

impl<T: Value> FitKey<T> {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Quantile(tau) => format!("quantile {tau:?}"),
            Self::LeastSquares => "the least-squares fit".to_string(),
        }
    }
}

/// A fitted curve: basis coefficients evaluable as `Σ cⱼ φⱼ(x)`.
///
/// Curves share their basis through an `Arc`, so cloning is cheap and a
/// curve stays evaluable even after the owning context replaces its basis.
#[derive(Debug, Clone)]
pub struct FittedCurve<T: Value> {
    basis: Arc<Basis<T>>,
    coefficients: Vec<T>,
}

impl<T: Value> FittedCurve<T> {
    pub(crate) fn new(basis: Arc<Basis<T>>, coefficients: Vec<T>) -> Self {
        debug_assert_eq!(basis.len(), coefficients.len());
        Self {
            basis,
            coefficients,
        }
    }

    /// Evaluates the curve at `x`.
    #[must_use]
    pub fn y(&self, x: T) -> T {
        let mut row = vec![T::zero(); self.coefficients.len()];
        self.basis.eval_into(x, &mut row);
        row.iter()
            .zip(self.coefficients.iter())
            .fold(T::zero(), |acc, (&phi, &c)| acc + phi * c)
    }

    /// The fitted coefficient vector.
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        &self.coefficients
    }

    /// The basis this curve was fit against.
    #[must_use]
    pub fn basis(&self) -> &Basis<T> {
        &self.basis
    }

    /// Evaluates the curve at each provided x, returning `(x, y)` pairs.
    pub fn solve(&self, xs: impl IntoIterator<Item = T>) -> Vec<(T, T)> {
        xs.into_iter().map(|x| (x, self.y(x))).collect()
    }

    /// Evaluates the curve over an inclusive range with a fixed step.
    ///
    /// Useful for handing plot-ready point sequences to a presentation
    /// layer.
    pub fn solve_range(&self, range: std::ops::RangeInclusive<T>, step: T) -> Vec<(T, T)> {
        self.solve(SteppedValues::new(range, step))
    }
}

/// Immutable mapping from [`FitKey`] to [`FittedCurve`].
///
/// The registry is the state threaded through the fitting pipeline:
/// entries accumulate as fits are recorded and are never destroyed until
/// the owning context is dropped.
#[derive(Debug, Clone, Default)]
pub struct FitRegistry<T: Value> {
    entries: Vec<(FitKey<T>, FittedCurve<T>)>,
}

impl<T: Value> FitRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records a fit, overwriting any previous entry under the same key.
    pub fn record(&mut self, key: FitKey<T>, curve: FittedCurve<T>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = curve;
        } else {
            self.entries.push((key, curve));
        }
    }

    /// Looks up the fit recorded under `key`.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when no fit was recorded for the key.
    pub fn lookup(&self, key: FitKey<T>) -> Result<&FittedCurve<T>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, curve)| curve)
            .ok_or_else(|| Error::NoSuchFit(key.describe()))
    }

    /// All recorded entries, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&FitKey<T>, &FittedCurve<T>)> {
        self.entries.iter().map(|(k, c)| (k, c))
    }

    /// The quantile fits only, sorted by ascending probability.
    #[must_use]
    pub fn quantile_family(&self) -> Vec<(T, &FittedCurve<T>)> {
        let mut family: Vec<(T, &FittedCurve<T>)> = self
            .entries
            .iter()
            .filter_map(|(key, curve)| match key {
                FitKey::Quantile(tau) => Some((*tau, curve)),
                FitKey::LeastSquares => None,
            })
            .collect();
        family.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        family
    }

    /// Number of recorded fits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no fit has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
