//! Simulation of synthetic series from a fitted quantile family.
//!
//! Each draw picks an x (uniformly over the data range, or from the
//! empirical x pool), a probability τ* uniform on (0, 1), and returns the
//! conditional quantile at that x evaluated at τ* — the same
//! interpolation machinery as [`super::ConditionalCdf`], run in reverse.
//! A family spanning probabilities near 0 and 1 gives the most faithful
//! tails.
//!
//! The result is a lazy, finite iterator. Draws are reproducible: an
//! explicit seed (or one captured at construction) lets
//! [`Simulation::restart`] replay the identical sequence.

use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::Open01;

use crate::{
    analytics::cdf::ConditionalCdf,
    error::{Error, Result},
    registry::FittedCurve,
    value::{CoordExt, Value},
};

/// How the predictor values of simulated points are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XSampling {
    /// Uniformly over the data's x-range.
    #[default]
    UniformRange,

    /// Uniformly from the observed x values.
    Empirical,
}

/// A lazy, finite, restartable sequence of simulated `(x, y)` pairs.
///
/// Created by [`crate::QuantileAnalysis::simulate`].
#[derive(Debug, Clone)]
pub struct Simulation<T: Value> {
    family: Vec<(T, FittedCurve<T>)>,
    xs: Vec<T>,
    x_min: T,
    x_max: T,
    sampling: XSampling,
    total: usize,
    remaining: usize,
    seed: u64,
    rng: SmallRng,
}

impl<T: Value> Simulation<T> {
    /// Builds a simulation of `count` points from a quantile family.
    ///
    /// `seed` fixes the RNG for reproducibility; if not provided, a seed
    /// is captured from the system RNG so the run can still be replayed
    /// with [`Self::restart`].
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when the family has fewer than two
    /// fits, and [`Error::NoData`] for an empty dataset.
    pub(crate) fn new(
        data: &[(T, T)],
        family: &[(T, &FittedCurve<T>)],
        count: usize,
        sampling: XSampling,
        seed: Option<u64>,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::NoData);
        }
        if family.len() < 2 {
            return Err(Error::NoSuchFit(
                "a quantile family of at least two fits".to_string(),
            ));
        }

        let range = data.x_range().ok_or(Error::NoData)?;
        let seed = seed.unwrap_or_else(|| rand::rng().random());

        Ok(Self {
            family: family
                .iter()
                .map(|&(tau, curve)| (tau, curve.clone()))
                .collect(),
            xs: data.x(),
            x_min: range.start,
            x_max: range.end,
            sampling,
            total: count,
            remaining: count,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Number of points this simulation will produce in total.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    /// Returns true if the simulation produces no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Points not yet drawn.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// The seed driving the draws.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds the simulation to replay the identical sequence.
    pub fn restart(&mut self) {
        self.remaining = self.total;
        self.rng = SmallRng::seed_from_u64(self.seed);
    }

    fn draw_x(&mut self) -> T {
        match self.sampling {
            XSampling::UniformRange => {
                let u = <T as Value>::from_f64(self.rng.random());
                self.x_min + (self.x_max - self.x_min) * u
            }
            XSampling::Empirical => {
                let i = self.rng.random_range(0..self.xs.len());
                self.xs[i]
            }
        }
    }

    /// Draws a probability strictly inside (0, 1).
    fn draw_tau(&mut self) -> T {
        let u: f64 = self.rng.sample(Open01);
        <T as Value>::from_f64(u)
    }
}

impl<T: Value> Iterator for Simulation<T> {
    type Item = (T, T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let x = self.draw_x();
        let tau = self.draw_tau();
        let points: Vec<(T, T)> = self
            .family
            .iter()
            .map(|(family_tau, curve)| (curve.y(x), *family_tau))
            .collect();
        // Family size was validated at construction, so this cannot fail
        let y = match ConditionalCdf::from_points(x, points) {
            Ok(cdf) => cdf.quantile_unchecked(tau),
            Err(_) => return None,
        };
        Some((x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Value> ExactSizeIterator for Simulation<T> {}
