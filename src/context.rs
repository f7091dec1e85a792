//! The analysis context threaded through the fitting pipeline.
//!
//! [`QuantileAnalysis`] is an explicit accumulator: it owns (or borrows)
//! the dataset, the currently built basis, the registry of fitted curves,
//! and the solver configuration. Fitting operations consume the context
//! and return an updated one, so chains read top-to-bottom with no hidden
//! pipeline state; analytics operations borrow the context and return
//! plain values resolved against the registry.

use std::{borrow::Cow, sync::Arc};

use crate::{
    analytics::{
        self, ConditionalCdf, ErrorMode, OutlierIdentifier, Simulation, XSampling,
    },
    basis::{Basis, BasisSpec},
    error::{Error, Result},
    registry::{FitKey, FitRegistry, FittedCurve},
    solver::{least_squares, quantile, SolverOptions},
    value::{CoordExt, Value},
};

/// Per-probability outcome of a multi-fit call.
///
/// Unrelated τ solves are independent, so a failed probability never
/// discards its siblings: successful fits are recorded and the failure is
/// reported in its slot.
pub type FitReport<T> = Vec<(T, Result<()>)>;

/// A quantile-regression analysis over one dataset.
///
/// # Example
/// ```rust
/// use quantreg::{BasisSpec, FitKey, QuantileAnalysis};
///
/// let data: Vec<(f64, f64)> = (0..60)
///     .map(|i| {
///         let x = f64::from(i) / 10.0;
///         (x, x + f64::from(i % 5) * 0.1)
///     })
///     .collect();
///
/// let analysis = QuantileAnalysis::new(&data)?
///     .with_basis(BasisSpec::cubic(4))?
///     .fit_quantile(0.5)?;
///
/// let median = analysis.fitted(FitKey::Quantile(0.5))?;
/// assert!(median.y(3.0).is_finite());
/// # Ok::<(), quantreg::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct QuantileAnalysis<'data, T: Value = f64> {
    data: Cow<'data, [(T, T)]>,
    x_range: (T, T),
    basis: Option<Arc<Basis<T>>>,
    registry: FitRegistry<T>,
    solver: SolverOptions,
}

impl<'data, T: Value> QuantileAnalysis<'data, T> {
    /// Creates an analysis over a borrowed dataset.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] for an empty dataset and
    /// [`Error::NonFinite`] when any coordinate is NaN or infinite.
    pub fn new(data: &'data [(T, T)]) -> Result<Self> {
        Self::from_cow(Cow::Borrowed(data))
    }

    /// Creates an analysis that owns its dataset.
    ///
    /// # Errors
    /// Same failure modes as [`Self::new`].
    pub fn from_owned(data: Vec<(T, T)>) -> Result<QuantileAnalysis<'static, T>> {
        QuantileAnalysis::from_cow(Cow::Owned(data))
    }

    fn from_cow(data: Cow<'data, [(T, T)]>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::NoData);
        }
        for (i, &(x, y)) in data.iter().enumerate() {
            if !x.finite() || !y.finite() {
                return Err(Error::NonFinite(i));
            }
        }
        let range = data.as_ref().x_range().ok_or(Error::NoData)?;

        Ok(Self {
            x_range: (range.start, range.end),
            data,
            basis: None,
            registry: FitRegistry::new(),
            solver: SolverOptions::default(),
        })
    }

    /// Replaces the dataset wholesale.
    ///
    /// The basis and previously recorded fits are kept; rebuild the basis
    /// with [`Self::with_basis`] if the new data covers a different
    /// x-range.
    ///
    /// # Errors
    /// Same failure modes as [`Self::new`].
    pub fn with_data(self, data: Vec<(T, T)>) -> Result<QuantileAnalysis<'static, T>> {
        let mut replaced = QuantileAnalysis::from_cow(Cow::Owned(data))?;
        replaced.basis = self.basis;
        replaced.registry = self.registry;
        replaced.solver = self.solver;
        Ok(replaced)
    }

    /// Builds a basis over the dataset's x-range from a specification.
    ///
    /// Previously recorded fits keep the basis they were fit against.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBasis`] for malformed specifications.
    pub fn with_basis(mut self, spec: BasisSpec<T>) -> Result<Self> {
        let basis = Basis::build(&spec, self.x_range)?;
        self.basis = Some(Arc::new(basis));
        Ok(self)
    }

    /// Overrides the solver configuration.
    #[must_use]
    pub fn with_solver_options(mut self, options: SolverOptions) -> Self {
        self.solver = options;
        self
    }

    /// The dataset under analysis.
    #[must_use]
    pub fn data(&self) -> &[(T, T)] {
        &self.data
    }

    /// The currently configured basis, if one has been built.
    #[must_use]
    pub fn basis(&self) -> Option<&Basis<T>> {
        self.basis.as_deref()
    }

    /// The registry of recorded fits.
    #[must_use]
    pub fn registry(&self) -> &FitRegistry<T> {
        &self.registry
    }

    fn require_basis(&self) -> Result<&Arc<Basis<T>>> {
        self.basis.as_ref().ok_or_else(|| {
            Error::InvalidBasis("no basis configured; call with_basis first".to_string())
        })
    }

    /// Fits the regression quantile at probability `tau` and records it.
    ///
    /// Re-fitting a probability overwrites the previous entry.
    ///
    /// # Errors
    /// Returns [`Error::InvalidProbability`] for τ outside (0, 1),
    /// [`Error::InvalidBasis`] when no basis is configured, and the
    /// solver failures of [`crate::SolverOptions`].
    pub fn fit_quantile(mut self, tau: T) -> Result<Self> {
        let basis = self.require_basis()?.clone();
        let coefficients = quantile::fit(&self.data, &basis, tau, &self.solver)?;
        self.registry
            .record(FitKey::Quantile(tau), FittedCurve::new(basis, coefficients));
        Ok(self)
    }

    /// Fits one regression quantile per probability, in parallel when the
    /// `parallel` feature is enabled.
    ///
    /// Each τ solve is independent: successes are recorded even when
    /// sibling probabilities fail, and the report carries one result per
    /// requested τ, in request order. Duplicate probabilities resolve
    /// last-writer-wins.
    pub fn fit_quantiles(mut self, probs: &[T]) -> (Self, FitReport<T>) {
        let basis = match self.require_basis() {
            Ok(basis) => basis.clone(),
            Err(_) => {
                let report = probs
                    .iter()
                    .map(|&tau| {
                        (
                            tau,
                            Err(Error::InvalidBasis(
                                "no basis configured; call with_basis first".to_string(),
                            )),
                        )
                    })
                    .collect();
                return (self, report);
            }
        };

        let solve = |tau: T| quantile::fit(&self.data, &basis, tau, &self.solver);

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(T, Result<Vec<T>>)> = {
            use rayon::prelude::*;
            probs.par_iter().map(|&tau| (tau, solve(tau))).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(T, Result<Vec<T>>)> =
            probs.iter().map(|&tau| (tau, solve(tau))).collect();

        let mut report = Vec::with_capacity(outcomes.len());
        for (tau, outcome) in outcomes {
            match outcome {
                Ok(coefficients) => {
                    self.registry.record(
                        FitKey::Quantile(tau),
                        FittedCurve::new(basis.clone(), coefficients),
                    );
                    report.push((tau, Ok(())));
                }
                Err(error) => report.push((tau, Err(error))),
            }
        }
        (self, report)
    }

    /// Fits the least-squares trend and records it under the sentinel key.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBasis`] when no basis is configured, and
    /// [`Error::Solver`] for rank-deficient designs with the least-norm
    /// fallback disabled.
    pub fn fit_least_squares(mut self) -> Result<Self> {
        let basis = self.require_basis()?.clone();
        let coefficients = least_squares::fit(&self.data, &basis, &self.solver)?;
        self.registry
            .record(FitKey::LeastSquares, FittedCurve::new(basis, coefficients));
        Ok(self)
    }

    /// Looks up a recorded fit.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when the key was never fit.
    pub fn fitted(&self, key: FitKey<T>) -> Result<&FittedCurve<T>> {
        self.registry.lookup(key)
    }

    /// Per-point residuals against the fit recorded at `tau`.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] before fitting, plus the failure
    /// modes of [`analytics::residuals`].
    pub fn residuals(&self, tau: T, mode: ErrorMode) -> Result<Vec<T>> {
        let curve = self.registry.lookup(FitKey::Quantile(tau))?;
        analytics::residuals(&self.data, curve, mode)
    }

    /// Mean residual against the fit recorded at `tau`.
    ///
    /// # Errors
    /// Same failure modes as [`Self::residuals`].
    pub fn mean_error(&self, tau: T, mode: ErrorMode) -> Result<T> {
        let curve = self.registry.lookup(FitKey::Quantile(tau))?;
        analytics::mean_error(&self.data, curve, mode)
    }

    /// Observations flagged by a residual-fence rule against the fit at
    /// `tau`.
    ///
    /// # Errors
    /// Same failure modes as [`Self::residuals`].
    pub fn residual_outliers(
        &self,
        tau: T,
        identifier: &OutlierIdentifier<T>,
        mode: ErrorMode,
    ) -> Result<Vec<(T, T)>> {
        let curve = self.registry.lookup(FitKey::Quantile(tau))?;
        analytics::residual_outliers(&self.data, curve, identifier, mode)
    }

    /// Observations outside the band between the fits at `tau_low` and
    /// `tau_high`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidProbability`] unless `tau_low < tau_high`,
    /// and [`Error::NoSuchFit`] when either fit is missing.
    pub fn band_outliers(&self, tau_low: T, tau_high: T) -> Result<Vec<(T, T)>> {
        if tau_low >= tau_high {
            return Err(Error::InvalidProbability(format!(
                "band requires tau_low < tau_high, got {tau_low:?} and {tau_high:?}"
            )));
        }
        let low = self.registry.lookup(FitKey::Quantile(tau_low))?;
        let high = self.registry.lookup(FitKey::Quantile(tau_high))?;
        Ok(analytics::band_outliers(&self.data, low, high))
    }

    /// Observations within `threshold` of the fit recorded at `tau`.
    ///
    /// # Errors
    /// Same failure modes as [`Self::residuals`].
    pub fn path_points(&self, tau: T, threshold: T, mode: ErrorMode) -> Result<Vec<(T, T)>> {
        let curve = self.registry.lookup(FitKey::Quantile(tau))?;
        analytics::path_points(&self.data, curve, threshold, mode)
    }

    /// Reconstructs the conditional CDF of y at `x0` from the recorded
    /// quantile family.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when fewer than two quantile fits are
    /// recorded.
    pub fn conditional_cdf(&self, x0: T) -> Result<ConditionalCdf<T>> {
        let family = self.registry.quantile_family();
        ConditionalCdf::from_family(x0, &family)
    }

    /// Simulates `count` synthetic points consistent with the recorded
    /// quantile family.
    ///
    /// # Errors
    /// Returns [`Error::NoSuchFit`] when fewer than two quantile fits are
    /// recorded.
    pub fn simulate(
        &self,
        count: usize,
        sampling: XSampling,
        seed: Option<u64>,
    ) -> Result<Simulation<T>> {
        let family = self.registry.quantile_family();
        Simulation::new(&self.data, &family, count, sampling, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_close, statistics};
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    /// 300 points of sin(2πx) plus bounded noise over [0, 2].
    fn sine_data(noise: f64) -> Vec<(f64, f64)> {
        let mut rng = SmallRng::seed_from_u64(7);
        (0..300)
            .map(|i| {
                let x = 2.0 * f64::from(i) / 299.0;
                let eps: f64 = rng.random::<f64>() * 2.0 - 1.0;
                (x, (std::f64::consts::TAU * x).sin() + noise * eps)
            })
            .collect()
    }

    fn fraction_below(data: &[(f64, f64)], curve: &FittedCurve<f64>) -> f64 {
        let below = data.iter().filter(|&&(x, y)| y <= curve.y(x)).count();
        below as f64 / data.len() as f64
    }

    #[test]
    fn test_validates_data() {
        assert!(matches!(
            QuantileAnalysis::<f64>::new(&[]).unwrap_err(),
            Error::NoData
        ));
        let bad = vec![(0.0, 1.0), (1.0, f64::NAN)];
        assert!(matches!(
            QuantileAnalysis::new(&bad).unwrap_err(),
            Error::NonFinite(1)
        ));
    }

    #[test]
    fn test_fit_requires_basis() {
        let data = vec![(0.0, 1.0), (1.0, 2.0)];
        let err = QuantileAnalysis::new(&data)
            .unwrap()
            .fit_quantile(0.5)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBasis(_)));
    }

    #[test]
    fn test_analytics_before_fitting_fail() {
        let data = vec![(0.0, 1.0), (1.0, 2.0)];
        let analysis = QuantileAnalysis::new(&data).unwrap();
        assert!(matches!(
            analysis.residuals(0.5, ErrorMode::Absolute).unwrap_err(),
            Error::NoSuchFit(_)
        ));
        assert!(matches!(
            analysis.conditional_cdf(0.5).unwrap_err(),
            Error::NoSuchFit(_)
        ));
    }

    #[test]
    fn test_separation_fraction() {
        let data = sine_data(0.3);
        for tau in [0.25, 0.5, 0.75] {
            let analysis = QuantileAnalysis::new(&data)
                .unwrap()
                .with_basis(BasisSpec::cubic(8))
                .unwrap()
                .fit_quantile(tau)
                .unwrap();
            let curve = analysis.fitted(FitKey::Quantile(tau)).unwrap();
            let fraction = fraction_below(&data, curve);
            assert!(
                (fraction - tau).abs() < 0.1,
                "tau {tau}: separation fraction was {fraction}"
            );
        }
    }

    #[test]
    fn test_median_recovers_trend() {
        // Symmetric zero-median noise: the τ = 0.5 fit tracks sin(2πx)
        let data = sine_data(0.3);
        let analysis = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(8))
            .unwrap()
            .fit_quantile(0.5)
            .unwrap();
        let curve = analysis.fitted(FitKey::Quantile(0.5)).unwrap();
        let mae = statistics::mean_absolute_error(
            data.iter().map(|&(x, _)| (std::f64::consts::TAU * x).sin()),
            data.iter().map(|&(x, _)| curve.y(x)),
        );
        assert!(mae < 0.15, "median fit MAE was {mae}");
    }

    #[test]
    fn test_more_knots_track_the_sine_better() {
        let data = sine_data(0.2);
        let truth: Vec<f64> = data
            .iter()
            .map(|&(x, _)| (std::f64::consts::TAU * x).sin())
            .collect();

        let mae_for = |knots: usize| {
            let analysis = QuantileAnalysis::new(&data)
                .unwrap()
                .with_basis(BasisSpec::cubic(knots))
                .unwrap()
                .fit_quantile(0.5)
                .unwrap();
            let curve = analysis.fitted(FitKey::Quantile(0.5)).unwrap();
            statistics::mean_absolute_error(
                truth.iter().copied(),
                data.iter().map(|&(x, _)| curve.y(x)),
            )
        };

        assert!(mae_for(8) < mae_for(2));
    }

    #[test]
    fn test_quantile_monotonicity() {
        let data = sine_data(0.4);
        let (analysis, report) = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(6))
            .unwrap()
            .fit_quantiles(&[0.25, 0.75]);
        assert!(report.iter().all(|(_, r)| r.is_ok()));

        let lower = analysis.fitted(FitKey::Quantile(0.25)).unwrap();
        let upper = analysis.fitted(FitKey::Quantile(0.75)).unwrap();
        let violations = (0..=100)
            .map(|i| 2.0 * f64::from(i) / 100.0)
            .filter(|&x| lower.y(x) > upper.y(x) + 1e-9)
            .count();
        assert!(violations <= 5, "{violations} crossings on the grid");
    }

    #[test]
    fn test_fit_quantiles_reports_partial_success() {
        let data = sine_data(0.2);
        let (analysis, report) = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(4))
            .unwrap()
            .fit_quantiles(&[0.5, 1.5]);

        assert!(report[0].1.is_ok());
        assert!(matches!(report[1].1, Err(Error::InvalidProbability(_))));
        assert!(analysis.fitted(FitKey::Quantile(0.5)).is_ok());
        assert!(analysis.fitted(FitKey::Quantile(1.5)).is_err());
    }

    #[test]
    fn test_band_outliers_flag_the_synthetic_spike() {
        let mut data = sine_data(0.1);
        data.push((1.0, 10.0)); // far above the trend
        let inlier = data[42];

        let (analysis, report) = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(6))
            .unwrap()
            .fit_quantiles(&[0.01, 0.99]);
        assert!(report.iter().all(|(_, r)| r.is_ok()));

        let flagged = analysis.band_outliers(0.01, 0.99).unwrap();
        assert!(flagged.contains(&(1.0, 10.0)));
        assert!(!flagged.contains(&inlier));
    }

    #[test]
    fn test_band_requires_ordered_probabilities() {
        let data = sine_data(0.1);
        let analysis = QuantileAnalysis::new(&data).unwrap();
        assert!(matches!(
            analysis.band_outliers(0.9, 0.1).unwrap_err(),
            Error::InvalidProbability(_)
        ));
    }

    #[test]
    fn test_conditional_cdf_endpoints() {
        let data = sine_data(0.3);
        let probs = [0.1, 0.25, 0.5, 0.75, 0.9];
        let (analysis, report) = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(6))
            .unwrap()
            .fit_quantiles(&probs);
        assert!(report.iter().all(|(_, r)| r.is_ok()));

        let cdf = analysis.conditional_cdf(1.0).unwrap();
        let values = cdf.values();
        assert_close!(cdf.evaluate(values[0]), 0.1, 1e-9);
        assert_close!(cdf.evaluate(values[values.len() - 1]), 0.9, 1e-9);
    }

    #[test]
    fn test_simulated_points_match_the_family() {
        let data = sine_data(0.3);
        let (analysis, report) = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(6))
            .unwrap()
            .fit_quantiles(&[0.05, 0.25, 0.5, 0.75, 0.95]);
        assert!(report.iter().all(|(_, r)| r.is_ok()));

        let median = analysis.fitted(FitKey::Quantile(0.5)).unwrap().clone();
        let simulated: Vec<(f64, f64)> = analysis
            .simulate(800, XSampling::UniformRange, Some(11))
            .unwrap()
            .collect();
        assert_eq!(simulated.len(), 800);

        // Per x-bucket, about half the simulated points sit below the
        // fitted median
        for bucket in 0..4 {
            let lo = 0.5 * f64::from(bucket);
            let hi = lo + 0.5;
            let in_bucket: Vec<&(f64, f64)> = simulated
                .iter()
                .filter(|&&(x, _)| x >= lo && x < hi)
                .collect();
            assert!(in_bucket.len() > 50);
            let below = in_bucket.iter().filter(|&&&(x, y)| y <= median.y(x)).count();
            let fraction = below as f64 / in_bucket.len() as f64;
            assert!(
                (fraction - 0.5).abs() < 0.12,
                "bucket {bucket}: fraction below the median was {fraction}"
            );
        }
    }

    #[test]
    fn test_least_squares_trend() {
        let data: Vec<(f64, f64)> = (0..50)
            .map(|i| {
                let x = f64::from(i) / 10.0;
                (x, 2.0 * x + 1.0)
            })
            .collect();
        let analysis = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(3))
            .unwrap()
            .fit_least_squares()
            .unwrap();
        let trend = analysis.fitted(FitKey::LeastSquares).unwrap();
        assert_close!(trend.y(2.5), 6.0, 1e-6);
    }

    #[test]
    fn test_with_data_keeps_the_registry() {
        let data = vec![(0.0, 1.0), (0.5, 1.5), (1.0, 2.0)];
        let analysis = QuantileAnalysis::new(&data)
            .unwrap()
            .with_basis(BasisSpec::cubic(1))
            .unwrap()
            .fit_quantile(0.5)
            .unwrap();
        let replaced = analysis
            .with_data(vec![(0.0, 5.0), (1.0, 6.0)])
            .unwrap();
        assert!(replaced.fitted(FitKey::Quantile(0.5)).is_ok());
        assert_eq!(replaced.data().len(), 2);
    }
}
