//! # Quantreg
//! ## The whole conditional distribution, not just the average
//!
//! Ordinary least squares answers one question about your data: what is the
//! *mean* of `y` at a given `x`. Quantile regression answers all the others —
//! where the median sits, how wide the spread is, what a "surprisingly high"
//! value looks like — by fitting one curve per probability level τ, each
//! minimizing the pinball (check) loss instead of squared error.
//!
//! This library gives you:
//! - Flexible curve shapes through swappable bases: clamped B-splines of any
//!   degree, or your own closures
//! - A family of quantile fits plus an optional least-squares trend, kept
//!   together in one analysis so downstream questions resolve by probability
//!   level
//! - Derived analytics on top of the family: residuals, outlier
//!   classification (residual fences or quantile bands), the conditional CDF
//!   at any `x`, and simulation of synthetic datasets that follow the fitted
//!   distribution
//!
//! The simplest use-case is bracketing a noisy trend with a quantile band:
//! ```rust
//! use quantreg::{BasisSpec, FitKey, QuantileAnalysis};
//!
//! let data: Vec<(f64, f64)> = (0..200)
//!     .map(|i| {
//!         let x = f64::from(i) / 100.0;
//!         (x, x * x + f64::from(i % 7) * 0.05)
//!     })
//!     .collect();
//!
//! let (analysis, report) = QuantileAnalysis::new(&data)?
//!     .with_basis(BasisSpec::cubic(4))?
//!     .fit_quantiles(&[0.1, 0.5, 0.9]);
//! assert!(report.iter().all(|(_, r)| r.is_ok()));
//!
//! // The 10%-90% band brackets most of the data
//! let escaped = analysis.band_outliers(0.1, 0.9)?;
//! assert!(escaped.len() < data.len() / 2);
//!
//! // And the median curve is available for point predictions
//! let median = analysis.fitted(FitKey::Quantile(0.5))?;
//! assert!(median.y(0.5).is_finite());
//! # Ok::<(), quantreg::Error>(())
//! ```
//!
//! # Core Concepts
//! - A [`QuantileAnalysis`] owns a dataset, a basis, and a registry of fits.
//!     - Fitting methods consume and return it, so pipelines chain
//!       top-to-bottom with no hidden state.
//!     - Analytics methods borrow it and resolve fits by [`FitKey`].
//! - A [`Basis`] is a set of functions whose weighted sum forms a fitted
//!   curve; it is built from a [`BasisSpec`] over the dataset's x-range.
//!     - [`BasisSpec::cubic`] is the recommended default: clamped cubic
//!       B-splines, locally supported and numerically tame.
//!     - [`BasisSpec::functions`] accepts arbitrary closures when you know
//!       the functional form.
//! - The probability level **τ** selects which quantile a fit targets: the
//!   τ = 0.5 fit is the conditional median, τ = 0.9 the curve below which
//!   ninety percent of the data falls at each `x`.
//!     - Quantile fits solve a linear program over the pinball loss;
//!       [`FitKey::LeastSquares`] records the SVD-based mean trend instead.
//! - A [`analytics::ConditionalCdf`] inverts a fitted family at a fixed
//!   `x₀`, answering `P(Y ≤ y | X = x₀)` and its inverse — including
//!   simulation of new data from the fitted distribution.
//!
//! # Implementation Details
//!
//! Linear algebra is provided by `nalgebra`; the quantile solver is a dense
//! simplex method specialized to the pinball-loss program, and the
//! least-squares solver uses SVD with a rank tolerance scaled to the design
//! matrix. With the `parallel` feature (on by default), multi-τ fits run on
//! a `rayon` thread pool.
//!
//! # Testing utilities
//!
//! The [`assert_close`] and [`assert_all_close`] macros compare
//! floating-point results within a tolerance; see [`test`].
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)] // The worst clippy lint
#![allow(clippy::cast_precision_loss)] // I don't care about this one
#![allow(clippy::similar_names)] //       Clippy does not get to decide what names are similar


pub mod analytics;
pub mod basis;
pub mod error;
pub mod solver;
pub mod statistics;
pub mod value;

mod context;
mod registry;

pub use basis::{Basis, BasisFunction, BasisSpec, KnotSpec};
pub use context::{FitReport, QuantileAnalysis};
pub use error::{Error, Result};
pub use registry::{FitKey, FitRegistry, FittedCurve};
pub use solver::SolverOptions;

pub use nalgebra;
pub use num_traits;
