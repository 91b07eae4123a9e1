//! propensity — pluggable propensity models and score matching.
//!
//! Purpose
//! -------
//! Supply the two strategies the PSM estimator composes: a model mapping
//! covariates to `P(treated | x)` and a nearest-neighbor search pairing each
//! treated score with a control score.
//!
//! Key behaviors
//! -------------
//! - [`PropensityModel`]: fit on all units, return one score per row.
//!   [`LogisticPropensity`] (L2-penalized logistic regression via L-BFGS)
//!   is the default.
//! - [`NeighborSearch`]: 1-NN on scalar scores with lowest-index tie
//!   breaking. [`SortedScan`] is the default; [`LinearScan`] is the
//!   brute-force reference.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores returned by a `PropensityModel` are finite and aligned with the
//!   input rows.
//! - `NeighborSearch::nearest` returns indices into `controls`, one per
//!   query, or an empty vector when `controls` is empty.
//!
//! Downstream usage
//! ----------------
//! - `estimators::psm::run_psm_with` accepts any implementation of both
//!   traits; `run_psm` uses the defaults.

pub mod errors;
pub mod logistic;
pub mod matching;

use ndarray::{Array1, ArrayView2};

pub use self::errors::{PropensityError, PropensityResult};
pub use self::logistic::LogisticPropensity;
pub use self::matching::{LinearScan, SortedScan};

/// Capability: estimate treatment probabilities from covariates.
pub trait PropensityModel {
    /// Fit on `covariates` (rows = units) and `treated` labels and return one
    /// score in `[0, 1]` per row.
    fn fit_scores(
        &self, covariates: ArrayView2<'_, f64>, treated: &[bool],
    ) -> PropensityResult<Array1<f64>>;
}

/// Capability: for each query score, the index of the nearest control score.
pub trait NeighborSearch {
    fn nearest(&self, controls: &[f64], queries: &[f64]) -> Vec<usize>;
}

pub mod prelude {
    pub use super::errors::{PropensityError, PropensityResult};
    pub use super::{
        LinearScan, LogisticPropensity, NeighborSearch, PropensityModel, SortedScan,
    };
}
