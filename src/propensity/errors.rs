//! propensity::errors — failures of propensity fitting and score matching.
//!
//! Purpose
//! -------
//! Separate "the covariates cannot support a propensity model" from generic
//! optimizer failures, so the PSM estimator can report both as a model-fit
//! error with a precise reason.
//!
//! Conventions
//! -----------
//! - Optimizer failures are wrapped verbatim in `PropensityError::Opt`.
//! - The estimators layer lifts every variant into
//!   `CausalError::ModelFit { model: "propensity", .. }`.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::errors::OptError;

pub type PropensityResult<T> = Result<T, PropensityError>;

/// PropensityError — why a propensity model could not produce scores.
///
/// Variants
/// --------
/// - `InvalidPenalty`: the inverse regularization strength is not a
///   positive finite number.
/// - `NoCovariates`: the covariate matrix has zero columns.
/// - `DimensionMismatch`: covariate rows and treatment labels disagree.
/// - `DegenerateCovariate`: a covariate is constant, so it cannot be
///   standardized.
/// - `SingleClass`: every unit is treated, or none is.
/// - `NotConverged`: the optimizer stopped without meeting its tolerances.
/// - `NonFiniteScore`: a fitted score is NaN/±∞.
/// - `Opt`: the optimizer itself failed.
#[derive(Debug, Clone, PartialEq)]
pub enum PropensityError {
    InvalidPenalty { c: f64 },
    NoCovariates,
    DimensionMismatch { rows: usize, labels: usize },
    DegenerateCovariate { index: usize },
    SingleClass { treated: usize, total: usize },
    NotConverged { iterations: usize, status: String },
    NonFiniteScore { row: usize, value: f64 },
    Opt(OptError),
}

impl std::error::Error for PropensityError {}

impl std::fmt::Display for PropensityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropensityError::InvalidPenalty { c } => {
                write!(f, "Inverse regularization strength must be positive and finite, got {c}")
            }
            PropensityError::NoCovariates => {
                write!(f, "At least one covariate is required to fit propensity scores")
            }
            PropensityError::DimensionMismatch { rows, labels } => {
                write!(f, "Covariates have {rows} rows but {labels} treatment labels were given")
            }
            PropensityError::DegenerateCovariate { index } => {
                write!(f, "Covariate {index} is constant and carries no information")
            }
            PropensityError::SingleClass { treated, total } => {
                write!(f, "Both classes are required: {treated} of {total} units are treated")
            }
            PropensityError::NotConverged { iterations, status } => {
                write!(f, "Optimizer did not converge after {iterations} iterations ({status})")
            }
            PropensityError::NonFiniteScore { row, value } => {
                write!(f, "Propensity score for row {row} is {value}")
            }
            PropensityError::Opt(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<OptError> for PropensityError {
    fn from(err: OptError) -> Self {
        PropensityError::Opt(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<PropensityError> for PyErr {
    fn from(err: PropensityError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
