//! optimization — numerical fitting layer shared by the estimators.
//!
//! Purpose
//! -------
//! Provide the two solvers the estimators need, behind a single error
//! surface:
//! - an argmin L-BFGS maximizer for smooth objectives (`lbfgs`), used to fit
//!   the logistic propensity model;
//! - a non-negative least-squares solver (`nnls`), used to fit
//!   synthetic-control donor weights.
//!
//! Key behaviors
//! -------------
//! - `lbfgs::maximize` maximizes a user `LogLikelihood` and reports a
//!   validated `FitOutcome`.
//! - `nnls::LawsonHanson` implements the `NnlsSolver` capability.
//! - `numerical_stability` hosts overflow-safe softplus/logistic transforms.
//! - `errors::OptError` normalizes configuration mistakes, numerical failures
//!   and argmin backend errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both solvers are deterministic for a given input and bounded by an
//!   explicit iteration budget.
//! - Nothing here panics on bad input; every failure is an `OptError`.
//!
//! Conventions
//! -----------
//! - Vectors and matrices are `ndarray` types at the public boundary;
//!   nalgebra appears only inside the NNLS passive-set solve.
//! - Progress is reported through `log::debug!`; the library never installs
//!   a logger.
//!
//! Downstream usage
//! ----------------
//! - `propensity` converts `OptError` into `PropensityError::Opt`.
//! - `estimators::synth_control` converts `OptError` into
//!   `CausalError::ModelFit` for the donor-weight fit.

pub mod errors;
pub mod lbfgs;
pub mod nnls;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::lbfgs::prelude::*;
    pub use super::nnls::{LawsonHanson, NnlsOptions, NnlsSolver};
    pub use super::numerical_stability::{safe_logistic, safe_softplus};
}
