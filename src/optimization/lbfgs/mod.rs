//! lbfgs — argmin-backed L-BFGS maximizer for smooth objectives.
//!
//! Purpose
//! -------
//! Fit models by maximizing an objective `ℓ(θ)` (typically a penalized
//! log-likelihood) with L-BFGS. Callers implement [`LogLikelihood`] and call
//! [`maximize`]; argmin, line-search selection and derivative fallbacks stay
//! behind this module.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into argmin's cost
//!   `c(θ) = -ℓ(θ)`, falling back to finite differences when no analytic
//!   gradient is available.
//! - [`maximize`] checks the start point, builds the solver for the chosen
//!   [`LineSearcher`], runs it and returns a validated [`FitOutcome`].
//! - [`Tolerances`] and [`FitOptions`] are validated on construction.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives report invalid inputs as `OptError`, never panic.
//! - `FitOutcome::converged` is `true` only if the solver's convergence test
//!   fired; callers that need a converged fit must check it.
//!
//! Conventions
//! -----------
//! - Values, gradients and outcomes are expressed in terms of `ℓ`, never the
//!   internal cost.
//! - With the `obs_slog` feature and `FitOptions::verbose`, progress is
//!   streamed to the terminal through argmin's slog observer.
//!
//! Downstream usage
//! ----------------
//! - `propensity::logistic` implements [`LogLikelihood`] for a penalized
//!   logistic regression and calls [`maximize`] with [`FitOptions`].
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover sign conventions, finite-difference
//!   fallback, option validation, and convergence on concave quadratics.
//! - End-to-end fits are exercised by the propensity tests.

pub mod adapter;
pub mod options;
pub mod outcome;
pub mod solver;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::options::{FitOptions, LineSearcher, LogLikelihood, Tolerances};
pub use self::outcome::FitOutcome;
pub use self::solver::maximize;
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::options::{FitOptions, LineSearcher, LogLikelihood, Tolerances};
    pub use super::outcome::FitOutcome;
    pub use super::solver::maximize;
    pub use super::types::{Cost, Grad, Theta};
}
