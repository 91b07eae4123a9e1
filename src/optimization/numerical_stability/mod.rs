//! numerical_stability — guarded nonlinear transforms for model fitting.
//!
//! Purpose
//! -------
//! Host the overflow-safe primitives that objective functions build on, so
//! that every `LogLikelihood` implementation evaluates to a finite value for
//! any finite parameter vector.
//!
//! Downstream usage
//! ----------------
//! - `propensity::logistic` writes its log-likelihood with
//!   [`safe_softplus`] and its gradient and fitted scores with
//!   [`safe_logistic`].

pub mod transformations;

pub use self::transformations::{safe_logistic, safe_softplus};
