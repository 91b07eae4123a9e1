//! Solver configuration: objective trait, tolerances, line search, options.
//!
//! - [`LogLikelihood`]: the objective a model implements. It is *maximized*.
//! - [`Tolerances`]: stopping rules, validated on construction.
//! - [`LineSearcher`]: line search used inside L-BFGS, parseable from text.
//! - [`FitOptions`]: everything [`maximize`](super::maximize) needs besides
//!   the objective and the starting point.
//!
//! Gradients returned by [`LogLikelihood::grad`] are gradients of the
//! objective itself; the adapter negates both value and gradient before
//! handing them to argmin.

use std::str::FromStr;

use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgs::{
        types::{Cost, Grad, Theta},
        validation::{verify_tol_cost, verify_tol_grad},
    },
};

/// Objective to maximize over `Theta`.
///
/// Required
/// --------
/// - `value`: evaluate `ℓ(θ)`. Invalid inputs are reported as `OptError`,
///   never as panics.
/// - `check`: called once on the starting point before any iteration.
///
/// Optional
/// --------
/// - `grad`: analytic `∇ℓ(θ)`. The default returns
///   `OptError::GradientNotImplemented`, which switches the adapter to
///   finite differences.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search used by L-BFGS. Parses case-insensitively from
/// `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morethuente" | "more-thuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" | "hager-zhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are 'MoreThuente' or 'HagerZhang' (case insensitive).",
            }),
        }
    }
}

/// Stopping rules for the solver.
///
/// At least one field must be set. Tolerances must be finite and strictly
/// positive; `max_iter` must be non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - `OptError::NoTolerancesProvided` when every field is `None`.
    /// - `OptError::InvalidTolGrad` / `OptError::InvalidTolCost` for
    ///   non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` when `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    /// `tol_grad = 1e-6`, `tol_cost = 1e-12`, `max_iter = 1000`.
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: Some(1e-12), max_iter: Some(1000) }
    }
}

/// Full solver configuration.
///
/// - `verbose` attaches a terminal observer when the `obs_slog` feature is
///   enabled and is ignored otherwise.
/// - `lbfgs_mem = None` uses [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl FitOptions {
    /// # Errors
    /// - `OptError::InvalidLBFGSMem` when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}
