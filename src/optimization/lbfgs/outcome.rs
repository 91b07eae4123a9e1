//! Normalized result of a [`maximize`](super::maximize) run.

use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;

use crate::optimization::{
    errors::OptResult,
    lbfgs::{
        types::{FnEvalMap, Grad, Theta},
        validation::{validate_theta_hat, validate_value},
    },
};

/// FitOutcome — best point found and how the solver stopped.
///
/// Fields
/// ------
/// - `theta_hat`: best parameter vector (all finite).
/// - `value`: objective `ℓ(θ̂)`, not the internal cost.
/// - `converged`: `true` only when the solver's own convergence test fired
///   (gradient or cost-change tolerance). Hitting `max_iter` is *not*
///   convergence.
/// - `status`: argmin's termination status rendered as text.
/// - `iterations`, `fn_evals`: argmin counters.
/// - `grad_norm`: L2 norm of the last gradient, when argmin kept one.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl FitOutcome {
    /// Validate raw solver state and classify the termination status.
    ///
    /// # Errors
    /// - `OptError::MissingThetaHat` / `OptError::InvalidThetaHat` for a
    ///   missing or non-finite estimate.
    /// - `OptError::NonFiniteCost` for a non-finite objective value.
    pub fn new(
        theta_hat: Option<Theta>, value: f64, termination: &TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat)?;
        validate_value(value)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        Ok(Self {
            theta_hat,
            value,
            converged,
            status: format!("{termination:?}"),
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
