//! Finiteness and shape checks shared by options, adapter and outcome.
//!
//! Each helper returns the specific `OptError` variant for the quantity it
//! guards, so failures name the offending tolerance, index or value.

use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgs::types::{Grad, Theta},
};

fn positive_finite(tol: f64) -> Result<(), &'static str> {
    if !tol.is_finite() {
        Err("Tolerance must be finite.")
    } else if tol <= 0.0 {
        Err("Tolerance must be positive.")
    } else {
        Ok(())
    }
}

pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match tol.map(|t| (t, positive_finite(t))) {
        Some((tol, Err(reason))) => Err(OptError::InvalidTolGrad { tol, reason }),
        _ => Ok(()),
    }
}

pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match tol.map(|t| (t, positive_finite(t))) {
        Some((tol, Err(reason))) => Err(OptError::InvalidTolCost { tol, reason }),
        _ => Ok(()),
    }
}

/// Gradient must have the parameter dimension and finite entries.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(OptError::InvalidGradient {
            index,
            value,
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best parameter and require every entry to be finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(theta)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() { Ok(()) } else { Err(OptError::NonFiniteCost { value }) }
}
