//! Bridge from a [`LogLikelihood`] to argmin's `CostFunction` / `Gradient`.
//!
//! argmin minimizes, so the adapter reports `c(θ) = -ℓ(θ)` and
//! `∇c(θ) = -∇ℓ(θ)`. When the objective has no analytic gradient the adapter
//! differentiates the cost numerically: central differences first, forward
//! differences if the central estimate is non-finite or the objective errors
//! at one of the probe points.

use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

use crate::optimization::{
    errors::OptError,
    lbfgs::{
        options::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};

#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    fn numerical_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        // First failure raised by `cost` while finitediff probes; the probe
        // itself only sees NaN.
        let probe_err: RefCell<Option<Error>> = RefCell::new(None);
        let probe = |point: &Theta| -> f64 {
            self.cost(point).unwrap_or_else(|err| {
                probe_err.borrow_mut().get_or_insert(err);
                f64::NAN
            })
        };

        let central = theta.central_diff(&probe);
        if probe_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
            return Ok(central);
        }

        probe_err.replace(None);
        let forward = theta.forward_diff(&probe);
        if let Some(err) = probe_err.take() {
            return Err(err);
        }
        validate_grad(&forward, theta.len())?;
        Ok(forward)
    }
}

impl<F: LogLikelihood> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value }.into());
        }
        Ok(-value)
    }
}

impl<F: LogLikelihood> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.numerical_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}
