//! Overflow-safe logistic transforms.
//!
//! The logistic log-likelihood is written as `y·η − softplus(η)`, with
//! gradient `(y − σ(η))·x`; both pieces must stay finite for any real `η`,
//! including the large-magnitude linear predictors produced by nearly
//! separable propensity data.
//!
//! # Provided items
//! - [`safe_softplus`]: `ln(1 + eᵡ)` without overflow.
//! - [`safe_logistic`]: `σ(x) = 1 / (1 + e⁻ᵡ)` without overflow.

/// Cutoff above which `ln(1 + eᵡ)` equals `x` to `f64` precision.
const SOFTPLUS_LINEAR_CUTOFF: f64 = 20.0;

/// Numerically stable softplus `ln(1 + eᵡ)`.
///
/// - `x > 20`: returns `x` (the `ln1p(e⁻ᵡ)` correction is below `f64` ulp).
/// - otherwise: `ln1p(eᵡ)`, accurate for large negative `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > SOFTPLUS_LINEAR_CUTOFF { x } else { x.exp().ln_1p() }
}

/// Numerically stable logistic function `σ(x)`.
///
/// Evaluates `e⁻|ˣ|` only, so neither branch can overflow:
/// `σ(x) = 1 / (1 + e⁻ˣ)` for `x ≥ 0` and `eˣ / (1 + eˣ)` for `x < 0`.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
