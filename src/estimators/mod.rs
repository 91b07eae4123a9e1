//! estimators — the four causal-effect estimators.
//!
//! Purpose
//! -------
//! Turn a [`Dataset`](crate::data::Dataset) plus column selectors into a
//! typed effect estimate:
//! - [`ab::ab_summary`]: two-proportion z-test on grouped sums.
//! - [`psm::run_psm`]: propensity-score matching (1-NN with replacement).
//! - [`did::run_did`]: 2×2 difference-in-differences of cell means.
//! - [`synth_control::run_synth_control`]: NNLS synthetic control.
//!
//! Key behaviors
//! -------------
//! - Every estimator is a pure function of its inputs: no global state, no
//!   randomness, identical inputs give identical results.
//! - Every estimator returns [`CausalResult`]; the error enum is shared.
//! - Results implement [`Estimate`] for a uniform `(name, value)` view and
//!   `serde::Serialize` with the canonical field names (`ATE_psm`,
//!   `DID_effect`, `post_period_ATE`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Binary group/treatment columns are validated as exactly 0/1.
//! - Numeric inputs used in arithmetic must be finite.
//!
//! Downstream usage
//! ----------------
//! - Rust callers import from `estimators::prelude`.
//! - The Python layer calls the same functions and converts results to
//!   dictionaries via `Estimate::scalars` plus estimator-specific fields.

pub mod ab;
pub mod did;
pub mod errors;
pub mod psm;
pub mod synth_control;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::ab::{AbSummary, ab_summary};
pub use self::did::{CellCounts, DidEstimate, DidOptions, PeriodPolicy, run_did, run_did_with};
pub use self::errors::{CausalError, CausalResult};
pub use self::psm::{PsmEstimate, run_psm, run_psm_with};
pub use self::synth_control::{
    SynthControlEstimate, TrajectoryPoint, run_synth_control, run_synth_control_with,
};

/// Uniform scalar view over an estimator result.
pub trait Estimate {
    /// Canonical scalar statistics as `(name, value)` pairs, in a fixed order.
    fn scalars(&self) -> Vec<(&'static str, f64)>;

    /// Look up one scalar by its canonical name.
    fn get(&self, name: &str) -> Option<f64> {
        self.scalars().into_iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }
}

pub mod prelude {
    pub use super::Estimate;
    pub use super::ab::{AbSummary, ab_summary};
    pub use super::did::{DidEstimate, DidOptions, PeriodPolicy, run_did, run_did_with};
    pub use super::errors::{CausalError, CausalResult};
    pub use super::psm::{PsmEstimate, run_psm, run_psm_with};
    pub use super::synth_control::{
        SynthControlEstimate, TrajectoryPoint, run_synth_control, run_synth_control_with,
    };
}
