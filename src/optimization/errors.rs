//! optimization::errors — one error surface for the L-BFGS and NNLS solvers.
//!
//! Purpose
//! -------
//! Normalize configuration mistakes, numerical failures and argmin backend
//! errors into [`OptError`], so the propensity and synthetic-control layers
//! only ever match on one enum.
//!
//! Conventions
//! -----------
//! - argmin errors arrive as `argmin::core::Error` (an `anyhow`-style box);
//!   `From<Error>` downcasts to `ArgminError` where possible and keeps the
//!   message otherwise.
//! - Errors raised inside a cost/gradient closure travel through argmin as
//!   boxed `OptError`s and are recovered intact by the same downcast.

use argmin::core::{ArgminError, Error};

/// Result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// The objective has no analytic gradient; finite differences apply.
    GradientNotImplemented,
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Options ----
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    NoTolerancesProvided,
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Objective / outcome ----
    NonFiniteCost {
        value: f64,
    },
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },
    MissingThetaHat,
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    // ---- NNLS ----
    /// Design matrix and target disagree on the number of rows.
    NnlsDimMismatch {
        rows: usize,
        target_len: usize,
    },
    /// Design matrix or target contains NaN/±∞.
    NnlsNonFiniteInput {
        row: usize,
        col: Option<usize>,
        value: f64,
    },
    /// Active-set iterations exhausted before the KKT conditions held.
    NnlsNotConverged {
        iterations: usize,
    },
    /// Unconstrained least squares on the passive set failed.
    NnlsSubproblemFailed {
        reason: String,
    },
    InvalidNnlsTol {
        tol: f64,
    },

    // ---- Argmin ----
    InvalidParameter {
        text: String,
    },
    NotImplemented {
        text: String,
    },
    NotInitialized {
        text: String,
    },
    ConditionViolated {
        text: String,
    },
    CheckPointNotFound {
        text: String,
    },
    PotentialBug {
        text: String,
    },
    ImpossibleError {
        text: String,
    },
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not implemented"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "No tolerances provided"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            OptError::NonFiniteCost { value } => write!(f, "Non-finite objective value: {value}"),
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Solver returned no parameter estimate"),
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Parameter length mismatch: expected {expected}, actual {actual}")
            }

            OptError::NnlsDimMismatch { rows, target_len } => {
                write!(f, "NNLS design has {rows} rows but target has {target_len} entries")
            }
            OptError::NnlsNonFiniteInput { row, col: Some(col), value } => {
                write!(f, "NNLS design entry ({row}, {col}) is {value}, must be finite")
            }
            OptError::NnlsNonFiniteInput { row, col: None, value } => {
                write!(f, "NNLS target entry {row} is {value}, must be finite")
            }
            OptError::NnlsNotConverged { iterations } => {
                write!(f, "NNLS did not converge within {iterations} iterations")
            }
            OptError::NnlsSubproblemFailed { reason } => {
                write!(f, "NNLS least-squares subproblem failed: {reason}")
            }
            OptError::InvalidNnlsTol { tol } => {
                write!(f, "Invalid NNLS tolerance {tol}: must be finite and non-negative")
            }

            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
