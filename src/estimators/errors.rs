//! estimators::errors — the single error type every estimator returns.
//!
//! Purpose
//! -------
//! Give callers one enum to match on, whatever layer a failure came from.
//! Data-layer failures are wrapped verbatim; optimizer and propensity
//! failures are folded into `ModelFit` with the model they belong to.
//!
//! Key behaviors
//! -------------
//! - `From<DataError>` wraps into `CausalError::Data`.
//! - `From<PropensityError>` maps into `ModelFit { model: "propensity", .. }`.
//! - `From<OptError>` maps into `ModelFit { model: "donor weights", .. }`;
//!   the only optimizer an estimator drives directly is the NNLS weight fit.
//! - With `python-bindings`, every variant becomes a `ValueError`.
//!
//! Conventions
//! -----------
//! - Errors are raised at detection and never retried; an estimator returns
//!   either a complete result or one error.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::{
    data::errors::DataError, optimization::errors::OptError,
    propensity::errors::PropensityError,
};

pub type CausalResult<T> = Result<T, CausalError>;

/// CausalError — why an estimator could not produce a result.
///
/// Variants
/// --------
/// - `MissingGroup`: group 0 or 1 has no rows in `column`.
/// - `ModelFit`: an internal fit (propensity model, donor weights) failed.
/// - `InsufficientDonors`: no control rows (PSM) or donor units (synthetic
///   control).
/// - `UnknownUnit`: the treated unit does not occur in `column`.
/// - `EmptyWindow`: a time window or period/group cell selects no rows.
/// - `OverlappingPeriods`: pre and post periods overlap and the caller asked
///   for that to be rejected.
/// - `IncompletePanel`: a (unit, time) cell of the synthetic-control panel
///   has no observation.
/// - `Numerical`: a statistical routine rejected its input.
/// - `Data`: malformed dataset or incompatible column.
#[derive(Debug, Clone, PartialEq)]
pub enum CausalError {
    MissingGroup { column: String, group: u8 },
    ModelFit { model: &'static str, reason: String },
    InsufficientDonors { column: String },
    UnknownUnit { column: String, unit: String },
    EmptyWindow { window: String },
    OverlappingPeriods { pre: String, post: String },
    IncompletePanel { unit: String, time: String },
    Numerical { reason: String },
    Data(DataError),
}

impl std::error::Error for CausalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CausalError::Data(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for CausalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CausalError::MissingGroup { column, group } => {
                write!(f, "No rows with {column} == {group}; both groups are required")
            }
            CausalError::ModelFit { model, reason } => {
                write!(f, "Failed to fit {model} model: {reason}")
            }
            CausalError::InsufficientDonors { column } => {
                write!(f, "No control or donor units available in column '{column}'")
            }
            CausalError::UnknownUnit { column, unit } => {
                write!(f, "Treated unit '{unit}' not found in column '{column}'")
            }
            CausalError::EmptyWindow { window } => {
                write!(f, "No observations fall in the {window} window")
            }
            CausalError::OverlappingPeriods { pre, post } => {
                write!(f, "Pre period {pre} and post period {post} overlap or are out of order")
            }
            CausalError::IncompletePanel { unit, time } => {
                write!(f, "Unit '{unit}' has no observation at {time}")
            }
            CausalError::Numerical { reason } => write!(f, "Numerical error: {reason}"),
            CausalError::Data(err) => write!(f, "{err}"),
        }
    }
}

impl From<DataError> for CausalError {
    fn from(err: DataError) -> Self {
        CausalError::Data(err)
    }
}

impl From<PropensityError> for CausalError {
    fn from(err: PropensityError) -> Self {
        CausalError::ModelFit { model: "propensity", reason: err.to_string() }
    }
}

impl From<OptError> for CausalError {
    fn from(err: OptError) -> Self {
        CausalError::ModelFit { model: "donor weights", reason: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<CausalError> for PyErr {
    fn from(err: CausalError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Lower-layer errors land in the documented variants and keep their
    // messages.
    fn lower_layer_errors_convert_into_documented_variants() {
        // Arrange
        let data = DataError::MissingColumn { name: "revenue".to_string() };
        let propensity = PropensityError::SingleClass { treated: 0, total: 4 };
        let nnls = OptError::NnlsNotConverged { iterations: 30 };

        // Act
        let from_data = CausalError::from(data.clone());
        let from_propensity = CausalError::from(propensity);
        let from_nnls = CausalError::from(nnls);

        // Assert
        assert_eq!(from_data, CausalError::Data(data));
        match from_propensity {
            CausalError::ModelFit { model, reason } => {
                assert_eq!(model, "propensity");
                assert!(reason.contains("0 of 4"), "got: {reason}");
            }
            other => panic!("expected ModelFit, got {other:?}"),
        }
        assert!(matches!(from_nnls, CausalError::ModelFit { model: "donor weights", .. }));
    }

    #[test]
    // Purpose
    // -------
    // Messages name the column/unit/window they refer to.
    fn display_names_the_offending_selector() {
        let unknown = CausalError::UnknownUnit { column: "region".into(), unit: "Z".into() };
        let window = CausalError::EmptyWindow { window: "post-treatment".into() };

        assert!(unknown.to_string().contains("'Z'") && unknown.to_string().contains("region"));
        assert!(window.to_string().contains("post-treatment"));
    }
}
