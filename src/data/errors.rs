//! data::errors — error surface for dataset construction and column access.
//!
//! Purpose
//! -------
//! Describe every way a tabular input can be malformed or incompatible with
//! the column role an estimator asks of it (numeric outcome, binary group,
//! time index, unit label). Estimators lift these into
//! `estimators::CausalError::Data` so callers see a single error type.
//!
//! Conventions
//! -----------
//! - Column names are carried as owned `String`s so that messages can name
//!   the offending column without borrowing the dataset.
//! - Type names in `TypeMismatch` are the short, stable identifiers returned
//!   by `Column::kind` (`"numeric"`, `"text"`, `"timestamp"`).
//!
//! Testing notes
//! -------------
//! - Unit tests check that `Display` messages embed their payloads.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type DataResult<T> = Result<T, DataError>;

/// DataError — failures while building or reading a [`Dataset`](super::Dataset).
///
/// Variants
/// --------
/// - `MissingColumn`: a requested column does not exist.
/// - `DuplicateColumn`: two columns share a name at construction.
/// - `LengthMismatch`: a column's length differs from the dataset's row count.
/// - `RaggedRow`: a row lacks a column that earlier rows define, or adds one.
/// - `TypeMismatch`: a column holds a different kind than the role requires,
///   or a row-built column mixes kinds.
/// - `NonBinaryValue`: a group indicator holds something other than 0 or 1.
/// - `NonFiniteValue`: a numeric column consumed by an estimator holds NaN/±∞.
/// - `InvalidTimestamp`: a text value is not ISO-8601 parseable.
/// - `ReversedPeriod`: a period's start lies after its end.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    MissingColumn { name: String },
    DuplicateColumn { name: String },
    LengthMismatch { name: String, expected: usize, found: usize },
    RaggedRow { row: usize, name: String },
    TypeMismatch { name: String, expected: &'static str, found: &'static str },
    NonBinaryValue { name: String, row: usize, value: f64 },
    NonFiniteValue { name: String, row: usize, value: f64 },
    InvalidTimestamp { value: String },
    ReversedPeriod { start: String, end: String },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::MissingColumn { name } => {
                write!(f, "Column '{name}' not found in dataset")
            }
            DataError::DuplicateColumn { name } => {
                write!(f, "Column '{name}' is defined more than once")
            }
            DataError::LengthMismatch { name, expected, found } => {
                write!(f, "Column '{name}' has {found} values, expected {expected}")
            }
            DataError::RaggedRow { row, name } => {
                write!(f, "Row {row} does not agree with the dataset on column '{name}'")
            }
            DataError::TypeMismatch { name, expected, found } => {
                write!(f, "Column '{name}' is {found}, expected {expected}")
            }
            DataError::NonBinaryValue { name, row, value } => {
                write!(f, "Column '{name}' row {row}: value {value} is not a 0/1 group label")
            }
            DataError::NonFiniteValue { name, row, value } => {
                write!(f, "Column '{name}' row {row}: value {value} must be finite")
            }
            DataError::InvalidTimestamp { value } => {
                write!(f, "Cannot parse '{value}' as an ISO-8601 timestamp")
            }
            DataError::ReversedPeriod { start, end } => {
                write!(f, "Period start {start} lies after its end {end}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
