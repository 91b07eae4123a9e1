//! data — in-memory tabular input shared by every estimator.
//!
//! Purpose
//! -------
//! Provide the one input abstraction the estimators agree on: a read-only
//! table of named, homogeneously typed columns, plus the timestamp parsing
//! and inclusive period type needed to slice it by time.
//!
//! Key behaviors
//! -------------
//! - [`Dataset`] stores columns (numeric, text, timestamp) and exposes typed
//!   role accessors (`numeric`, `indicator`, `timestamps`, `labels`).
//! - [`time::parse_timestamp`] and [`Period`] implement ISO-8601 coercion and
//!   inclusive windows.
//! - [`DataError`] reports malformed input and role/type incompatibilities.
//!
//! Conventions
//! -----------
//! - Loading data from files or databases is the caller's job; this module
//!   only holds what has already been read.
//!
//! Downstream usage
//! ----------------
//! - Estimators take `&Dataset` and pull typed views by column name.
//! - Python bindings build a `Dataset` from a dict of columns (see `utils`).

pub mod dataset;
pub mod errors;
pub mod time;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::dataset::{Column, Dataset, Row, Value};
pub use self::errors::{DataError, DataResult};
pub use self::time::{Period, parse_timestamp};
