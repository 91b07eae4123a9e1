//! data::dataset — read-only, column-typed tabular input for the estimators.
//!
//! Purpose
//! -------
//! Hold an in-memory table (rows of named, homogeneously typed columns) and
//! hand out typed views of its columns in the roles the estimators need:
//! numeric measures, 0/1 group indicators, time indices and unit labels.
//!
//! Key behaviors
//! -------------
//! - Build from rows ([`Dataset::from_rows`]) or column by column
//!   ([`Dataset::with_numeric`], [`Dataset::with_text`],
//!   [`Dataset::with_timestamps`]); both paths enforce equal lengths, unique
//!   names and a single value kind per column.
//! - Coerce text columns to timestamps on demand ([`Dataset::timestamps`]).
//! - Validate indicator columns against `{0, 1}` and numeric measures
//!   against finiteness before any arithmetic runs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every column has exactly `n_rows` values.
//! - Column order is insertion order (row-built datasets use the key order
//!   of the first row).
//! - Nothing here mutates after construction; estimators only borrow.
//!
//! Conventions
//! -----------
//! - Numeric data lives in `ndarray::Array1<f64>` so that covariate blocks can
//!   be stacked into matrices without conversion.
//! - Numeric unit labels render without a fractional part when integral
//!   (`3.0` → `"3"`), otherwise with Rust's shortest round-trip formatting.
//!
//! Testing notes
//! -------------
//! - Unit tests cover both construction paths, every error branch of the
//!   typed accessors, and timestamp coercion from text.

use chrono::NaiveDateTime;
use ndarray::{Array1, Array2};

use crate::data::{
    errors::{DataError, DataResult},
    time::parse_timestamp,
};

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "numeric",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// One input row: column name → value.
pub type Row = Vec<(String, Value)>;

/// A homogeneously typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Text(Vec<String>),
    Timestamp(Vec<NaiveDateTime>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short, stable name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
            Column::Timestamp(_) => "timestamp",
        }
    }
}

/// Dataset — ordered rows of named, typed columns.
///
/// Purpose
/// -------
/// The single input abstraction shared by all estimators. Stored column-wise
/// so that aggregations scan contiguous memory.
///
/// Fields
/// ------
/// - `names`: column names in insertion order.
/// - `columns`: one [`Column`] per name, same order.
/// - `n_rows`: common length of every column.
///
/// Examples
/// --------
/// ```rust
/// use causal_toolkit::data::Dataset;
///
/// let ds = Dataset::new()
///     .with_numeric("clicks", vec![3.0, 5.0])
///     .and_then(|ds| ds.with_numeric("treatment", vec![0.0, 1.0]))
///     .unwrap();
/// assert_eq!(ds.n_rows(), 2);
/// assert_eq!(ds.indicator("treatment").unwrap(), vec![false, true]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// An empty dataset with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from rows.
    ///
    /// The first row fixes the column set and each column's kind; every
    /// subsequent row must provide exactly the same names with values of the
    /// same kind.
    ///
    /// # Errors
    /// - `DataError::DuplicateColumn` if a row names a column twice.
    /// - `DataError::RaggedRow` if a row omits or adds a column.
    /// - `DataError::TypeMismatch` if a value's kind differs from its column.
    pub fn from_rows<I>(rows: I) -> DataResult<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut names: Vec<String> = Vec::new();
        let mut cells: Vec<Vec<Value>> = Vec::new();
        let mut n_rows = 0usize;

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row_idx == 0 {
                for (name, _) in &row {
                    if names.contains(name) {
                        return Err(DataError::DuplicateColumn { name: name.clone() });
                    }
                    names.push(name.clone());
                }
                cells = vec![Vec::new(); names.len()];
            }
            if row.len() != names.len() {
                let name = row
                    .iter()
                    .map(|(n, _)| n)
                    .find(|n| !names.contains(n))
                    .or_else(|| names.iter().find(|n| !row.iter().any(|(r, _)| r == *n)))
                    .cloned()
                    .unwrap_or_default();
                return Err(DataError::RaggedRow { row: row_idx, name });
            }
            let mut seen = vec![false; names.len()];
            for (name, value) in row {
                let idx = names
                    .iter()
                    .position(|n| *n == name)
                    .ok_or_else(|| DataError::RaggedRow { row: row_idx, name: name.clone() })?;
                if seen[idx] {
                    return Err(DataError::DuplicateColumn { name });
                }
                seen[idx] = true;
                if let Some(first) = cells[idx].first() {
                    if first.kind() != value.kind() {
                        return Err(DataError::TypeMismatch {
                            name,
                            expected: first.kind(),
                            found: value.kind(),
                        });
                    }
                }
                cells[idx].push(value);
            }
            n_rows += 1;
        }

        let columns = cells.into_iter().map(collect_column).collect();
        Ok(Self { names, columns, n_rows })
    }

    /// Append a numeric column.
    pub fn with_numeric(self, name: &str, values: impl Into<Array1<f64>>) -> DataResult<Self> {
        self.with_column(name, Column::Numeric(values.into()))
    }

    /// Append a text column.
    pub fn with_text<S: Into<String>>(
        self, name: &str, values: impl IntoIterator<Item = S>,
    ) -> DataResult<Self> {
        self.with_column(name, Column::Text(values.into_iter().map(Into::into).collect()))
    }

    /// Append a timestamp column.
    pub fn with_timestamps(self, name: &str, values: Vec<NaiveDateTime>) -> DataResult<Self> {
        self.with_column(name, Column::Timestamp(values))
    }

    /// Append an arbitrary column, checking name uniqueness and length.
    pub fn with_column(mut self, name: &str, column: Column) -> DataResult<Self> {
        if self.names.iter().any(|n| n == name) {
            return Err(DataError::DuplicateColumn { name: name.to_string() });
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(DataError::LengthMismatch {
                name: name.to_string(),
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.names.push(name.to_string());
        self.columns.push(column);
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Look up a column by name.
    ///
    /// # Errors
    /// - `DataError::MissingColumn` if `name` is not present.
    pub fn column(&self, name: &str) -> DataResult<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| DataError::MissingColumn { name: name.to_string() })
    }

    /// Borrow a numeric column.
    pub fn numeric(&self, name: &str) -> DataResult<&Array1<f64>> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            other => Err(type_mismatch(name, "numeric", other)),
        }
    }

    /// Borrow a numeric column after checking every value is finite.
    pub fn finite_numeric(&self, name: &str) -> DataResult<&Array1<f64>> {
        let values = self.numeric(name)?;
        if let Some((row, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::NonFiniteValue { name: name.to_string(), row, value });
        }
        Ok(values)
    }

    /// Read a 0/1 group indicator as booleans (`true` = treated).
    ///
    /// # Errors
    /// - `DataError::TypeMismatch` for non-numeric columns.
    /// - `DataError::NonBinaryValue` for any value other than exactly 0 or 1.
    pub fn indicator(&self, name: &str) -> DataResult<Vec<bool>> {
        self.numeric(name)?
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                if value == 1.0 {
                    Ok(true)
                } else if value == 0.0 {
                    Ok(false)
                } else {
                    Err(DataError::NonBinaryValue { name: name.to_string(), row, value })
                }
            })
            .collect()
    }

    /// Read a column as a time index.
    ///
    /// Timestamp columns are copied; text columns are parsed value by value
    /// with [`parse_timestamp`]. Numeric columns are not coercible.
    pub fn timestamps(&self, name: &str) -> DataResult<Vec<NaiveDateTime>> {
        match self.column(name)? {
            Column::Timestamp(values) => Ok(values.clone()),
            Column::Text(values) => values.iter().map(|v| parse_timestamp(v)).collect(),
            other => Err(type_mismatch(name, "timestamp", other)),
        }
    }

    /// Read a column as discrete unit labels.
    pub fn labels(&self, name: &str) -> DataResult<Vec<String>> {
        match self.column(name)? {
            Column::Text(values) => Ok(values.clone()),
            Column::Numeric(values) => Ok(values.iter().map(|&v| numeric_label(v)).collect()),
            other => Err(type_mismatch(name, "text or numeric", other)),
        }
    }

    /// Stack numeric columns into an `n_rows × names.len()` matrix.
    pub fn numeric_matrix(&self, names: &[String]) -> DataResult<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((self.n_rows, names.len()));
        for (j, name) in names.iter().enumerate() {
            out.column_mut(j).assign(self.finite_numeric(name)?);
        }
        Ok(out)
    }
}

/// Render a numeric unit identifier as a label.
pub fn numeric_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn type_mismatch(name: &str, expected: &'static str, found: &Column) -> DataError {
    DataError::TypeMismatch { name: name.to_string(), expected, found: found.kind() }
}

fn collect_column(values: Vec<Value>) -> Column {
    match values.first() {
        Some(Value::Text(_)) => Column::Text(
            values
                .into_iter()
                .filter_map(|v| if let Value::Text(s) = v { Some(s) } else { None })
                .collect(),
        ),
        Some(Value::Timestamp(_)) => Column::Timestamp(
            values
                .into_iter()
                .filter_map(|v| if let Value::Timestamp(t) = v { Some(t) } else { None })
                .collect(),
        ),
        _ => Column::Numeric(
            values
                .into_iter()
                .filter_map(|v| if let Value::Number(x) = v { Some(x) } else { None })
                .collect(),
        ),
    }
}
