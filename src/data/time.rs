//! data::time — ISO-8601 timestamp coercion and inclusive periods.
//!
//! Purpose
//! -------
//! Turn the string timestamps that callers pass around (column values, period
//! bounds, treatment start dates) into totally ordered `NaiveDateTime`s, and
//! model the inclusive `[start, end]` windows used by the DiD estimator.
//!
//! Key behaviors
//! -------------
//! - [`parse_timestamp`] accepts RFC 3339 (normalized to UTC), date-time with
//!   `T` or space separator (seconds and fractional seconds optional), and
//!   bare dates (interpreted as midnight).
//! - [`Period`] stores validated bounds (`start <= end`) and answers
//!   inclusive membership and overlap queries.
//!
//! Conventions
//! -----------
//! - All timestamps are naive; offsets are folded into UTC at parse time and
//!   then dropped. Comparisons are therefore plain chronological order.
//! - A bare date `YYYY-MM-DD` used as a period end means *midnight* of that
//!   day, not end-of-day, so `("2025-07-01", "2025-07-01")` selects exactly
//!   the rows stamped `2025-07-01 00:00:00`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::data::errors::{DataError, DataResult};

const DATETIME_FORMATS: [&str; 4] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse an ISO-8601 string into a `NaiveDateTime`.
///
/// Parameters
/// ----------
/// - `value`: `&str`
///   Surrounding whitespace is ignored.
///
/// Errors
/// ------
/// - `DataError::InvalidTimestamp` when no accepted layout matches.
///
/// Examples
/// --------
/// ```rust
/// use causal_toolkit::data::time::parse_timestamp;
///
/// let day = parse_timestamp("2025-07-02").unwrap();
/// let noon = parse_timestamp("2025-07-02T12:00:00").unwrap();
/// assert!(day < noon);
/// ```
pub fn parse_timestamp(value: &str) -> DataResult<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(DataError::InvalidTimestamp { value: value.to_string() })
}

/// Period — inclusive time window `[start, end]`.
///
/// Invariants
/// ----------
/// - `start <= end`; enforced by [`Period::new`] and [`Period::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Period {
    /// Build a period from already-parsed bounds.
    ///
    /// # Errors
    /// - `DataError::ReversedPeriod` if `start > end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> DataResult<Self> {
        if start > end {
            return Err(DataError::ReversedPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds with [`parse_timestamp`] and validate their order.
    pub fn parse(start: &str, end: &str) -> DataResult<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Inclusive membership: `start <= t <= end`.
    #[inline]
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// `true` when the two windows share at least one instant.
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
