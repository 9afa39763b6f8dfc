//! Calendar month keys.
//!
//! Monthly buckets are keyed by `YYYY-MM`. All month arithmetic is done on
//! `(year, month)` pairs and converted to UTC timestamps only at the edges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CostcalcError, Result};

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Create a month key, rejecting months outside 1..=12.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `month` is not a calendar month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(CostcalcError::invalid(
                "month",
                format!("{month} is not a calendar month"),
            ));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given instant.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The month containing the given epoch timestamp.
    #[must_use]
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::from_datetime)
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1 = January.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Shift by `delta` months (negative moves backwards).
    #[must_use]
    pub const fn add_months(self, delta: i32) -> Self {
        let zero_based = self.year * 12 + self.month as i32 - 1 + delta;
        #[allow(clippy::cast_sign_loss)] // rem_euclid(12) is always in 0..12
        let month = zero_based.rem_euclid(12) as u32 + 1;
        Self {
            year: zero_based.div_euclid(12),
            month,
        }
    }

    /// The month after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        self.add_months(1)
    }

    /// Number of months from `self` to `other` (negative when `other` is earlier).
    #[must_use]
    pub const fn months_until(self, other: Self) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }

    /// Midnight UTC on the first day of the month.
    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map_or(DateTime::UNIX_EPOCH, |naive| naive.and_utc())
    }

    /// Epoch seconds of [`MonthKey::start`].
    #[must_use]
    pub fn timestamp(self) -> i64 {
        self.start().timestamp()
    }

    /// Display label such as `Apr 2025`.
    #[must_use]
    pub fn label(self) -> String {
        self.start().format("%b %Y").to_string()
    }

    /// Every month from `start` through `end` inclusive, in order.
    ///
    /// Empty when `end` is before `start`.
    #[must_use]
    pub fn range_inclusive(start: Self, end: Self) -> Vec<Self> {
        let span = start.months_until(end);
        if span < 0 {
            return Vec::new();
        }
        (0..=span).map(|offset| start.add_months(offset)).collect()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CostcalcError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CostcalcError::invalid("month", format!("expected YYYY-MM, got '{s}'"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CostcalcError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}
