//! Date argument parsing.

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::month::MonthKey;
use crate::error::{CostcalcError, Result};

/// Parse a `YYYY-MM-DD` date (taken as midnight UTC) or an RFC 3339
/// timestamp.
///
/// # Errors
/// Returns `InvalidParameter` naming `name` when neither form parses.
pub fn parse_date_arg(name: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            CostcalcError::invalid(name, format!("'{value}' is not a YYYY-MM-DD or RFC 3339 date"))
        })
}

/// As-of instant for a forecast: the start of a `YYYY-MM` month, any date
/// accepted by [`parse_date_arg`], or now when absent.
///
/// # Errors
/// Returns `InvalidParameter` if the value is neither a month nor a date.
pub fn resolve_as_of(value: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(value) = value else {
        return Ok(Utc::now());
    };
    match value.trim().parse::<MonthKey>() {
        Ok(month) => Ok(month.start()),
        Err(_) => parse_date_arg("as_of", value),
    }
}
