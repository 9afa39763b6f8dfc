//! Test utilities for costcalc.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use costcalc::test_utils::*;
//!
//! let item = make_test_cost_item(1, "Hosting", 100.0, CostPeriod::Month);
//! let history = make_test_history(MonthKey::new(2025, 1)?, &[100.0, 110.0, 120.0]);
//! let dir = TestDir::new();
//! dir.create_file("config.toml", "[forecast]\ndefault_months = 3");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use crate::core::models::{
    Allocation, AllocationType, CalculationModel, CostItem, CostPeriod, CostRecord, MonthlyBucket,
    Product,
};
use crate::core::month::MonthKey;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Fixed reference instant used by the factories: 2025-03-15 12:00 UTC.
///
/// # Panics
///
/// Never in practice; the date is valid.
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0)
        .single()
        .expect("valid fixed date")
}

/// A UTC instant at noon on the given day.
///
/// # Panics
///
/// Panics if the date is not a calendar date.
#[must_use]
pub fn at_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid calendar date")
}

/// Create a cost item created at [`test_now`].
///
/// # Examples
///
/// ```rust,ignore
/// let item = make_test_cost_item(1, "Hosting", 100.0, CostPeriod::Month);
/// assert_eq!(item.price, 100.0);
/// ```
#[must_use]
pub fn make_test_cost_item(id: i64, name: &str, price: f64, period: CostPeriod) -> CostItem {
    CostItem {
        id,
        name: name.to_string(),
        price,
        period,
        category_id: None,
        created_at: test_now(),
        updated_at: test_now(),
    }
}

/// Create a cost record for forecasting tests.
#[must_use]
pub fn make_test_record(
    id: i64,
    price: f64,
    period: CostPeriod,
    created_at: DateTime<Utc>,
) -> CostRecord {
    CostRecord {
        id,
        price,
        period,
        category_id: None,
        created_at,
    }
}

/// Create a per-user product with no expected user count.
#[must_use]
pub fn make_test_product(id: i64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        calculation_model: CalculationModel::PerUser,
        expected_users: None,
        created_at: test_now(),
    }
}

/// Create an allocation linking a cost item to a product.
#[must_use]
pub const fn make_test_allocation(
    id: i64,
    product_id: i64,
    cost_item_id: i64,
    allocation_type: AllocationType,
    allocation_value: f64,
) -> Allocation {
    Allocation {
        id,
        product_id,
        cost_item_id,
        allocation_type,
        allocation_value,
    }
}

/// Consecutive monthly buckets starting at `start`, one per total.
///
/// # Panics
///
/// Panics if more than `i32::MAX` totals are given.
#[must_use]
pub fn make_test_history(start: MonthKey, totals: &[f64]) -> Vec<MonthlyBucket> {
    totals
        .iter()
        .enumerate()
        .map(|(i, &total)| {
            let offset = i32::try_from(i).expect("history length fits in i32");
            MonthlyBucket::new(start.add_months(offset), total, 1)
        })
        .collect()
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// Creates an isolated directory that is automatically deleted when
/// the `TestDir` is dropped. Uses the `tempfile` crate internally.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file in the temporary directory with the given content.
    ///
    /// Creates parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    /// Get the full path to a file in the temporary directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        // `match` keeps temporaries in `$haystack` alive for the assertion.
        match ($haystack, $needle) {
            (haystack, needle) => assert!(
                haystack.contains(needle),
                "Expected string to contain {:?}\n\nActual string:\n{:?}",
                needle,
                haystack
            ),
        }
    };
    ($haystack:expr, $needle:expr, $($arg:tt)*) => {
        match ($haystack, $needle) {
            (haystack, needle) => assert!(haystack.contains(needle), $($arg)*),
        }
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        match $json {
            json => {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
                    panic!(
                        "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                        e, json
                    );
                }
            }
        }
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        match $text {
            text => assert!(
                !text.contains('\x1b'),
                "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
                text
            ),
        }
    };
}

/// Assert approximate floating point equality.
///
/// # Examples
///
/// ```rust,ignore
/// use costcalc::assert_float_eq;
///
/// assert_float_eq!(450.0, 200.0 + 250.0);
/// assert_float_eq!(67.2, 0.01 * 720.0 + 60.0, 1e-9); // Custom epsilon
/// ```
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = f64::EPSILON * 100.0;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Strip ANSI escape codes from a string.
///
/// Useful for comparing colored table output without formatting.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // Skip until the terminating letter
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Sample config TOML content for testing.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
log_level = "info"

[forecast]
default_months = 3

[calculation]
precision = 3

[cache]
enabled = false
ttl_minutes = 60

[categories]
enabled = false

[output]
format = "json"
color = false
pretty = true
"#
    .to_string()
}

// =============================================================================
// Tests for Test Utilities
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_item_factory_uses_fixed_clock() {
        let item = make_test_cost_item(3, "Hosting", 99.5, CostPeriod::Year);
        assert_eq!(item.id, 3);
        assert_eq!(item.period, CostPeriod::Year);
        assert_eq!(item.created_at, test_now());
        assert_float_eq!(item.to_record().price, 99.5);
    }

    #[test]
    fn history_factory_creates_consecutive_months() {
        let history = make_test_history(MonthKey::new(2024, 11).unwrap(), &[1.0, 2.0, 3.0]);
        let keys: Vec<String> = history.iter().map(|b| b.month_key.to_string()).collect();
        assert_eq!(keys, vec!["2024-11", "2024-12", "2025-01"]);
        assert_float_eq!(history[2].total, 3.0);
    }

    #[test]
    fn test_dir_creates_and_cleans_up() {
        let path: PathBuf;
        {
            let dir = TestDir::new();
            path = dir.path().to_path_buf();
            assert!(path.exists());
            dir.create_file("test.txt", "hello");
            assert!(dir.file_exists("test.txt"));
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_dir_creates_nested_files() {
        let dir = TestDir::new();
        dir.create_file("cache/nested/entry.json", "{}");
        assert_eq!(dir.read_file("cache/nested/entry.json").unwrap(), "{}");
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi_codes("\x1b[31mred\x1b[0m text"), "red text");
    }

    #[test]
    fn macros_work() {
        assert_contains!("Hello, world!", "world");
        assert_json_valid!(r#"{"success": true}"#);
        assert_no_ansi_codes!("plain text");
        assert_float_eq!(0.1 + 0.2, 0.3, 0.001);
    }

    #[test]
    fn config_fixture_mentions_sections() {
        let config = make_test_config_toml();
        assert_contains!(config.as_str(), "[forecast]");
        assert_contains!(config.as_str(), "[categories]");
    }
}
