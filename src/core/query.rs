//! Read access to historical cost records, grouped by calendar month.
//!
//! The forecasting engine only sees this trait. The SQLite ledger implements
//! it for the CLI; [`InMemoryRecords`] implements it over a plain vector.

use std::collections::HashMap;

use crate::core::models::{CostPeriod, CostRecord, MonthlyBucket};
use crate::core::month::MonthKey;
use crate::error::Result;

/// Optional filters applied to cost records. Both must match when set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecordFilter {
    pub period: Option<CostPeriod>,
    pub category_id: Option<i64>,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, record: &CostRecord) -> bool {
        self.period.is_none_or(|period| record.period == period)
            && self
                .category_id
                .is_none_or(|category| record.category_id == Some(category))
    }
}

/// Monthly aggregation over stored cost records.
pub trait CostRecordQuery {
    /// One bucket per calendar month in `[start, end]`, oldest first.
    ///
    /// Months without matching records yield `total = 0, count = 0`.
    ///
    /// # Errors
    /// Returns an error if the underlying store cannot be read.
    fn fetch_monthly_totals(
        &self,
        start: MonthKey,
        end: MonthKey,
        filter: &RecordFilter,
    ) -> Result<Vec<MonthlyBucket>>;

    /// Whether records carry category ids that can be filtered on.
    fn supports_categories(&self) -> bool {
        true
    }
}

impl<Q: CostRecordQuery + ?Sized> CostRecordQuery for &Q {
    fn fetch_monthly_totals(
        &self,
        start: MonthKey,
        end: MonthKey,
        filter: &RecordFilter,
    ) -> Result<Vec<MonthlyBucket>> {
        (**self).fetch_monthly_totals(start, end, filter)
    }

    fn supports_categories(&self) -> bool {
        (**self).supports_categories()
    }
}

/// Expand sparse per-month sums into a contiguous bucket list.
#[must_use]
pub fn fill_months(
    start: MonthKey,
    end: MonthKey,
    totals: &HashMap<MonthKey, (f64, u64)>,
) -> Vec<MonthlyBucket> {
    MonthKey::range_inclusive(start, end)
        .into_iter()
        .map(|month| match totals.get(&month) {
            Some(&(total, count)) => MonthlyBucket::new(month, total, count),
            None => MonthlyBucket::empty(month),
        })
        .collect()
}

/// Cost records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecords {
    records: Vec<CostRecord>,
    categories: bool,
}

impl InMemoryRecords {
    #[must_use]
    pub const fn new(records: Vec<CostRecord>) -> Self {
        Self {
            records,
            categories: true,
        }
    }

    /// Toggle category filtering support.
    #[must_use]
    pub const fn with_categories(mut self, enabled: bool) -> Self {
        self.categories = enabled;
        self
    }

    pub fn push(&mut self, record: CostRecord) {
        self.records.push(record);
    }
}

impl CostRecordQuery for InMemoryRecords {
    fn fetch_monthly_totals(
        &self,
        start: MonthKey,
        end: MonthKey,
        filter: &RecordFilter,
    ) -> Result<Vec<MonthlyBucket>> {
        let mut totals: HashMap<MonthKey, (f64, u64)> = HashMap::new();
        for record in self.records.iter().filter(|r| filter.matches(r)) {
            let month = MonthKey::from_datetime(record.created_at);
            if month < start || month > end {
                continue;
            }
            let entry = totals.entry(month).or_insert((0.0, 0));
            entry.0 += record.price;
            entry.1 += 1;
        }
        Ok(fill_months(start, end, &totals))
    }

    fn supports_categories(&self) -> bool {
        self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, price: f64, period: CostPeriod, category: Option<i64>, y: i32, m: u32, d: u32) -> CostRecord {
        CostRecord {
            id,
            price,
            period,
            category_id: category,
            created_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    #[test]
    fn every_month_gets_a_bucket_even_when_empty() {
        let records = InMemoryRecords::default();
        let buckets = records
            .fetch_monthly_totals(month(2024, 4), month(2025, 3), &RecordFilter::default())
            .unwrap();
        assert_eq!(buckets.len(), 12);
        assert!(buckets.iter().all(|b| b.count == 0 && b.total == 0.0));
        assert_eq!(buckets[0].month_key, month(2024, 4));
        assert_eq!(buckets[11].month_key, month(2025, 3));
    }

    #[test]
    fn sums_and_counts_within_month() {
        let records = InMemoryRecords::new(vec![
            record(1, 100.0, CostPeriod::Month, None, 2025, 1, 3),
            record(2, 50.0, CostPeriod::Month, None, 2025, 1, 31),
            record(3, 10.0, CostPeriod::Year, None, 2025, 2, 1),
            record(4, 999.0, CostPeriod::Month, None, 2024, 12, 31),
        ]);
        let buckets = records
            .fetch_monthly_totals(month(2025, 1), month(2025, 3), &RecordFilter::default())
            .unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 2);
        assert!((buckets[0].total - 150.0).abs() < f64::EPSILON);
        assert_eq!(buckets[1].count, 1);
        assert_eq!(buckets[2].count, 0);
    }

    #[test]
    fn filters_are_combined_with_and() {
        let records = InMemoryRecords::new(vec![
            record(1, 100.0, CostPeriod::Month, Some(1), 2025, 1, 3),
            record(2, 50.0, CostPeriod::Month, Some(2), 2025, 1, 4),
            record(3, 25.0, CostPeriod::Year, Some(1), 2025, 1, 5),
        ]);
        let filter = RecordFilter {
            period: Some(CostPeriod::Month),
            category_id: Some(1),
        };
        let buckets = records
            .fetch_monthly_totals(month(2025, 1), month(2025, 1), &filter)
            .unwrap();
        assert_eq!(buckets[0].count, 1);
        assert!((buckets[0].total - 100.0).abs() < f64::EPSILON);
    }
}
