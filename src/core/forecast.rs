//! Forecast orchestration.
//!
//! [`ForecastEngine`] pulls twelve months of history ending at the request's
//! as-of month, fits a trend, projects the requested horizon and scores the
//! run. It holds no state between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::confidence::confidence_level;
use crate::core::models::{
    CostPeriod, ForecastBucket, ForecastMetadata, ForecastResult, MonthlyBucket,
};
use crate::core::month::MonthKey;
use crate::core::predictor::{Jitter, confidence_for_month, predict_future_costs};
use crate::core::query::{CostRecordQuery, RecordFilter};
use crate::core::trend::analyze_buckets;
use crate::error::{CostcalcError, Result};

/// Months of history fed to the trend fit.
pub const HISTORY_MONTHS: i32 = 12;

/// Allowed forecast horizon.
pub const MIN_FORECAST_MONTHS: u32 = 1;
pub const MAX_FORECAST_MONTHS: u32 = 24;

/// A validated forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastRequest {
    months_ahead: u32,
    as_of: MonthKey,
    filter: RecordFilter,
}

impl ForecastRequest {
    /// Build a request for `months_ahead` months after the month containing `as_of`.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `months_ahead` is outside 1..=24.
    pub fn new(months_ahead: i64, as_of: DateTime<Utc>) -> Result<Self> {
        let months_ahead = u32::try_from(months_ahead)
            .ok()
            .filter(|m| (MIN_FORECAST_MONTHS..=MAX_FORECAST_MONTHS).contains(m))
            .ok_or_else(|| {
                CostcalcError::invalid(
                    "months",
                    format!(
                        "must be between {MIN_FORECAST_MONTHS} and {MAX_FORECAST_MONTHS}, got {months_ahead}"
                    ),
                )
            })?;

        Ok(Self {
            months_ahead,
            as_of: MonthKey::from_datetime(as_of),
            filter: RecordFilter::default(),
        })
    }

    #[must_use]
    pub const fn with_period(mut self, period: Option<CostPeriod>) -> Self {
        self.filter.period = period;
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category_id: Option<i64>) -> Self {
        self.filter.category_id = category_id;
        self
    }

    #[must_use]
    pub const fn months_ahead(&self) -> u32 {
        self.months_ahead
    }

    #[must_use]
    pub const fn as_of(&self) -> MonthKey {
        self.as_of
    }

    #[must_use]
    pub const fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// First and last month of the history window.
    #[must_use]
    pub const fn history_window(&self) -> (MonthKey, MonthKey) {
        (self.as_of.add_months(1 - HISTORY_MONTHS), self.as_of)
    }
}

/// Runs forecasts against a [`CostRecordQuery`].
#[derive(Debug, Clone)]
pub struct ForecastEngine<Q> {
    query: Q,
}

impl<Q: CostRecordQuery> ForecastEngine<Q> {
    pub const fn new(query: Q) -> Self {
        Self { query }
    }

    /// The underlying record source.
    pub const fn query(&self) -> &Q {
        &self.query
    }

    /// Generate a forecast for `request`.
    ///
    /// An empty history does not fail: the result carries zero-valued
    /// forecast months after the as-of month and a confidence level of 0.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when a category filter is given but the
    /// record source has no categories, or any error from the record source.
    pub fn generate_cost_forecast(
        &self,
        request: &ForecastRequest,
        jitter: &mut dyn Jitter,
    ) -> Result<ForecastResult> {
        if request.filter.category_id.is_some() && !self.query.supports_categories() {
            return Err(CostcalcError::invalid(
                "category_id",
                "category filtering is not available",
            ));
        }

        let (start, end) = request.history_window();
        let history = self
            .query
            .fetch_monthly_totals(start, end, &request.filter)?;

        tracing::debug!(
            start = %start,
            end = %end,
            buckets = history.len(),
            period = ?request.filter.period,
            category_id = ?request.filter.category_id,
            "Fetched forecast history"
        );

        let trend = analyze_buckets(&history);
        let forecast = match predict_future_costs(&history, &trend, request.months_ahead, jitter) {
            Ok(forecast) => forecast,
            Err(CostcalcError::InsufficientData(reason)) => {
                tracing::warn!(%reason, "No history available, emitting empty forecast");
                empty_forecast(request.as_of, request.months_ahead)
            }
            Err(e) => return Err(e),
        };

        let metadata = ForecastMetadata {
            confidence_level: confidence_level(&history),
            trend_direction: trend.direction,
            trend_strength: trend.strength,
            forecast_months: request.months_ahead,
        };

        tracing::debug!(
            direction = %trend.direction,
            coefficient = trend.coefficient,
            confidence = metadata.confidence_level,
            "Forecast complete"
        );

        Ok(ForecastResult {
            historical: into_ordered(history),
            forecast,
            metadata,
        })
    }
}

fn into_ordered(history: Vec<MonthlyBucket>) -> BTreeMap<MonthKey, MonthlyBucket> {
    history
        .into_iter()
        .map(|bucket| (bucket.month_key, bucket))
        .collect()
}

fn empty_forecast(as_of: MonthKey, months_ahead: u32) -> BTreeMap<MonthKey, ForecastBucket> {
    (1..=months_ahead)
        .map(|i| {
            #[allow(clippy::cast_possible_wrap)] // horizon is at most 24
            let month = as_of.add_months(i as i32);
            (
                month,
                ForecastBucket {
                    month_key: month,
                    label: month.label(),
                    forecasted_total: 0.0,
                    confidence: confidence_for_month(i),
                    timestamp: month.timestamp(),
                },
            )
        })
        .collect()
}
