//! Monthly cost projection.
//!
//! Each future month starts from the mean of the last three historical
//! totals, adds the trend effect, then applies a seasonal factor and a small
//! random variation drawn from a [`Jitter`] source.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::models::{ForecastBucket, MonthlyBucket, TrendFactors};
use crate::core::month::MonthKey;
use crate::error::{CostcalcError, Result};

/// Number of trailing historical months averaged into the base value.
pub const BASE_WINDOW_MONTHS: usize = 3;

/// Lowest per-month confidence.
pub const MIN_MONTH_CONFIDENCE: f64 = 0.5;

/// Source of the multiplicative noise applied to each projected month.
pub trait Jitter {
    /// A multiplier in `[0.95, 1.05]`.
    fn variation(&mut self) -> f64;
}

/// Jitter drawn from a random number generator in whole-percent steps.
#[derive(Debug, Clone)]
pub struct RandomJitter<R> {
    rng: R,
}

impl<R: Rng> RandomJitter<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomJitter<StdRng> {
    /// Reproducible jitter for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Jitter seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> Jitter for RandomJitter<R> {
    fn variation(&mut self) -> f64 {
        f64::from(self.rng.random_range(95_u32..=105)) / 100.0
    }
}

/// Jitter that always returns the same multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl Default for FixedJitter {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Jitter for FixedJitter {
    fn variation(&mut self) -> f64 {
        self.0
    }
}

/// Seasonal adjustment: Q4 runs hot, Q1 runs cold.
#[must_use]
pub const fn seasonal_factor(month: MonthKey) -> f64 {
    match month.month() {
        10..=12 => 1.05,
        1..=3 => 0.95,
        _ => 1.0,
    }
}

/// Confidence for a month `months_ahead` into the future.
///
/// Falls by 0.05 per month and never drops below [`MIN_MONTH_CONFIDENCE`].
#[must_use]
pub fn confidence_for_month(months_ahead: u32) -> f64 {
    (1.0 - f64::from(months_ahead) / 20.0).max(MIN_MONTH_CONFIDENCE)
}

/// Mean of the last [`BASE_WINDOW_MONTHS`] totals.
///
/// # Errors
/// Returns `InsufficientData` for an empty history.
pub fn base_value(history: &[MonthlyBucket]) -> Result<f64> {
    if history.is_empty() {
        return Err(CostcalcError::InsufficientData(
            "no historical months to average".to_string(),
        ));
    }
    let recent = &history[history.len().saturating_sub(BASE_WINDOW_MONTHS)..];
    #[allow(clippy::cast_precision_loss)] // at most three buckets
    let mean = recent.iter().map(|b| b.total).sum::<f64>() / recent.len() as f64;
    Ok(mean)
}

/// Project `months_ahead` months following the last historical month.
///
/// # Errors
/// Returns `InsufficientData` when `history` is empty.
pub fn predict_future_costs(
    history: &[MonthlyBucket],
    trend: &TrendFactors,
    months_ahead: u32,
    jitter: &mut dyn Jitter,
) -> Result<BTreeMap<MonthKey, ForecastBucket>> {
    let base = base_value(history)?;
    let last_month = history
        .last()
        .map(|bucket| bucket.month_key)
        .ok_or_else(|| CostcalcError::InsufficientData("no last month".to_string()))?;

    let mut forecast = BTreeMap::new();
    for i in 1..=months_ahead {
        let step = f64::from(i);
        #[allow(clippy::cast_possible_wrap)] // horizon is at most 24
        let month = last_month.add_months(i as i32);

        let trend_effect = base * trend.coefficient * step;
        let projected =
            ((base + trend_effect) * seasonal_factor(month) * jitter.variation()).max(0.0);

        forecast.insert(
            month,
            ForecastBucket {
                month_key: month,
                label: month.label(),
                forecasted_total: round_cents(projected),
                confidence: confidence_for_month(i),
                timestamp: month.timestamp(),
            },
        );
    }

    tracing::debug!(
        base_value = base,
        coefficient = trend.coefficient,
        months_ahead,
        "Projected future costs"
    );

    Ok(forecast)
}

/// Round to two decimals, halves away from zero.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
