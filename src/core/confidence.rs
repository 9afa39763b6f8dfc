//! Overall confidence score for a forecast run.

use crate::core::models::MonthlyBucket;

/// Months of history needed for full data-volume credit.
const FULL_HISTORY_MONTHS: f64 = 12.0;

const DATA_WEIGHT: f64 = 0.7;
const VARIATION_WEIGHT: f64 = 0.3;

/// Score forecast reliability from history volume and variability, 0-100.
///
/// Twelve or more months give full volume credit. Variability is the
/// coefficient of variation halved; a series with a non-positive mean gets a
/// neutral 0.5. Highly volatile series can push the raw score below zero,
/// which clamps to 0.
#[must_use]
pub fn confidence_level(history: &[MonthlyBucket]) -> u8 {
    if history.is_empty() {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)] // bucket counts are tiny
    let n = history.len() as f64;
    let data_points = (n / FULL_HISTORY_MONTHS).min(1.0);

    let mean = history.iter().map(|b| b.total).sum::<f64>() / n;
    let variance = history
        .iter()
        .map(|b| (b.total - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    let variation = if mean > 0.0 {
        (1.0 - (std_dev / mean) / 2.0).min(1.0)
    } else {
        0.5
    };

    let score = data_points.mul_add(DATA_WEIGHT, variation * VARIATION_WEIGHT);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=100
    let level = (score * 100.0).round().clamp(0.0, 100.0) as u8;
    level
}
