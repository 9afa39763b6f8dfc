//! Trend analysis over monthly cost totals.
//!
//! Fits an ordinary least-squares line of value against epoch seconds. The
//! reported strength is the slope magnitude scaled by the series maximum, a
//! quick normalization rather than a goodness-of-fit measure.

use crate::core::models::{MonthlyBucket, TrendDirection, TrendFactors};

/// Fit a trend over `(timestamp, value)` pairs.
///
/// Fewer than two points, duplicate timestamps and constant series all
/// produce a stable trend with a zero coefficient.
#[must_use]
pub fn analyze_trend(points: &[(i64, f64)]) -> TrendFactors {
    if points.len() < 2 {
        return TrendFactors::stable();
    }

    let coefficient = if is_flat(points) {
        0.0
    } else {
        regression_slope(points).unwrap_or(0.0)
    };

    let max_value = points
        .iter()
        .map(|&(_, value)| value)
        .fold(f64::NEG_INFINITY, f64::max);
    let strength = (coefficient.abs() / max_value.max(1.0)).min(1.0);

    TrendFactors {
        direction: TrendDirection::from_coefficient(coefficient),
        strength,
        coefficient,
    }
}

/// Fit a trend over historical buckets using their month-start timestamps.
#[must_use]
pub fn analyze_buckets(buckets: &[MonthlyBucket]) -> TrendFactors {
    let points: Vec<(i64, f64)> = buckets.iter().map(|b| (b.timestamp, b.total)).collect();
    analyze_trend(&points)
}

fn is_flat(points: &[(i64, f64)]) -> bool {
    let first = points[0].1;
    points.iter().all(|&(_, value)| (value - first).abs() < f64::EPSILON)
}

/// Least-squares slope in value per second. `None` when all timestamps coincide.
#[allow(clippy::similar_names)]
fn regression_slope(points: &[(i64, f64)]) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)] // point count will never exceed f64 precision
    let n = points.len() as f64;

    // Shifting x leaves the slope unchanged and keeps the sums small.
    let base_time = points[0].0;

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for &(timestamp, y) in points {
        #[allow(clippy::cast_precision_loss)] // offsets of a few years fit within f64 precision
        let x = (timestamp - base_time) as f64;

        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n.mul_add(sum_xx, -(sum_x * sum_x));
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    Some(n.mul_add(sum_xy, -(sum_x * sum_y)) / denominator)
}
