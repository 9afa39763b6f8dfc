//! Number formatting utilities.

/// Format a cost with `precision` decimal places and thousands separators.
#[must_use]
pub fn format_cost(value: f64, precision: usize) -> String {
    let formatted = format!("{:.precision$}", value.abs());
    let (whole, fraction) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), None), |(w, f)| (w, Some(f)));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.00 prints as $0.00
    let sign = if value < 0.0 && formatted.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };

    match fraction {
        Some(fraction) => format!("{sign}${grouped}.{fraction}"),
        None => format!("{sign}${grouped}"),
    }
}

/// Format a 0-100 score as a percentage.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// Format a `[0, 1]` ratio as a percentage.
#[must_use]
pub fn format_ratio(value: f64) -> String {
    format_percent(value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_cost_groups_thousands() {
        assert_eq!(format_cost(1_234_567.891, 2), "$1,234,567.89");
        assert_eq!(format_cost(999.5, 2), "$999.50");
    }

    #[test]
    fn format_cost_respects_precision() {
        assert_eq!(format_cost(12.3456, 3), "$12.346");
        assert_eq!(format_cost(1500.4, 0), "$1,500");
    }

    #[test]
    fn format_cost_negative_and_zero() {
        assert_eq!(format_cost(-42.5, 2), "-$42.50");
        assert_eq!(format_cost(-0.001, 2), "$0.00");
        assert_eq!(format_cost(0.0, 2), "$0.00");
    }

    #[test]
    fn format_ratio_rounds() {
        assert_eq!(format_ratio(0.95), "95%");
        assert_eq!(format_percent(85.0), "85%");
    }
}
