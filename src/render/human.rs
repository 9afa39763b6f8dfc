//! Human-readable output using colored.
//!
//! Renders forecasts, product costs and ledger listings as aligned plain
//! text, colored unless `--no-color` (or `NO_COLOR`) is in effect.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};

use super::RenderOptions;
use crate::core::models::{
    Allocation, AllocationCost, CostItem, CostItemLog, DashboardSummary, ForecastResult, Product,
    ProductCostReport, ProductDetail, TrendDirection,
};
use crate::util::format::{format_cost, format_percent, format_ratio};

const NAME_WIDTH: usize = 28;

/// Apply `style` unless color is disabled.
fn paint(text: &str, no_color: bool, style: impl FnOnce(&str) -> ColoredString) -> String {
    if no_color {
        text.to_string()
    } else {
        style(text).to_string()
    }
}

fn heading(text: &str, no_color: bool) -> String {
    paint(text, no_color, |t| t.bold().cyan())
}

fn dim(text: &str, no_color: bool) -> String {
    paint(text, no_color, |t| t.dimmed())
}

/// Confidence colored by how much it can be trusted.
fn confidence_text(level: u8, no_color: bool) -> String {
    let text = format_percent(f64::from(level));
    match level {
        70.. => paint(&text, no_color, |t| t.green()),
        40..=69 => paint(&text, no_color, |t| t.yellow()),
        _ => paint(&text, no_color, |t| t.red()),
    }
}

fn trend_text(direction: TrendDirection, no_color: bool) -> String {
    let label = direction.as_str();
    match direction {
        TrendDirection::Increasing => paint(label, no_color, |t| t.red()),
        TrendDirection::Decreasing => paint(label, no_color, |t| t.green()),
        TrendDirection::Stable => label.to_string(),
    }
}

fn truncate(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        name.to_string()
    } else {
        let cut: String = name.chars().take(NAME_WIDTH - 1).collect();
        format!("{cut}…")
    }
}

/// Render a forecast with its history.
pub fn render_forecast(result: &ForecastResult, opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    let meta = &result.metadata;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("Cost forecast ({} months)", meta.forecast_months),
            nc
        )
    );
    let _ = writeln!(
        out,
        "Confidence: {}  Trend: {} (strength {:.2})",
        confidence_text(meta.confidence_level, nc),
        trend_text(meta.trend_direction, nc),
        meta.trend_strength
    );

    out.push('\n');
    let _ = writeln!(out, "{}", heading("History", nc));
    if result.historical.is_empty() {
        let _ = writeln!(out, "  {}", dim("No cost items recorded", nc));
    }
    for bucket in result.historical.values() {
        let items = if bucket.count == 1 { "item" } else { "items" };
        let _ = writeln!(
            out,
            "  {:<9} {:>14}  {}",
            bucket.label,
            format_cost(bucket.total, opts.precision),
            dim(&format!("{} {items}", bucket.count), nc)
        );
    }

    out.push('\n');
    let _ = writeln!(out, "{}", heading("Forecast", nc));
    for bucket in result.forecast.values() {
        let _ = writeln!(
            out,
            "  {:<9} {:>14}  {}",
            bucket.label,
            paint(&format_cost(bucket.forecasted_total, opts.precision), nc, |t| t.bold()),
            dim(&format!("{} confidence", format_ratio(bucket.confidence)), nc)
        );
    }

    out
}

fn allocation_lines(out: &mut String, allocations: &[AllocationCost], opts: &RenderOptions) {
    if allocations.is_empty() {
        let _ = writeln!(out, "  {}", dim("No allocations", opts.no_color));
        return;
    }
    for allocation in allocations {
        let _ = writeln!(
            out,
            "  #{:<4} {:<NAME_WIDTH$} {:<18} x{:<8} {:>12}",
            allocation.id,
            truncate(&allocation.cost_item_name),
            allocation.allocation_type.as_str(),
            allocation.allocation_value,
            format_cost(allocation.cost, opts.precision)
        );
    }
}

fn parameter_line(user_count: Option<u32>, resource_units: Option<u32>) -> String {
    format!(
        "Users: {}  Resource units: {}",
        user_count.unwrap_or(1),
        resource_units.unwrap_or(1)
    )
}

/// Render the result of `calculate`.
pub fn render_cost_report(report: &ProductCostReport, opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        heading(&report.product, nc),
        dim(&format!("({})", report.calculation_model), nc)
    );
    let _ = writeln!(
        out,
        "{}",
        parameter_line(report.parameters.user_count, report.parameters.resource_units)
    );
    out.push('\n');
    allocation_lines(&mut out, &report.allocations, opts);
    out.push('\n');
    let _ = writeln!(
        out,
        "Total: {}",
        paint(&format_cost(report.total_cost, opts.precision), nc, |t| t.bold())
    );
    out
}

/// Render `product show`.
pub fn render_product_detail(detail: &ProductDetail, opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    let product = &detail.product;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        heading(&format!("#{} {}", product.id, product.name), nc),
        dim(&format!("({})", product.calculation_model), nc)
    );
    if let Some(users) = product.expected_users {
        let _ = writeln!(out, "Expected users: {users}");
    }
    let _ = writeln!(
        out,
        "{}",
        parameter_line(detail.parameters.user_count, detail.parameters.resource_units)
    );
    out.push('\n');
    allocation_lines(&mut out, &detail.allocations, opts);
    out.push('\n');
    let _ = writeln!(out, "Total:   {}", format_cost(detail.total_cost, opts.precision));
    let _ = writeln!(
        out,
        "Monthly: {}",
        paint(&format_cost(detail.monthly_total_cost, opts.precision), nc, |t| t.bold())
    );
    let _ = writeln!(
        out,
        "Yearly:  {}",
        format_cost(detail.yearly_total_cost, opts.precision)
    );
    out
}

/// Render the dashboard summary.
pub fn render_summary(summary: &DashboardSummary, opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    let mut out = String::new();

    let _ = writeln!(out, "{}", heading("Cost summary", nc));
    let _ = writeln!(
        out,
        "Cost items: {}  Products: {}",
        summary.cost_item_count, summary.product_count
    );
    let _ = writeln!(
        out,
        "Total of listed prices: {}",
        paint(&format_cost(summary.total_costs, opts.precision), nc, |t| t.bold())
    );

    if !summary.costs_by_period.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "{}", heading("By billing period", nc));
        for period in &summary.costs_by_period {
            let _ = writeln!(
                out,
                "  {:<8} {:>14}  {}",
                period.period.as_str(),
                format_cost(period.total, opts.precision),
                dim(&format!("{} items", period.count), nc)
            );
        }
    }

    if !summary.top_products.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "{}", heading("Top products", nc));
        for product in &summary.top_products {
            let _ = writeln!(
                out,
                "  #{:<4} {:<NAME_WIDTH$} {:>14}",
                product.id,
                truncate(&product.name),
                format_cost(product.total_cost, opts.precision)
            );
        }
    }

    out
}

/// Render cost items as a table.
pub fn render_cost_items(items: &[CostItem], opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    if items.is_empty() {
        return format!("{}\n", dim("No cost items", nc));
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!(
                "{:<6} {:<NAME_WIDTH$} {:>14} {:<7} {:<9} {}",
                "ID", "NAME", "PRICE", "PERIOD", "CATEGORY", "CREATED"
            ),
            nc
        )
    );
    for item in items {
        let category = item
            .category_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let _ = writeln!(
            out,
            "{:<6} {:<NAME_WIDTH$} {:>14} {:<7} {:<9} {}",
            item.id,
            truncate(&item.name),
            format_cost(item.price, opts.precision),
            item.period.as_str(),
            category,
            dim(&item.created_at.format("%Y-%m-%d").to_string(), nc)
        );
    }
    out
}

/// Render a cost item's change log, oldest first.
pub fn render_item_logs(logs: &[CostItemLog], opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    if logs.is_empty() {
        return format!("{}\n", dim("No changes recorded", nc));
    }

    let mut out = String::new();
    for log in logs {
        let action = match log.action.as_str() {
            "created" => paint(&log.action, nc, |t| t.green()),
            "deleted" => paint(&log.action, nc, |t| t.red()),
            _ => paint(&log.action, nc, |t| t.yellow()),
        };
        let _ = writeln!(
            out,
            "{} {:<8} item #{}",
            dim(&log.created_at.format("%Y-%m-%d %H:%M:%S").to_string(), nc),
            action,
            log.cost_item_id
        );
        if let Some(old) = &log.old_value {
            let _ = writeln!(out, "    old: {old}");
        }
        if let Some(new) = &log.new_value {
            let _ = writeln!(out, "    new: {new}");
        }
    }
    out
}

/// Render products as a table.
pub fn render_products(products: &[Product], opts: &RenderOptions) -> String {
    let nc = opts.no_color;
    if products.is_empty() {
        return format!("{}\n", dim("No products", nc));
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("{:<6} {:<NAME_WIDTH$} {:<13} {}", "ID", "NAME", "MODEL", "USERS"),
            nc
        )
    );
    for product in products {
        let users = product
            .expected_users
            .map_or_else(|| "-".to_string(), |u| u.to_string());
        let _ = writeln!(
            out,
            "{:<6} {:<NAME_WIDTH$} {:<13} {}",
            product.id,
            truncate(&product.name),
            product.calculation_model.as_str(),
            users
        );
    }
    out
}

pub fn render_allocation(allocation: &Allocation, opts: &RenderOptions) -> String {
    format!(
        "{} product #{} <- cost item #{} ({} x{})\n",
        paint(&format!("Allocation #{}:", allocation.id), opts.no_color, |t| t.bold()),
        allocation.product_id,
        allocation.cost_item_id,
        allocation.allocation_type,
        allocation.allocation_value
    )
}
