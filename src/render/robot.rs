//! Robot-mode output (JSON and Markdown).
//!
//! JSON wraps every payload in `{"success": true, "data": ...}`. Markdown is
//! compact and stable for pasting into tickets or feeding to agents.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::models::{
    AllocationCost, CostItem, CostItemLog, DashboardSummary, Envelope, ForecastResult, Product,
    ProductCostReport, ProductDetail,
};
use crate::error::Result;

/// Render `data` inside the success envelope.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize + ?Sized>(data: &T, pretty: bool) -> Result<String> {
    let envelope = Envelope::ok(data);
    let json = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    Ok(json)
}

fn amount(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Render a forecast as Markdown.
#[must_use]
pub fn render_forecast_md(result: &ForecastResult, precision: usize) -> String {
    let meta = &result.metadata;
    let mut out = String::new();

    out.push_str("## Cost Forecast\n\n");
    let _ = writeln!(out, "- confidence_level: {}", meta.confidence_level);
    let _ = writeln!(out, "- trend_direction: {}", meta.trend_direction);
    let _ = writeln!(out, "- trend_strength: {:.4}", meta.trend_strength);
    let _ = writeln!(out, "- forecast_months: {}", meta.forecast_months);

    out.push_str("\n### History\n");
    out.push_str("| month | total | items |\n");
    out.push_str("|-------|-------|-------|\n");
    for bucket in result.historical.values() {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            bucket.month_key,
            amount(bucket.total, precision),
            bucket.count
        );
    }

    out.push_str("\n### Forecast\n");
    out.push_str("| month | forecasted_total | confidence |\n");
    out.push_str("|-------|------------------|------------|\n");
    for bucket in result.forecast.values() {
        let _ = writeln!(
            out,
            "| {} | {} | {:.2} |",
            bucket.month_key,
            amount(bucket.forecasted_total, precision),
            bucket.confidence
        );
    }

    out
}

fn allocation_table(out: &mut String, allocations: &[AllocationCost], precision: usize) {
    out.push_str("| id | cost_item | type | value | cost |\n");
    out.push_str("|----|-----------|------|-------|------|\n");
    for allocation in allocations {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            allocation.id,
            escape_cell(&allocation.cost_item_name),
            allocation.allocation_type,
            allocation.allocation_value,
            amount(allocation.cost, precision)
        );
    }
}

/// Render a product cost calculation as Markdown.
#[must_use]
pub fn render_cost_report_md(report: &ProductCostReport, precision: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {} ({})\n", report.product, report.calculation_model);
    let _ = writeln!(out, "- user_count: {}", report.parameters.users());
    let _ = writeln!(out, "- resource_units: {}", report.parameters.units());
    let _ = writeln!(out, "- total_cost: {}\n", amount(report.total_cost, precision));
    allocation_table(&mut out, &report.allocations, precision);
    out
}

/// Render a product detail view as Markdown.
#[must_use]
pub fn render_product_detail_md(detail: &ProductDetail, precision: usize) -> String {
    let mut out = String::new();
    let product = &detail.product;
    let _ = writeln!(
        out,
        "## {} (#{}, {})\n",
        product.name, product.id, product.calculation_model
    );
    let _ = writeln!(out, "- user_count: {}", detail.parameters.users());
    let _ = writeln!(out, "- resource_units: {}", detail.parameters.units());
    let _ = writeln!(out, "- total_cost: {}", amount(detail.total_cost, precision));
    let _ = writeln!(
        out,
        "- monthly_total_cost: {}",
        amount(detail.monthly_total_cost, precision)
    );
    let _ = writeln!(
        out,
        "- yearly_total_cost: {}\n",
        amount(detail.yearly_total_cost, precision)
    );
    allocation_table(&mut out, &detail.allocations, precision);
    out
}

/// Render the dashboard summary as Markdown.
#[must_use]
pub fn render_summary_md(summary: &DashboardSummary, precision: usize) -> String {
    let mut out = String::new();
    out.push_str("## Cost Summary\n\n");
    let _ = writeln!(out, "- cost_item_count: {}", summary.cost_item_count);
    let _ = writeln!(out, "- product_count: {}", summary.product_count);
    let _ = writeln!(out, "- total_costs: {}", amount(summary.total_costs, precision));

    if !summary.costs_by_period.is_empty() {
        out.push_str("\n### By Period\n");
        out.push_str("| period | total | count |\n");
        out.push_str("|--------|-------|-------|\n");
        for period in &summary.costs_by_period {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                period.period,
                amount(period.total, precision),
                period.count
            );
        }
    }

    if !summary.top_products.is_empty() {
        out.push_str("\n### Top Products\n");
        out.push_str("| id | name | total_cost |\n");
        out.push_str("|----|------|------------|\n");
        for product in &summary.top_products {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                product.id,
                escape_cell(&product.name),
                amount(product.total_cost, precision)
            );
        }
    }

    out
}

/// Render cost items as a Markdown table.
#[must_use]
pub fn render_cost_items_md(items: &[CostItem], precision: usize) -> String {
    let mut out = String::new();
    out.push_str("| id | name | price | period | category_id | created_at |\n");
    out.push_str("|----|------|-------|--------|-------------|------------|\n");
    for item in items {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            item.id,
            escape_cell(&item.name),
            amount(item.price, precision),
            item.period,
            item.category_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            item.created_at.to_rfc3339()
        );
    }
    out
}

/// Render a change log as a Markdown list.
#[must_use]
pub fn render_item_logs_md(logs: &[CostItemLog]) -> String {
    let mut out = String::new();
    for log in logs {
        let _ = writeln!(
            out,
            "- {} {} item {}",
            log.created_at.to_rfc3339(),
            log.action,
            log.cost_item_id
        );
    }
    out
}

/// Render products as a Markdown table.
#[must_use]
pub fn render_products_md(products: &[Product]) -> String {
    let mut out = String::new();
    out.push_str("| id | name | calculation_model | expected_users |\n");
    out.push_str("|----|------|-------------------|----------------|\n");
    for product in products {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            product.id,
            escape_cell(&product.name),
            product.calculation_model,
            product
                .expected_users
                .map_or_else(|| "-".to_string(), |u| u.to_string())
        );
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CostPeriod, PeriodTotal, ProductTotal};
    use crate::test_utils::{make_test_cost_item, make_test_product};
    use crate::{assert_contains, assert_json_valid};

    #[test]
    fn json_envelope_wraps_lists() {
        let items = vec![make_test_cost_item(1, "Hosting", 10.0, CostPeriod::Month)];
        let out = render_json(&items, false).unwrap();
        assert_json_valid!(&out);
        assert!(out.starts_with(r#"{"success":true,"data":[{"id":1"#));
    }

    #[test]
    fn pretty_json_is_multiline() {
        let out = render_json(&make_test_product(2, "Api"), true).unwrap();
        assert!(out.contains('\n'));
        assert_contains!(out.as_str(), "\"calculation_model\": \"per_user\"");
    }

    #[test]
    fn summary_markdown_has_sections() {
        let summary = DashboardSummary {
            cost_item_count: 3,
            product_count: 1,
            total_costs: 160.0,
            costs_by_period: vec![PeriodTotal {
                period: CostPeriod::Month,
                total: 160.0,
                count: 3,
            }],
            top_products: vec![ProductTotal {
                id: 1,
                name: "Api | Edge".to_string(),
                total_cost: 80.0,
            }],
        };
        let out = render_summary_md(&summary, 2);
        assert_contains!(out.as_str(), "- total_costs: 160.00");
        assert_contains!(out.as_str(), "| month | 160.00 | 3 |");
        assert_contains!(out.as_str(), "Api \\| Edge");
    }

    #[test]
    fn cost_items_markdown_respects_precision() {
        let items = vec![make_test_cost_item(7, "Backups", 4.5678, CostPeriod::Day)];
        let out = render_cost_items_md(&items, 3);
        assert_contains!(out.as_str(), "| 7 | Backups | 4.568 | day | - |");
    }
}
