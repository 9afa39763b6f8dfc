//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::core::models::{
    Allocation, CostItem, CostItemLog, DashboardSummary, ForecastResult, Product,
    ProductCostReport, ProductDetail,
};
use crate::error::Result;

/// Output settings shared by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub no_color: bool,
    /// Decimal places for amounts in human and Markdown output.
    pub precision: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            pretty: false,
            no_color: true,
            precision: 2,
        }
    }
}

/// A row that was deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Removed {
    pub entity: &'static str,
    pub id: i64,
}

/// Result of `cache clear`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheCleared {
    pub removed: usize,
}

/// Result of `config init`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigWritten {
    pub path: String,
}

/// Anything a command prints.
///
/// JSON output is the serialized value inside the success envelope; human
/// and Markdown output are per-type.
pub trait Report: Serialize {
    fn human(&self, opts: &RenderOptions) -> String;
    fn markdown(&self, opts: &RenderOptions) -> String;
}

/// Render `report` in the configured format.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn render<T: Report>(report: &T, opts: &RenderOptions) -> Result<String> {
    match opts.format {
        OutputFormat::Human => Ok(report.human(opts)),
        OutputFormat::Json => robot::render_json(report, opts.pretty),
        OutputFormat::Md => Ok(report.markdown(opts)),
    }
}

impl Report for ForecastResult {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_forecast(self, opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_forecast_md(self, opts.precision)
    }
}

impl Report for ProductCostReport {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_cost_report(self, opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_cost_report_md(self, opts.precision)
    }
}

impl Report for ProductDetail {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_product_detail(self, opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_product_detail_md(self, opts.precision)
    }
}

impl Report for DashboardSummary {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_summary(self, opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_summary_md(self, opts.precision)
    }
}

impl Report for CostItem {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_cost_items(std::slice::from_ref(self), opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_cost_items_md(std::slice::from_ref(self), opts.precision)
    }
}

impl Report for Vec<CostItem> {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_cost_items(self, opts)
    }
    fn markdown(&self, opts: &RenderOptions) -> String {
        robot::render_cost_items_md(self, opts.precision)
    }
}

impl Report for Vec<CostItemLog> {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_item_logs(self, opts)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        robot::render_item_logs_md(self)
    }
}

impl Report for Product {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_products(std::slice::from_ref(self), opts)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        robot::render_products_md(std::slice::from_ref(self))
    }
}

impl Report for Vec<Product> {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_products(self, opts)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        robot::render_products_md(self)
    }
}

impl Report for Allocation {
    fn human(&self, opts: &RenderOptions) -> String {
        human::render_allocation(self, opts)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        format!(
            "- allocation {}: product {} <- cost item {} ({} x{})\n",
            self.id, self.product_id, self.cost_item_id, self.allocation_type, self.allocation_value
        )
    }
}

impl Report for Removed {
    fn human(&self, _opts: &RenderOptions) -> String {
        format!("Removed {} {}\n", self.entity, self.id)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        format!("- removed {}: {}\n", self.entity, self.id)
    }
}

impl Report for ConfigWritten {
    fn human(&self, _opts: &RenderOptions) -> String {
        format!("Wrote default config to {}\n", self.path)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        format!("- config_written: {}\n", self.path)
    }
}

impl Report for CacheCleared {
    fn human(&self, _opts: &RenderOptions) -> String {
        let plural = if self.removed == 1 { "y" } else { "ies" };
        format!("Cleared {} cache entr{plural}\n", self.removed)
    }
    fn markdown(&self, _opts: &RenderOptions) -> String {
        format!("- cache_entries_removed: {}\n", self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::CostPeriod;
    use crate::test_utils::make_test_cost_item;
    use crate::{assert_contains, assert_json_valid};

    #[test]
    fn json_output_is_enveloped() {
        let opts = RenderOptions {
            format: OutputFormat::Json,
            ..RenderOptions::default()
        };
        let item = make_test_cost_item(3, "Hosting", 40.0, CostPeriod::Month);
        let out = render(&item, &opts).unwrap();
        assert_json_valid!(&out);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["name"], "Hosting");
    }

    #[test]
    fn cache_cleared_pluralizes() {
        let opts = RenderOptions::default();
        assert_contains!(
            render(&CacheCleared { removed: 1 }, &opts).unwrap(),
            "1 cache entry"
        );
        assert_contains!(
            render(&CacheCleared { removed: 3 }, &opts).unwrap(),
            "3 cache entries"
        );
    }

    #[test]
    fn removed_in_markdown() {
        let opts = RenderOptions {
            format: OutputFormat::Md,
            ..RenderOptions::default()
        };
        let out = render(
            &Removed {
                entity: "allocation",
                id: 9,
            },
            &opts,
        )
        .unwrap();
        assert_eq!(out, "- removed allocation: 9\n");
    }
}
