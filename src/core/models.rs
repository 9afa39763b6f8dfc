//! Core data models.
//!
//! Entities read from the ledger (cost items, products, allocations) and the
//! derived forecast structures. JSON field names here are part of the output
//! contract consumed by dashboards and scripts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::month::MonthKey;
use crate::error::{CostcalcError, Result};

// =============================================================================
// Billing periods and allocation kinds
// =============================================================================

/// Billing period of a cost item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPeriod {
    Minute,
    Hour,
    Day,
    Month,
    Year,
    /// A stored period this version does not know about.
    #[serde(other)]
    Unknown,
}

impl CostPeriod {
    /// Periods accepted when creating cost items.
    pub const ALL: &'static [Self] = &[Self::Minute, Self::Hour, Self::Day, Self::Month, Self::Year];

    /// Stable storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored value; anything unrecognised becomes [`CostPeriod::Unknown`].
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        Self::from_arg(value).unwrap_or(Self::Unknown)
    }

    /// Parse user input, accepting the adjective forms (`monthly`, `yearly`, ...).
    #[must_use]
    pub fn from_arg(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "minute" | "minutely" => Some(Self::Minute),
            "hour" | "hourly" => Some(Self::Hour),
            "day" | "daily" => Some(Self::Day),
            "month" | "monthly" => Some(Self::Month),
            "year" | "yearly" | "annual" => Some(Self::Year),
            _ => None,
        }
    }

    /// Parse user input or fail with `InvalidParameter`.
    ///
    /// # Errors
    /// Returns an error when the value is not a known period.
    pub fn parse_arg(value: &str) -> Result<Self> {
        Self::from_arg(value).ok_or_else(|| {
            CostcalcError::invalid(
                "period",
                format!("'{value}' is not one of minute, hour, day, month, year"),
            )
        })
    }

    /// Convert a price billed per this period to its monthly equivalent.
    ///
    /// Uses 30-day months. Unknown periods keep the price as-is.
    #[must_use]
    pub fn to_monthly(self, price: f64) -> f64 {
        match self {
            Self::Minute => price * 43_200.0,
            Self::Hour => price * 720.0,
            Self::Day => price * 30.0,
            Self::Year => price / 12.0,
            Self::Month | Self::Unknown => price,
        }
    }
}

impl fmt::Display for CostPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a cost item's price is charged to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationType {
    /// Price times the allocation value.
    Fixed,
    /// Price times value times the number of users.
    PerUser,
    /// Price times value times the number of resource units.
    PerResourceUnit,
    /// A stored type this version does not know about.
    #[serde(other)]
    Unknown,
}

impl AllocationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::PerUser => "per_user",
            Self::PerResourceUnit => "per_resource_unit",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored value; anything unrecognised becomes [`AllocationType::Unknown`].
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        Self::from_arg(value).unwrap_or(Self::Unknown)
    }

    #[must_use]
    pub fn from_arg(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "fixed" => Some(Self::Fixed),
            "per_user" => Some(Self::PerUser),
            "per_resource_unit" | "per_resource" => Some(Self::PerResourceUnit),
            _ => None,
        }
    }

    /// # Errors
    /// Returns an error when the value is not a known allocation type.
    pub fn parse_arg(value: &str) -> Result<Self> {
        Self::from_arg(value).ok_or_else(|| {
            CostcalcError::invalid(
                "allocation_type",
                format!("'{value}' is not one of fixed, per_user, per_resource_unit"),
            )
        })
    }
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing model recorded on a product. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationModel {
    PerUser,
    PerResource,
    FixedPrice,
}

impl CalculationModel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerUser => "per_user",
            Self::PerResource => "per_resource",
            Self::FixedPrice => "fixed_price",
        }
    }

    /// # Errors
    /// Returns an error when the value is not a known calculation model.
    pub fn parse_arg(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "per_user" => Ok(Self::PerUser),
            "per_resource" => Ok(Self::PerResource),
            "fixed_price" | "fixed" => Ok(Self::FixedPrice),
            _ => Err(CostcalcError::invalid(
                "calculation_model",
                format!("'{value}' is not one of per_user, per_resource, fixed_price"),
            )),
        }
    }
}

impl fmt::Display for CalculationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Ledger entities
// =============================================================================

/// A historical cost record as seen by the forecasting engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: i64,
    pub price: f64,
    pub period: CostPeriod,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A priced, recurring expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub period: CostPeriod,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CostItem {
    /// The forecasting view of this item.
    #[must_use]
    pub fn to_record(&self) -> CostRecord {
        CostRecord {
            id: self.id,
            price: self.price,
            period: self.period,
            category_id: self.category_id,
            created_at: self.created_at,
        }
    }
}

/// A product that cost items are allocated to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub calculation_model: CalculationModel,
    /// Default user count for per-allocation breakdowns.
    pub expected_users: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// A weighting rule linking a cost item to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub product_id: i64,
    pub cost_item_id: i64,
    pub allocation_type: AllocationType,
    pub allocation_value: f64,
}

/// An allocation together with its cost item, if the item still exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAllocation {
    pub allocation: Allocation,
    pub cost_item: Option<CostItem>,
}

/// One entry of a cost item's change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItemLog {
    pub id: i64,
    pub cost_item_id: i64,
    pub action: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Runtime parameters for allocation cost calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_units: Option<u32>,
}

impl CalculationParams {
    /// Validate raw parameters. Absent values default to 1 at calculation time.
    ///
    /// # Errors
    /// Returns `InvalidParameter` if either value is present but below 1.
    pub fn new(user_count: Option<i64>, resource_units: Option<i64>) -> Result<Self> {
        Ok(Self {
            user_count: user_count
                .map(|v| positive_count("user_count", v))
                .transpose()?,
            resource_units: resource_units
                .map(|v| positive_count("resource_units", v))
                .transpose()?,
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user_count.is_none() && self.resource_units.is_none()
    }

    /// User count with the default of one applied.
    #[must_use]
    pub fn users(&self) -> u32 {
        self.user_count.unwrap_or(1)
    }

    /// Resource units with the default of one applied.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.resource_units.unwrap_or(1)
    }
}

fn positive_count(name: &str, value: i64) -> Result<u32> {
    if value < 1 {
        return Err(CostcalcError::invalid(name, format!("must be at least 1, got {value}")));
    }
    u32::try_from(value).map_err(|_| CostcalcError::invalid(name, format!("{value} is too large")))
}

// =============================================================================
// Forecast structures
// =============================================================================

/// Aggregated cost records for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month_key: MonthKey,
    pub label: String,
    pub total: f64,
    pub count: u64,
    /// Epoch seconds of the month start.
    pub timestamp: i64,
}

impl MonthlyBucket {
    /// A bucket with the given totals, labelled and stamped from `month`.
    #[must_use]
    pub fn new(month: MonthKey, total: f64, count: u64) -> Self {
        Self {
            month_key: month,
            label: month.label(),
            total,
            count,
            timestamp: month.timestamp(),
        }
    }

    /// A month with no matching records.
    #[must_use]
    pub fn empty(month: MonthKey) -> Self {
        Self::new(month, 0.0, 0)
    }
}

/// Direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// Direction implied by the sign of a regression slope.
    #[must_use]
    pub fn from_coefficient(coefficient: f64) -> Self {
        if coefficient > 0.0 {
            Self::Increasing
        } else if coefficient < 0.0 {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear trend fitted over a monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendFactors {
    pub direction: TrendDirection,
    /// Normalized slope magnitude in `[0, 1]`. Not R².
    pub strength: f64,
    /// Slope of value against epoch seconds.
    pub coefficient: f64,
}

impl TrendFactors {
    /// No detectable trend.
    #[must_use]
    pub const fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            strength: 0.0,
            coefficient: 0.0,
        }
    }
}

/// Projected cost for one future month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBucket {
    pub month_key: MonthKey,
    pub label: String,
    pub forecasted_total: f64,
    /// Per-month confidence in `[0.5, 1.0]`.
    pub confidence: f64,
    pub timestamp: i64,
}

/// Summary attached to a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    /// Overall confidence score, 0-100.
    pub confidence_level: u8,
    pub trend_direction: TrendDirection,
    pub trend_strength: f64,
    pub forecast_months: u32,
}

/// Historical buckets, projected buckets and run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub historical: BTreeMap<MonthKey, MonthlyBucket>,
    pub forecast: BTreeMap<MonthKey, ForecastBucket>,
    pub metadata: ForecastMetadata,
}

// =============================================================================
// Product cost output
// =============================================================================

/// Cost of a single allocation within a product calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationCost {
    pub id: i64,
    pub cost_item_name: String,
    pub allocation_type: AllocationType,
    pub allocation_value: f64,
    pub cost: f64,
}

/// Result of calculating a product's total cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostReport {
    pub product: String,
    pub calculation_model: CalculationModel,
    pub parameters: CalculationParams,
    pub total_cost: f64,
    pub allocations: Vec<AllocationCost>,
}

/// Product totals normalized across billing periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub parameters: CalculationParams,
    pub total_cost: f64,
    pub monthly_total_cost: f64,
    pub yearly_total_cost: f64,
    pub allocations: Vec<AllocationCost>,
}

// =============================================================================
// Dashboard summary
// =============================================================================

/// Sum of cost item prices for one billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period: CostPeriod,
    pub total: f64,
    pub count: u64,
}

/// A product ranked by cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTotal {
    pub id: i64,
    pub name: String,
    pub total_cost: f64,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub cost_item_count: u64,
    pub product_count: u64,
    pub total_costs: f64,
    pub costs_by_period: Vec<PeriodTotal>,
    pub top_products: Vec<ProductTotal>,
}

// =============================================================================
// Output envelope
// =============================================================================

/// JSON envelope wrapping every successful machine-readable response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap a successful result.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_monthly_normalization() {
        assert!((CostPeriod::Minute.to_monthly(1.0) - 43_200.0).abs() < f64::EPSILON);
        assert!((CostPeriod::Hour.to_monthly(2.0) - 1_440.0).abs() < f64::EPSILON);
        assert!((CostPeriod::Day.to_monthly(1.5) - 45.0).abs() < f64::EPSILON);
        assert!((CostPeriod::Month.to_monthly(99.0) - 99.0).abs() < f64::EPSILON);
        assert!((CostPeriod::Year.to_monthly(12.0) - 1.0).abs() < f64::EPSILON);
        assert!((CostPeriod::Unknown.to_monthly(7.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn period_accepts_adjective_aliases() {
        assert_eq!(CostPeriod::from_arg("monthly"), Some(CostPeriod::Month));
        assert_eq!(CostPeriod::from_arg("Yearly"), Some(CostPeriod::Year));
        assert_eq!(CostPeriod::from_arg("hour"), Some(CostPeriod::Hour));
        assert_eq!(CostPeriod::from_arg("fortnight"), None);
        assert_eq!(CostPeriod::from_db("fortnight"), CostPeriod::Unknown);
        assert!(CostPeriod::parse_arg("weekly").is_err());
    }

    #[test]
    fn unknown_enum_values_deserialize() {
        let period: CostPeriod = serde_json::from_str("\"quarter\"").unwrap();
        assert_eq!(period, CostPeriod::Unknown);
        let kind: AllocationType = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(kind, AllocationType::Unknown);
        let kind: AllocationType = serde_json::from_str("\"per_resource_unit\"").unwrap();
        assert_eq!(kind, AllocationType::PerResourceUnit);
    }

    #[test]
    fn calculation_params_validate_counts() {
        let params = CalculationParams::new(Some(3), None).unwrap();
        assert_eq!(params.users(), 3);
        assert_eq!(params.units(), 1);
        assert!(!params.is_empty());

        assert!(CalculationParams::new(None, None).unwrap().is_empty());

        let err = CalculationParams::new(Some(0), None).unwrap_err();
        assert!(matches!(err, CostcalcError::InvalidParameter { ref name, .. } if name == "user_count"));
        let err = CalculationParams::new(None, Some(-4)).unwrap_err();
        assert!(matches!(err, CostcalcError::InvalidParameter { ref name, .. } if name == "resource_units"));
    }

    #[test]
    fn trend_direction_follows_sign() {
        assert_eq!(TrendDirection::from_coefficient(0.001), TrendDirection::Increasing);
        assert_eq!(TrendDirection::from_coefficient(-2.0), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::from_coefficient(0.0), TrendDirection::Stable);
    }

    #[test]
    fn monthly_bucket_json_field_names() {
        let bucket = MonthlyBucket::new(MonthKey::new(2025, 3).unwrap(), 120.5, 4);
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["label"], "Mar 2025");
        assert_eq!(json["total"], 120.5);
        assert_eq!(json["count"], 4);
        assert_eq!(json["month_key"], "2025-03");
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn envelope_wraps_data() {
        let json = serde_json::to_value(Envelope::ok(5)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 5}));
    }
}
