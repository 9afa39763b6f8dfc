//! Forecasting engine and cost allocation logic.

pub mod allocation;
pub mod confidence;
pub mod forecast;
pub mod logging;
pub mod models;
pub mod month;
pub mod predictor;
pub mod query;
pub mod trend;

pub use allocation::{
    build_cost_report, build_product_detail, calculate_cost, calculate_monthly_total_cost,
    calculate_total_cost, calculate_yearly_total_cost, default_params,
};
pub use confidence::confidence_level;
pub use forecast::{ForecastEngine, ForecastRequest, MAX_FORECAST_MONTHS, MIN_FORECAST_MONTHS};
pub use models::{
    Allocation, AllocationCost, AllocationType, CalculationModel, CalculationParams, CostItem,
    CostItemLog, CostPeriod, CostRecord, DashboardSummary, Envelope, ForecastBucket,
    ForecastMetadata, ForecastResult, MonthlyBucket, Product, ProductCostReport, ProductDetail,
    ResolvedAllocation, TrendDirection, TrendFactors,
};
pub use month::MonthKey;
pub use predictor::{FixedJitter, Jitter, RandomJitter, predict_future_costs};
pub use query::{CostRecordQuery, InMemoryRecords, RecordFilter};
pub use trend::analyze_trend;
