//! Storage for the cost ledger, configuration and cached results.

pub mod cache;
pub mod config;
pub mod ledger;
pub mod ledger_schema;
pub mod paths;

pub use cache::{ResultCache, forecast_key, product_calculation_key};
pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CACHE_DIR, ENV_CONFIG, ENV_DB, ENV_FORMAT,
    ENV_NO_COLOR, ENV_NO_COLOR_STD, ENV_PRETTY, ResolvedConfig,
};
pub use ledger::{
    AllocationChanges, CostItemChanges, Ledger, NewAllocation, NewCostItem, NewProduct,
    ProductChanges,
};
pub use paths::AppPaths;
