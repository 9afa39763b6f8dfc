//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Cost calculator - track cost items, allocate them to products and
/// forecast monthly spend.
#[derive(Parser, Debug)]
#[command(name = "costcalc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Ledger database file
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forecast monthly costs from recorded cost items
    Forecast(ForecastArgs),

    /// Calculate the allocated cost of a product
    Calculate(CalculateArgs),

    /// Manage cost items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Manage products
    #[command(subcommand)]
    Product(ProductCommand),

    /// Manage cost allocations
    #[command(subcommand)]
    Allocation(AllocationCommand),

    /// Dashboard totals (default command)
    Summary,

    /// Manage cached results
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the `forecast` command.
#[derive(Args, Debug, Default)]
pub struct ForecastArgs {
    /// Months to forecast (1-24)
    #[arg(long, short = 'm', value_name = "N", allow_negative_numbers = true)]
    pub months: Option<i64>,

    /// Only include cost items billed with this period
    #[arg(long, value_name = "PERIOD")]
    pub period: Option<String>,

    /// Only include cost items in this category
    #[arg(long, value_name = "ID")]
    pub category: Option<i64>,

    /// Treat this month (YYYY-MM, or any date in it) as the current month
    #[arg(long, value_name = "MONTH")]
    pub as_of: Option<String>,

    /// Seed the forecast jitter for reproducible output
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the `calculate` command.
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Product id
    #[arg(value_name = "ID")]
    pub product_id: i64,

    /// Number of users for per-user allocations
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub user_count: Option<i64>,

    /// Number of resource units for per-resource allocations
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub resource_units: Option<i64>,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Cost item subcommands.
#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Record a new cost item
    Add {
        /// Item name
        name: String,

        /// Price per billing period
        #[arg(long, allow_negative_numbers = true)]
        price: f64,

        /// Billing period (minute, hour, day, month, year)
        #[arg(long, default_value = "monthly")]
        period: String,

        /// Category id
        #[arg(long, value_name = "ID")]
        category: Option<i64>,

        /// Backdate the item (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_name = "DATE")]
        created_at: Option<String>,
    },

    /// List cost items
    List {
        /// Only items with this billing period
        #[arg(long)]
        period: Option<String>,

        /// Only items in this category
        #[arg(long, value_name = "ID")]
        category: Option<i64>,
    },

    /// Change a cost item
    Update {
        /// Item id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        price: Option<f64>,

        #[arg(long)]
        period: Option<String>,

        #[arg(long, value_name = "ID")]
        category: Option<i64>,

        /// Remove the item's category
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,
    },

    /// Delete a cost item
    Remove {
        /// Item id
        id: i64,
    },

    /// Show the change log of a cost item
    Log {
        /// Item id
        id: i64,
    },
}

/// Product subcommands.
#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// Create a product
    Add {
        /// Product name
        name: String,

        /// Calculation model (per_user, per_resource, fixed_price)
        #[arg(long, default_value = "per_user")]
        model: String,

        /// Expected number of users, used as the default user count
        #[arg(long, value_name = "N")]
        expected_users: Option<u32>,
    },

    /// List products
    List,

    /// Show a product with its allocations and totals
    Show {
        /// Product id
        id: i64,
    },

    /// Change a product
    Update {
        /// Product id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// Calculation model (per_user, per_resource, fixed_price)
        #[arg(long)]
        model: Option<String>,

        #[arg(long, value_name = "N")]
        expected_users: Option<u32>,
    },

    /// Delete a product and its allocations
    Remove {
        /// Product id
        id: i64,
    },
}

/// Allocation subcommands.
#[derive(Subcommand, Debug)]
pub enum AllocationCommand {
    /// Allocate a cost item to a product
    Add {
        /// Product id
        #[arg(long, value_name = "ID")]
        product: i64,

        /// Cost item id
        #[arg(long, value_name = "ID")]
        item: i64,

        /// Allocation type (fixed, per_user, per_resource_unit)
        #[arg(long = "type", value_name = "TYPE")]
        allocation_type: String,

        /// Multiplier applied to the cost item's price
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
    },

    /// Change an allocation's type or value
    Update {
        /// Allocation id
        id: i64,

        /// Allocation type (fixed, per_user, per_resource_unit)
        #[arg(long = "type", value_name = "TYPE")]
        allocation_type: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        value: Option<f64>,
    },

    /// Remove an allocation
    Remove {
        /// Allocation id
        id: i64,
    },
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Drop every cached forecast and product calculation for the ledger
    Clear,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file with every setting at its default
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::parse_from([
            "costcalc", "forecast", "--months", "12", "--period", "monthly", "--seed", "7",
        ]);
        match cli.command {
            Some(Commands::Forecast(args)) => {
                assert_eq!(args.months, Some(12));
                assert_eq!(args.period.as_deref(), Some("monthly"));
                assert_eq!(args.seed, Some(7));
                assert!(!args.no_cache);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_months_reach_validation() {
        // Range checks live in the forecast request, not in clap.
        let cli = Cli::parse_from(["costcalc", "forecast", "--months", "-3"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Forecast(ForecastArgs {
                months: Some(-3),
                ..
            }))
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["costcalc", "summary", "--json", "--db", "/tmp/x.sqlite"]);
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.sqlite")));
    }

    #[test]
    fn allocation_type_flag() {
        let cli = Cli::parse_from([
            "costcalc", "allocation", "add", "--product", "1", "--item", "2", "--type",
            "per_user", "--value", "0.5",
        ]);
        match cli.command {
            Some(Commands::Allocation(AllocationCommand::Add {
                allocation_type,
                value,
                ..
            })) => {
                assert_eq!(allocation_type, "per_user");
                assert!((value - 0.5).abs() < f64::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn clear_category_conflicts_with_category() {
        let cli = Cli::parse_from(["costcalc", "item", "update", "3", "--clear-category"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Item(ItemCommand::Update {
                id: 3,
                category: None,
                clear_category: true,
                ..
            }))
        ));

        let err = Cli::try_parse_from([
            "costcalc", "item", "update", "3", "--category", "2", "--clear-category",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn update_subcommands_parse() {
        let cli = Cli::parse_from([
            "costcalc", "product", "update", "4", "--model", "fixed_price", "--expected-users",
            "9",
        ]);
        assert!(matches!(
            cli.command,
            Some(Commands::Product(ProductCommand::Update {
                id: 4,
                name: None,
                expected_users: Some(9),
                ..
            }))
        ));

        let cli = Cli::parse_from(["costcalc", "allocation", "update", "2", "--type", "fixed"]);
        match cli.command {
            Some(Commands::Allocation(AllocationCommand::Update {
                id,
                allocation_type,
                value,
            })) => {
                assert_eq!(id, 2);
                assert_eq!(allocation_type.as_deref(), Some("fixed"));
                assert!(value.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
