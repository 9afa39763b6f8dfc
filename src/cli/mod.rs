//! CLI argument parsing and command dispatch.

pub mod allocation;
pub mod args;
pub mod calculate;
pub mod config;
pub mod forecast;
pub mod item;
pub mod product;
pub mod summary;

pub use args::{Cli, Commands, OutputFormat};

use crate::error::Result;
use crate::render::{RenderOptions, Report, render};
use crate::storage::{Ledger, ResolvedConfig, ResultCache};

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ResolvedConfig,
    pub render: RenderOptions,
}

impl Context {
    /// Build a context; color is also dropped when stdout is not a terminal.
    #[must_use]
    pub fn new(config: ResolvedConfig) -> Self {
        let no_color = !crate::util::env::should_use_color(config.no_color);
        let render = RenderOptions {
            format: config.format,
            pretty: config.pretty,
            no_color,
            precision: config.precision,
        };
        Self { config, render }
    }

    /// Open the ledger named by the configuration.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_ledger(&self) -> Result<Ledger> {
        Ok(Ledger::open(&self.config.database_path)?
            .with_categories(self.config.categories_enabled))
    }

    /// The result cache for the configured ledger, honoring `cache.enabled`.
    #[must_use]
    pub fn cache(&self) -> ResultCache {
        ResultCache::for_database(
            &self.config.cache_dir,
            &self.config.database_path,
            self.config.cache_ttl_minutes,
        )
        .with_enabled(self.config.cache_enabled)
    }

    /// Drop cached results after the ledger changed.
    pub fn invalidate_cache(&self) {
        match self.cache().invalidate_derived() {
            Ok(removed) if removed > 0 => {
                tracing::debug!(removed, "Invalidated cached results");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to invalidate cached results"),
        }
    }

    /// Render `report` to stdout.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn emit<T: Report>(&self, report: &T) -> Result<()> {
        let output = render(report, &self.render)?;
        if output.ends_with('\n') {
            print!("{output}");
        } else {
            println!("{output}");
        }
        Ok(())
    }
}

/// Run the parsed command. No subcommand shows the summary.
///
/// # Errors
/// Returns any error from the command.
pub async fn run(command: Option<Commands>, ctx: &Context) -> Result<()> {
    match command {
        Some(Commands::Forecast(args)) => forecast::execute(args, ctx).await,
        Some(Commands::Calculate(args)) => calculate::execute(&args, ctx),
        Some(Commands::Item(cmd)) => item::execute(cmd, ctx),
        Some(Commands::Product(cmd)) => product::execute(cmd, ctx),
        Some(Commands::Allocation(cmd)) => allocation::execute(cmd, ctx),
        Some(Commands::Cache(cmd)) => summary::execute_cache(&cmd, ctx),
        Some(Commands::Config(cmd)) => config::execute(&cmd, ctx),
        Some(Commands::Summary) | None => summary::execute(ctx),
    }
}
