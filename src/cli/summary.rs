//! Summary and cache commands.

use crate::cli::Context;
use crate::cli::args::CacheCommand;
use crate::error::Result;
use crate::render::CacheCleared;

/// Execute the summary command.
///
/// # Errors
/// Returns a storage error if the ledger cannot be read.
pub fn execute(ctx: &Context) -> Result<()> {
    let ledger = ctx.open_ledger()?;
    ctx.emit(&ledger.summary()?)
}

/// Execute a cache subcommand.
///
/// # Errors
/// Returns an error if cache entries cannot be deleted.
pub fn execute_cache(cmd: &CacheCommand, ctx: &Context) -> Result<()> {
    match cmd {
        CacheCommand::Clear => {
            let removed = ctx.cache().clear_all()?;
            tracing::info!(removed, "Cleared result cache");
            ctx.emit(&CacheCleared { removed })
        }
    }
}
