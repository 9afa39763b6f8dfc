//! Config file commands.

use std::path::Path;

use crate::cli::Context;
use crate::cli::args::ConfigCommand;
use crate::error::Result;
use crate::render::ConfigWritten;
use crate::storage::Config;

/// Execute a config subcommand.
///
/// The file goes to `COSTCALC_CONFIG` when set, else the platform config path.
///
/// # Errors
/// Returns a configuration error if the file exists without `--force`, or an
/// I/O error if it cannot be written.
pub fn execute(cmd: &ConfigCommand, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => ctx.emit(&init(&Config::path_from_env(), *force)?),
    }
}

/// Write the default config to `path`.
///
/// # Errors
/// See [`Config::write_default`].
pub fn init(path: &Path, force: bool) -> Result<ConfigWritten> {
    Config::write_default(path, force)?;
    Ok(ConfigWritten {
        path: path.display().to_string(),
    })
}
