//! costcalc - Cost Calculator
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use costcalc::cli::{self, Cli, Context, OutputFormat};
use costcalc::core::logging::{self, LogSettings};
use costcalc::error::CostcalcError;
use costcalc::render::error::render_error;
use costcalc::storage::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config errors are reported before the config's own log level is known.
    let config = match ResolvedConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LogSettings::resolve(
                cli.log_level.as_deref(),
                cli.verbose,
                cli.json_output,
                None,
            ));
            let format = if cli.json {
                OutputFormat::Json
            } else {
                cli.format
            };
            return fail(&e, format, cli.no_color, cli.pretty);
        }
    };

    logging::init(&LogSettings::resolve(
        cli.log_level.as_deref(),
        cli.verbose,
        cli.json_output,
        config.log_level.as_deref(),
    ));
    tracing::debug!(
        format = ?config.format,
        format_source = %config.sources.format,
        database = %config.database_path.display(),
        database_source = %config.sources.database_path,
        "Resolved configuration"
    );

    let ctx = Context::new(config);
    match cli::run(cli.command, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e, ctx.render.format, ctx.render.no_color, ctx.render.pretty),
    }
}

fn fail(error: &CostcalcError, format: OutputFormat, no_color: bool, pretty: bool) -> ExitCode {
    tracing::error!("{}", error);
    eprintln!("{}", render_error(error, format, no_color, pretty));
    ExitCode::from(error.exit_code() as u8)
}
