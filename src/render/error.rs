//! Error rendering for costcalc.
//!
//! JSON and Markdown modes emit a structured error object on stderr so
//! scripts can branch on `error_code`. Human mode prints one line plus an
//! optional hint, colored when stderr is a terminal.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::CostcalcError;

/// Render an error for the given output mode.
#[must_use]
pub fn render_error(
    error: &CostcalcError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Md => render_error_json(error, true),
        OutputFormat::Human => {
            let color = !no_color && crate::util::env::stderr_is_tty();
            render_simple(error, color)
        }
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &CostcalcError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error, false))
}

fn render_simple(error: &CostcalcError, color: bool) -> String {
    let header = format!("Error [{}]: {}", error.error_code(), error);
    let mut lines = vec![if color {
        header.red().bold().to_string()
    } else {
        header
    }];

    if let Some(hint) = error.hint() {
        let hint = format!("Hint: {hint}");
        lines.push(if color { hint.dimmed().to_string() } else { hint });
    }

    lines.join("\n")
}

/// JSON representation of an error.
#[derive(Serialize)]
struct ErrorJson {
    success: bool,
    error_code: &'static str,
    category: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &CostcalcError) -> Self {
        Self {
            success: false,
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            hint: error.hint(),
        }
    }
}
