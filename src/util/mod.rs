//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_cost, format_percent, format_ratio};
pub use time::{parse_date_arg, resolve_as_of};
