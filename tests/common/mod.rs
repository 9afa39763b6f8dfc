//! Shared helpers for costcalc integration tests.
//!
//! # Modules
//!
//! - `sandbox`: isolated database, cache and config paths for CLI runs
//! - `logger`: phase-tagged test output
//! - `log_capture`: tracing capture for in-process assertions

#![allow(dead_code)]

pub mod log_capture;
pub mod logger;
pub mod sandbox;
