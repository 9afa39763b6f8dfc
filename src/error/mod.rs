//! Error types for costcalc.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into four main categories:
//! - **Validation**: Rejected input (forecast horizon, user counts, unknown enum values)
//! - **Data**: Missing rows or not enough history to work with
//! - **Configuration**: Config file parsing or invalid values
//! - **Internal**: Storage driver, I/O and serialization failures
//!
//! Each error has a stable error code (e.g., `COST-V001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid caller input.
    Validation,
    /// Missing or insufficient data.
    Data,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (storage, I/O, serialization).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::Data => "Data error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Validation => "V",
            Self::Data => "D",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Rejected parameter
    InvalidInput = 2,
    /// Referenced row does not exist
    NotFound = 3,
    /// Config file or value problem
    ConfigError = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for costcalc operations.
#[derive(Error, Debug)]
pub enum CostcalcError {
    // ==========================================================================
    // Validation errors (Category: Validation)
    // ==========================================================================
    /// A caller-supplied parameter is out of range or malformed.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    // ==========================================================================
    // Data errors (Category: Data)
    // ==========================================================================
    /// Not enough historical data to compute a result.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A referenced row no longer exists.
    #[error("{entity} {id} not found")]
    MissingReference { entity: String, id: i64 },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ==========================================================================
    // Generic wrapper (Category: Internal)
    // ==========================================================================
    /// Catch-all for other errors (storage driver failures land here).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CostcalcError {
    /// Shorthand for building an [`CostcalcError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for building a [`CostcalcError::MissingReference`].
    pub fn missing(entity: impl Into<String>, id: i64) -> Self {
        Self::MissingReference {
            entity: entity.into(),
            id,
        }
    }

    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidParameter { .. } => ExitCode::InvalidInput,
            Self::MissingReference { .. } => ExitCode::NotFound,
            Self::Config(_) | Self::ConfigParse { .. } => ExitCode::ConfigError,
            Self::InsufficientData(_) | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ExitCode::GeneralError
            }
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParameter { .. } => ErrorCategory::Validation,
            Self::InsufficientData(_) | Self::MissingReference { .. } => ErrorCategory::Data,
            Self::Config(_) | Self::ConfigParse { .. } => ErrorCategory::Configuration,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `COST-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "COST-V001",
            Self::InsufficientData(_) => "COST-D001",
            Self::MissingReference { .. } => "COST-D002",
            Self::Config(_) => "COST-C001",
            Self::ConfigParse { .. } => "COST-C002",
            Self::Io(_) => "COST-X001",
            Self::Json(_) => "COST-X002",
            Self::Other(_) => "COST-X003",
        }
    }

    /// Returns a one-line hint for resolving the error, when one applies.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidParameter { name, .. } => {
                Some(format!("Check the value passed for '{name}' (see --help)"))
            }
            Self::MissingReference { entity, .. } => Some(match entity.as_str() {
                "product" => "List products with: costcalc product list".to_string(),
                "cost item" => "List cost items with: costcalc item list".to_string(),
                _ => format!("Check the {entity} id with: costcalc product show <ID>"),
            }),
            Self::ConfigParse { path, .. } => Some(format!("Fix or remove {path}")),
            Self::Config(_) => Some("Run with --verbose to see which config was loaded".to_string()),
            Self::InsufficientData(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }
}

/// Result type alias for costcalc operations.
pub type Result<T> = std::result::Result<T, CostcalcError>;
