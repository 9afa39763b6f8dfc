//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/costcalc/config.toml`
//! - macOS: `~/Library/Application Support/com.costcalc.costcalc/config.toml`
//! - Windows: `%APPDATA%/costcalc/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `COSTCALC_FORMAT`: Output format (human, json, md)
//! - `COSTCALC_NO_COLOR` or `NO_COLOR`: Disable colors (1, true, yes)
//! - `COSTCALC_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `COSTCALC_DB`: Ledger database path
//! - `COSTCALC_CACHE_DIR`: Result cache directory
//! - `COSTCALC_CONFIG`: Override config file path

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AppPaths;
use super::cache::DEFAULT_TTL_MINUTES;
use crate::cli::args::{Cli, OutputFormat};
use crate::core::forecast::{MAX_FORECAST_MONTHS, MIN_FORECAST_MONTHS};
use crate::error::{CostcalcError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for output format.
pub const ENV_FORMAT: &str = "COSTCALC_FORMAT";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "COSTCALC_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "COSTCALC_PRETTY";
/// Environment variable for the ledger database path.
pub const ENV_DB: &str = "COSTCALC_DB";
/// Environment variable for the result cache directory.
pub const ENV_CACHE_DIR: &str = "COSTCALC_CACHE_DIR";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "COSTCALC_CONFIG";

/// Largest supported rounding precision for displayed amounts.
pub const MAX_PRECISION: u32 = 6;
/// Longest cache lifetime accepted from the config file (one week).
pub const MAX_TTL_MINUTES: u64 = 10_080;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Output format.
    pub format: OutputFormat,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Ledger database file.
    pub database_path: PathBuf,
    /// Directory for cached forecasts and product calculations.
    pub cache_dir: PathBuf,
    pub cache_enabled: bool,
    pub cache_ttl_minutes: u64,
    /// Forecast horizon used when `--months` is omitted.
    pub default_months: i64,
    /// Decimal places for displayed amounts.
    pub precision: usize,
    /// Whether cost items carry a category that forecasts can filter on.
    pub categories_enabled: bool,
    /// Log level from the config file, if any.
    pub log_level: Option<String>,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub format: ConfigSource,
    pub no_color: ConfigSource,
    pub pretty: ConfigSource,
    pub database_path: ConfigSource,
    pub cache_dir: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, environment variables, and
    /// the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or a
    /// resolved value is invalid.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = Config::load_from_env()?;
        Self::from_config(cli, &config, &AppPaths::new())
    }

    /// Resolve against an already loaded config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or an environment override is invalid.
    pub fn from_config(cli: &Cli, config: &Config, paths: &AppPaths) -> Result<Self> {
        config.validate()?;

        let mut sources = ConfigSources::default();

        let format = Self::resolve_format(cli, config, &mut sources.format)?;
        let no_color = Self::resolve_no_color(cli, config, &mut sources.no_color);
        let pretty = Self::resolve_pretty(cli, config, &mut sources.pretty);
        let database_path =
            Self::resolve_database_path(cli, config, paths, &mut sources.database_path);
        let cache_dir = Self::resolve_cache_dir(config, paths, &mut sources.cache_dir);

        Ok(Self {
            format,
            no_color,
            pretty,
            database_path,
            cache_dir,
            cache_enabled: config.cache.enabled,
            cache_ttl_minutes: config.cache.ttl_minutes,
            default_months: i64::from(config.forecast.default_months),
            precision: config.calculation.precision as usize,
            categories_enabled: config.categories.enabled,
            log_level: config.general.log_level.clone(),
            sources,
        })
    }

    /// Resolve output format setting.
    fn resolve_format(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // 1. CLI --json flag (shorthand)
        if cli.json {
            *source = ConfigSource::Cli;
            return Ok(OutputFormat::Json);
        }

        // clap fills in `human` when --format is absent, so an explicit
        // `--format human` cannot beat the environment.
        if cli.format != OutputFormat::Human {
            *source = ConfigSource::Cli;
            return Ok(cli.format);
        }

        if let Some(format_env) = env_value(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return Self::parse_format(&format_env);
        }

        if let Some(ref format_str) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return Self::parse_format(format_str);
        }

        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    /// Parse a format string into `OutputFormat`.
    fn parse_format(s: &str) -> Result<OutputFormat> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Md),
            _ => Err(CostcalcError::Config(format!(
                "Invalid format '{s}'. Valid formats: human, json, md"
            ))),
        }
    }

    fn resolve_no_color(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }

        if Self::is_env_truthy(ENV_NO_COLOR) || std::env::var_os(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }

        // config.output.color = false means no_color = true
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_pretty(cli: &Cli, config: &Config, source: &mut ConfigSource) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if Self::is_env_truthy(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return true;
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    fn resolve_database_path(
        cli: &Cli,
        config: &Config,
        paths: &AppPaths,
        source: &mut ConfigSource,
    ) -> PathBuf {
        if let Some(ref path) = cli.db {
            *source = ConfigSource::Cli;
            return path.clone();
        }

        if let Some(path) = env_value(ENV_DB) {
            *source = ConfigSource::Env;
            return PathBuf::from(path);
        }

        if let Some(ref path) = config.storage.database_path {
            *source = ConfigSource::ConfigFile;
            return path.clone();
        }

        *source = ConfigSource::Default;
        paths.database_file()
    }

    fn resolve_cache_dir(config: &Config, paths: &AppPaths, source: &mut ConfigSource) -> PathBuf {
        if let Some(dir) = env_value(ENV_CACHE_DIR) {
            *source = ConfigSource::Env;
            return PathBuf::from(dir);
        }

        if let Some(ref dir) = config.cache.dir {
            *source = ConfigSource::ConfigFile;
            return dir.clone();
        }

        *source = ConfigSource::Default;
        paths.results_cache_dir()
    }

    /// Check if an environment variable is set to a truthy value.
    fn is_env_truthy(var: &str) -> bool {
        std::env::var(var)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub forecast: ForecastConfig,
    pub calculation: CalculationConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub categories: CategoriesConfig,
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Months to forecast when the command line does not say.
    pub default_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Decimal places shown for amounts.
    pub precision: u32,
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_minutes: u64,
    /// Cache directory; defaults to the platform cache dir.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Ledger database path; defaults to the platform data dir.
    pub database_path: Option<PathBuf>,
}

/// Category support. When disabled, forecasts reject `--category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    pub enabled: bool,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, md).
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { default_months: 6 }
    }
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_minutes: DEFAULT_TTL_MINUTES,
            dir: None,
        }
    }
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration, honoring `COSTCALC_CONFIG`.
    ///
    /// # Errors
    /// Returns an error only if the file exists but is invalid.
    pub fn load_from_env() -> Result<Self> {
        Self::load_from(&Self::path_from_env())
    }

    /// Config file path, honoring `COSTCALC_CONFIG`.
    #[must_use]
    pub fn path_from_env() -> PathBuf {
        env_value(ENV_CONFIG).map_or_else(Self::config_path, PathBuf::from)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CostcalcError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string().trim().to_string(),
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CostcalcError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Write the default configuration to `path`.
    ///
    /// # Errors
    /// Returns a configuration error if the file exists and `force` is not
    /// set, or an error if it cannot be written.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(CostcalcError::Config(format!(
                "{} already exists (pass --force to overwrite)",
                path.display()
            )));
        }
        Self::default().save_to(path)?;
        tracing::info!(path = %path.display(), "Wrote default config");
        Ok(())
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns a configuration error naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_FORECAST_MONTHS..=MAX_FORECAST_MONTHS).contains(&self.forecast.default_months) {
            return Err(CostcalcError::Config(format!(
                "forecast.default_months must be between {MIN_FORECAST_MONTHS} and {MAX_FORECAST_MONTHS}"
            )));
        }

        if self.calculation.precision > MAX_PRECISION {
            return Err(CostcalcError::Config(format!(
                "calculation.precision must be between 0 and {MAX_PRECISION}"
            )));
        }

        if self.cache.ttl_minutes == 0 || self.cache.ttl_minutes > MAX_TTL_MINUTES {
            return Err(CostcalcError::Config(format!(
                "cache.ttl_minutes must be between 1 and {MAX_TTL_MINUTES}"
            )));
        }

        if let Some(format) = &self.output.format {
            if !["human", "json", "md"].contains(&format.as_str()) {
                return Err(CostcalcError::Config(format!(
                    "Invalid format \"{format}\". Valid formats: human, json, md"
                )));
            }
        }

        Ok(())
    }
}
