//! Scenario configuration management
//!
//! Loads the model, basket and query settings from a TOML file, then
//! applies environment overrides:
//!
//! - `LHP_LOG_LEVEL`: log level (trace, debug, info, warn, error)
//! - `LHP_VALUATION_DATE`: horizon date (YYYY-MM-DD)

use std::path::Path;
use std::str::FromStr;

use pricer_core::types::time::Date;
use pricer_models::credit::{BasketConfig, FlatHazardBasket, GaussianLhpModel, LhpModelConfig};
use serde::Deserialize;

use crate::{CliError, Result};

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::Config(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                s
            ))),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn default_percentiles() -> Vec<f64> {
    vec![0.5, 0.9, 0.99, 0.999]
}

fn default_loss_fractions() -> Vec<f64> {
    vec![0.0, 0.25, 0.5, 0.75, 1.0]
}

/// What to compute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Horizon date of every query
    pub valuation_date: Option<Date>,
    /// Percentiles for loss percentiles and expected shortfall
    pub percentiles: Vec<f64>,
    /// Tranche loss fractions for tail probabilities
    pub loss_fractions: Vec<f64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            valuation_date: None,
            percentiles: default_percentiles(),
            loss_fractions: default_loss_fractions(),
        }
    }
}

/// Scenario file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Loss model
    pub model: LhpModelConfig,
    /// Tranched basket
    pub basket: BasketConfig,
    /// Queries
    #[serde(default)]
    pub queries: QueryConfig,
}

impl CliConfig {
    /// Parse a scenario from TOML text (no validation).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a scenario file, apply environment overrides and validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        config.apply_overrides(
            std::env::var("LHP_LOG_LEVEL").ok().as_deref(),
            std::env::var("LHP_VALUATION_DATE").ok().as_deref(),
        )?;
        config.validate()?;
        Ok(config)
    }

    /// Override file settings with externally supplied values.
    pub fn apply_overrides(
        &mut self,
        log_level: Option<&str>,
        valuation_date: Option<&str>,
    ) -> Result<()> {
        if let Some(level) = log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(date) = valuation_date {
            self.queries.valuation_date = Some(Date::parse(date)?);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = self
            .queries
            .percentiles
            .iter()
            .find(|q| !(0.0..=1.0).contains(*q))
        {
            return Err(CliError::Config(format!("percentile {} outside [0, 1]", q)));
        }
        if let Some(f) = self
            .queries
            .loss_fractions
            .iter()
            .find(|f| !(0.0..=1.0).contains(*f))
        {
            return Err(CliError::Config(format!("loss fraction {} outside [0, 1]", f)));
        }
        self.build()?;
        Ok(())
    }

    /// Build the basket and a model sized to it.
    pub fn build(&self) -> Result<(GaussianLhpModel, FlatHazardBasket)> {
        let basket = self.basket.build()?;
        let model = self.model.build(self.basket.size()?)?;
        model.check_basket(&basket)?;
        Ok((model, basket))
    }
}
