//! LHP CLI - Command Line Tranche Loss Analytics
//!
//! Operational entry point for the Gaussian copula large homogeneous pool
//! tranche loss model.
//!
//! # Commands
//!
//! - `lhp analyse` - Expected loss, tail probabilities, percentiles and
//!   expected shortfall of the configured tranche
//! - `lhp check` - Validate the scenario file
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires configuration and
//! logging around the `pricer_models` loss model.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use config::{CliConfig, LogLevel};

/// Gaussian LHP tranche loss CLI
#[derive(Parser)]
#[command(name = "lhp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scenario file path
    #[arg(short, long, global = true, default_value = "lhp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the loss analytics for the configured tranche
    Analyse {
        /// Horizon date (YYYY-MM-DD), overrides the scenario file
        #[arg(short, long)]
        date: Option<String>,

        /// Percentile to report (repeatable), overrides the scenario file
        #[arg(short, long)]
        percentile: Vec<f64>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Validate the scenario file
    Check,
}

/// Installs the subscriber before anything can fail.
///
/// `RUST_LOG` wins when set; otherwise the filter starts at `debug` with
/// `--verbose` and `info` without, until the scenario's level is known.
fn init_tracing(verbose: bool) -> reload::Handle<EnvFilter, Registry> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// Level the scenario file asks for, if neither `--verbose` nor `RUST_LOG`
/// already decided it.
fn configured_level(level: LogLevel, verbose: bool, rust_log_set: bool) -> Option<&'static str> {
    if verbose || rust_log_set {
        None
    } else {
        Some(level.as_filter_str())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing(cli.verbose);

    let config = CliConfig::from_file(&cli.config).map_err(|e| {
        error!(config = %cli.config.display(), error = %e, "Failed to load scenario");
        e
    })?;

    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    if let Some(level) = configured_level(config.log_level, cli.verbose, rust_log_set) {
        if let Err(e) = filter.reload(EnvFilter::new(level)) {
            error!(error = %e, "Failed to apply configured log level");
        }
    }

    if cli.verbose {
        info!("Verbose mode enabled");
    }
    info!(config = %cli.config.display(), "Scenario loaded");

    match cli.command {
        Commands::Analyse {
            date,
            percentile,
            format,
        } => commands::analyse::run(&config, date.as_deref(), &percentile, &format),
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_applies_without_overrides() {
        assert_eq!(configured_level(LogLevel::Warn, false, false), Some("warn"));
        assert_eq!(configured_level(LogLevel::Trace, false, false), Some("trace"));
    }

    #[test]
    fn test_verbose_and_rust_log_take_precedence() {
        assert_eq!(configured_level(LogLevel::Error, true, false), None);
        assert_eq!(configured_level(LogLevel::Error, false, true), None);
        assert_eq!(configured_level(LogLevel::Error, true, true), None);
    }

    #[test]
    fn test_cli_parses_before_config() {
        let cli = Cli::try_parse_from(["lhp", "--config", "/nonexistent/lhp.toml", "check"]).unwrap();
        assert!(!cli.verbose);
        assert!(matches!(
            CliConfig::from_file(&cli.config),
            Err(CliError::FileNotFound(_))
        ));
    }
}
