//! Analyse command implementation
//!
//! Runs every loss model query for the configured tranche at one horizon.

use pricer_core::types::time::Date;
use pricer_core::types::PricingError;
use pricer_models::credit::LossBasket;
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;
use crate::{CliError, Result};

/// Tail probability at one tranche loss fraction.
#[derive(Debug, Clone, Serialize)]
pub struct TailPoint {
    /// Tranche loss fraction
    pub loss_fraction: f64,
    /// P(tranche loss >= loss_fraction)
    pub probability: f64,
}

/// Loss statistics at one percentile.
#[derive(Debug, Clone, Serialize)]
pub struct PercentilePoint {
    /// Percentile level
    pub percentile: f64,
    /// Pool loss fraction at the percentile
    pub portfolio_loss_fraction: f64,
    /// Tranche loss amount at the percentile
    pub tranche_loss: f64,
    /// Expected tranche loss beyond the percentile
    pub expected_shortfall: f64,
}

/// Full analysis output.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Horizon date
    pub date: Date,
    /// Factor correlation
    pub correlation: f64,
    /// Live notional at the horizon
    pub remaining_notional: f64,
    /// Mean default probability of the live names
    pub average_probability: f64,
    /// Mean recovery of the live names
    pub average_recovery: f64,
    /// Expected tranche loss
    pub expected_tranche_loss: f64,
    /// Tail probabilities
    pub tail: Vec<TailPoint>,
    /// Percentile statistics
    pub percentiles: Vec<PercentilePoint>,
}

/// Rejects a NaN or infinite query result before it reaches the report.
fn finite(quantity: &str, value: f64) -> std::result::Result<f64, PricingError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NumericalInstability(format!(
            "{} evaluated to {}",
            quantity, value
        )))
    }
}

/// Compute the report.
///
/// `date` and `percentiles` take precedence over the scenario file when
/// given.
pub fn analyse(config: &CliConfig, date: Option<&str>, percentiles: &[f64]) -> Result<AnalysisReport> {
    let date = match date {
        Some(s) => Date::parse(s)?,
        None => config.queries.valuation_date.ok_or_else(|| {
            CliError::InvalidArgument(
                "No valuation date: pass --date, set queries.valuation_date or LHP_VALUATION_DATE"
                    .to_string(),
            )
        })?,
    };
    let percentiles = if percentiles.is_empty() {
        config.queries.percentiles.as_slice()
    } else {
        percentiles
    };

    let (model, basket) = config.build()?;

    let tail = config
        .queries
        .loss_fractions
        .iter()
        .map(|&loss_fraction| -> Result<TailPoint> {
            Ok(TailPoint {
                loss_fraction,
                probability: finite(
                    "tail probability",
                    model.prob_over_loss(&basket, date, loss_fraction)?,
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let percentiles = percentiles
        .iter()
        .map(|&percentile| -> Result<PercentilePoint> {
            Ok(PercentilePoint {
                percentile,
                portfolio_loss_fraction: finite(
                    "pool loss percentile",
                    model.percentile_portfolio_loss_fraction(&basket, date, percentile)?,
                )?,
                tranche_loss: finite(
                    "tranche loss percentile",
                    model.percentile(&basket, date, percentile)?,
                )?,
                expected_shortfall: finite(
                    "expected shortfall",
                    model.expected_shortfall(&basket, date, percentile)?,
                )?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnalysisReport {
        date,
        correlation: model.correlation(),
        remaining_notional: basket.remaining_notional(date),
        average_probability: model.average_probability(&basket, date)?,
        average_recovery: model.average_recovery(&basket, date)?,
        expected_tranche_loss: finite(
            "expected tranche loss",
            model.expected_tranche_loss(&basket, date)?,
        )?,
        tail,
        percentiles,
    })
}

fn print_table(report: &AnalysisReport) {
    println!("\nHorizon              {}", report.date);
    println!("Correlation          {:.4}", report.correlation);
    println!("Remaining notional   {:.2}", report.remaining_notional);
    println!("Average PD           {:.6}", report.average_probability);
    println!("Average recovery     {:.4}", report.average_recovery);
    println!("Expected loss        {:.2}", report.expected_tranche_loss);

    println!("\n┌────────────┬──────────────┐");
    println!("│ Loss frac  │ P(L >= x)    │");
    println!("├────────────┼──────────────┤");
    for point in &report.tail {
        println!("│ {:>10.4} │ {:>12.6} │", point.loss_fraction, point.probability);
    }
    println!("└────────────┴──────────────┘");

    println!("\n┌────────────┬────────────┬──────────────┬──────────────┐");
    println!("│ Percentile │ Pool loss  │ Tranche loss │ Exp. shortf. │");
    println!("├────────────┼────────────┼──────────────┼──────────────┤");
    for point in &report.percentiles {
        println!(
            "│ {:>10.4} │ {:>10.6} │ {:>12.2} │ {:>12.2} │",
            point.percentile,
            point.portfolio_loss_fraction,
            point.tranche_loss,
            point.expected_shortfall
        );
    }
    println!("└────────────┴────────────┴──────────────┴──────────────┘");
}

/// Run the analyse command
pub fn run(config: &CliConfig, date: Option<&str>, percentiles: &[f64], format: &str) -> Result<()> {
    info!("Starting analysis...");
    info!("  Correlation: {}", config.model.correlation);
    info!("  Tranche: [{}, {}]", config.basket.attachment, config.basket.detachment);

    let report = analyse(config, date, percentiles)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "table" => print_table(&report),
        other => {
            return Err(CliError::InvalidArgument(format!(
                "Unknown format: {}. Supported: table, json",
                other
            )));
        }
    }

    info!("Analysis complete");
    Ok(())
}
