//! TOML configuration for the LHP model and its test basket.
//!
//! ```toml
//! [model]
//! correlation = 0.2
//! recoveries = 0.4          # or one value per name: [0.4, 0.35, ...]
//!
//! [basket]
//! reference_date = "2026-03-20"
//! notional = 10_000_000.0
//! names = 125
//! hazard_rate = 0.012       # or `hazard_rates = [...]`
//! attachment = 0.03
//! detachment = 0.07
//! day_count = "ACT/365F"
//!
//! [[basket.defaults]]
//! index = 4
//! date = "2026-09-01"
//! recovery = 0.3
//! ```

use pricer_core::types::time::{Date, DayCountConvention};
use serde::Deserialize;

use super::basket::FlatHazardBasket;
use super::error::LossModelError;
use super::lhp::GaussianLhpModel;

/// Recovery input: one rate for every name or a rate per name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecoveryConfig {
    /// Same recovery for every name
    Uniform(f64),
    /// Recovery per name, in basket order
    PerName(Vec<f64>),
}

/// Gaussian LHP model configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LhpModelConfig {
    /// Factor correlation ρ
    pub correlation: f64,
    /// Recovery rates
    pub recoveries: RecoveryConfig,
}

impl LhpModelConfig {
    /// Parses a model table from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, LossModelError> {
        toml::from_str(s).map_err(|e| LossModelError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Builds a model for a basket of `names` names.
    ///
    /// # Errors
    /// `BasketSizeMismatch` when per-name recoveries disagree with `names`,
    /// otherwise the validation errors of [`GaussianLhpModel::new`].
    pub fn build(&self, names: usize) -> Result<GaussianLhpModel, LossModelError> {
        let recoveries = match &self.recoveries {
            RecoveryConfig::Uniform(r) => vec![*r; names],
            RecoveryConfig::PerName(rs) => {
                if rs.len() != names {
                    return Err(LossModelError::BasketSizeMismatch {
                        basket: names,
                        model: rs.len(),
                    });
                }
                rs.clone()
            }
        };
        GaussianLhpModel::new(self.correlation, recoveries)
    }
}

/// A name that has already defaulted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultConfig {
    /// Position of the name in the basket
    pub index: usize,
    /// Default date
    pub date: Date,
    /// Realised recovery rate
    pub recovery: f64,
}

/// Flat hazard basket configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BasketConfig {
    /// Date the hazard rates are anchored to
    pub reference_date: Date,
    /// Total portfolio notional
    pub notional: f64,
    /// Number of names when a single `hazard_rate` is given
    #[serde(default)]
    pub names: Option<usize>,
    /// Common hazard rate
    #[serde(default)]
    pub hazard_rate: Option<f64>,
    /// Hazard rate per name
    #[serde(default)]
    pub hazard_rates: Option<Vec<f64>>,
    /// Tranche attachment as a fraction of notional
    pub attachment: f64,
    /// Tranche detachment as a fraction of notional
    pub detachment: f64,
    /// Day count for hazard times
    #[serde(default)]
    pub day_count: DayCountConvention,
    /// Realised defaults
    #[serde(default)]
    pub defaults: Vec<DefaultConfig>,
}

impl BasketConfig {
    fn hazard_rates(&self) -> Result<Vec<f64>, LossModelError> {
        match (&self.hazard_rates, self.hazard_rate, self.names) {
            (Some(rates), None, None) => Ok(rates.clone()),
            (Some(rates), None, Some(n)) if n == rates.len() => Ok(rates.clone()),
            (None, Some(rate), Some(n)) => Ok(vec![rate; n]),
            (None, Some(_), None) => Err(LossModelError::Config(
                "`hazard_rate` requires `names`".to_string(),
            )),
            (None, None, _) => Err(LossModelError::Config(
                "one of `hazard_rate` or `hazard_rates` is required".to_string(),
            )),
            (Some(rates), None, Some(n)) => Err(LossModelError::Config(format!(
                "`names` = {} but {} hazard rates given",
                n,
                rates.len()
            ))),
            (Some(_), Some(_), _) => Err(LossModelError::Config(
                "`hazard_rate` and `hazard_rates` are mutually exclusive".to_string(),
            )),
        }
    }

    /// Number of names the configuration describes.
    pub fn size(&self) -> Result<usize, LossModelError> {
        Ok(self.hazard_rates()?.len())
    }

    /// Builds the basket.
    pub fn build(&self) -> Result<FlatHazardBasket, LossModelError> {
        let mut basket = FlatHazardBasket::new(
            self.reference_date,
            self.notional,
            self.hazard_rates()?,
            self.attachment,
            self.detachment,
        )?
        .with_day_count(self.day_count);
        for default in &self.defaults {
            basket = basket.with_default(default.index, default.date, default.recovery)?;
        }
        Ok(basket)
    }
}
