//! Credit basket capability consumed by the loss models.
//!
//! This module provides:
//! - `LossBasket`: What a loss model needs to know about a tranched
//!   portfolio at a horizon date
//! - `FlatHazardBasket`: Equal-weight basket with flat hazard rates and
//!   optional realised defaults
//!
//! Loss models query a basket, they never own its state.

use pricer_core::types::time::{Date, DayCountConvention};

use super::error::LossModelError;

/// Tranched credit portfolio as seen by a loss model.
///
/// All amounts are in currency units and refer to the portfolio as of
/// `date`, after removing names that defaulted on or before it.
pub trait LossBasket {
    /// Number of names in the basket, defaulted or not.
    fn size(&self) -> usize;

    /// Sum of the notionals of the names still alive at `date`.
    fn remaining_notional(&self, date: Date) -> f64;

    /// Tranche attachment amount net of realised losses.
    fn remaining_attachment_amount(&self, date: Date) -> f64;

    /// Tranche detachment amount net of realised losses.
    fn remaining_detachment_amount(&self, date: Date) -> f64;

    /// Indices (into the full name list) of the names alive at `date`.
    fn live_names(&self, date: Date) -> Vec<usize>;

    /// Default probabilities of the live names up to `date`, in the order
    /// of [`LossBasket::live_names`].
    fn remaining_default_probabilities(&self, date: Date) -> Vec<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RealisedDefault {
    date: Date,
    recovery: f64,
}

/// Equal-weight basket with flat hazard rates.
///
/// Name `i` defaults before `t` years with probability `1 - exp(-λᵢ t)`,
/// where `t` is measured from the reference date with the basket's day
/// count. Names can be marked as already defaulted; their realised loss
/// `notional × (1 - recovery)` erodes the tranche from the bottom.
///
/// # Examples
/// ```
/// use pricer_core::types::time::Date;
/// use pricer_models::credit::{FlatHazardBasket, LossBasket};
///
/// let today = Date::from_ymd(2026, 3, 20).unwrap();
/// let basket = FlatHazardBasket::new(today, 100.0, vec![0.01; 100], 0.03, 0.07).unwrap();
///
/// let horizon = Date::from_ymd(2031, 3, 20).unwrap();
/// assert_eq!(basket.size(), 100);
/// assert!((basket.remaining_notional(horizon) - 100.0).abs() < 1e-12);
/// assert!((basket.remaining_attachment_amount(horizon) - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatHazardBasket {
    reference_date: Date,
    day_count: DayCountConvention,
    notional: f64,
    hazard_rates: Vec<f64>,
    defaults: Vec<Option<RealisedDefault>>,
    attachment: f64,
    detachment: f64,
}

impl FlatHazardBasket {
    /// Creates a basket of equal-notional names.
    ///
    /// # Arguments
    /// * `reference_date` - Date the hazard rates are anchored to
    /// * `notional` - Total portfolio notional, split equally across names
    /// * `hazard_rates` - Flat hazard rate per name
    /// * `attachment` - Tranche attachment as a fraction of `notional`
    /// * `detachment` - Tranche detachment as a fraction of `notional`
    ///
    /// # Errors
    /// `LossModelError::Config` for an empty name list, a negative or
    /// non-finite notional or hazard rate, or tranche bounds outside
    /// `0 <= attachment <= detachment <= 1`.
    pub fn new(
        reference_date: Date,
        notional: f64,
        hazard_rates: Vec<f64>,
        attachment: f64,
        detachment: f64,
    ) -> Result<Self, LossModelError> {
        if hazard_rates.is_empty() {
            return Err(LossModelError::Config(
                "basket must contain at least one name".to_string(),
            ));
        }
        if !notional.is_finite() || notional < 0.0 {
            return Err(LossModelError::Config(format!(
                "basket notional must be finite and non-negative, got {}",
                notional
            )));
        }
        if let Some((i, h)) = hazard_rates
            .iter()
            .enumerate()
            .find(|(_, h)| !h.is_finite() || **h < 0.0)
        {
            return Err(LossModelError::Config(format!(
                "hazard rate of name {} must be finite and non-negative, got {}",
                i, h
            )));
        }
        if !(0.0..=1.0).contains(&attachment)
            || !(0.0..=1.0).contains(&detachment)
            || attachment > detachment
        {
            return Err(LossModelError::Config(format!(
                "tranche bounds must satisfy 0 <= attachment <= detachment <= 1, got [{}, {}]",
                attachment, detachment
            )));
        }

        let n = hazard_rates.len();
        Ok(Self {
            reference_date,
            day_count: DayCountConvention::default(),
            notional,
            hazard_rates,
            defaults: vec![None; n],
            attachment,
            detachment,
        })
    }

    /// Sets the day count used to convert dates into hazard times.
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Marks name `index` as defaulted on `date` with the given realised
    /// recovery.
    ///
    /// # Errors
    /// `LossModelError::Config` if `index` is out of range or `recovery` is
    /// outside [0, 1].
    pub fn with_default(
        mut self,
        index: usize,
        date: Date,
        recovery: f64,
    ) -> Result<Self, LossModelError> {
        if index >= self.hazard_rates.len() {
            return Err(LossModelError::Config(format!(
                "defaulted name {} outside basket of {} names",
                index,
                self.hazard_rates.len()
            )));
        }
        if !(0.0..=1.0).contains(&recovery) {
            return Err(LossModelError::Config(format!(
                "realised recovery of name {} must be in [0, 1], got {}",
                index, recovery
            )));
        }
        self.defaults[index] = Some(RealisedDefault { date, recovery });
        Ok(self)
    }

    /// Date the hazard rates are anchored to.
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// Day count used for hazard times.
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Tranche attachment as a fraction of the original notional.
    pub fn attachment(&self) -> f64 {
        self.attachment
    }

    /// Tranche detachment as a fraction of the original notional.
    pub fn detachment(&self) -> f64 {
        self.detachment
    }

    #[inline]
    fn name_notional(&self) -> f64 {
        self.notional / self.hazard_rates.len() as f64
    }

    #[inline]
    fn is_alive(&self, index: usize, date: Date) -> bool {
        match self.defaults[index] {
            Some(default) => default.date > date,
            None => true,
        }
    }

    /// Loss realised by names that defaulted on or before `date`.
    pub fn realised_loss(&self, date: Date) -> f64 {
        let unit = self.name_notional();
        self.defaults
            .iter()
            .flatten()
            .filter(|d| d.date <= date)
            .map(|d| unit * (1.0 - d.recovery))
            .sum()
    }
}

impl LossBasket for FlatHazardBasket {
    fn size(&self) -> usize {
        self.hazard_rates.len()
    }

    fn remaining_notional(&self, date: Date) -> f64 {
        self.live_names(date).len() as f64 * self.name_notional()
    }

    fn remaining_attachment_amount(&self, date: Date) -> f64 {
        (self.attachment * self.notional - self.realised_loss(date)).max(0.0)
    }

    fn remaining_detachment_amount(&self, date: Date) -> f64 {
        (self.detachment * self.notional - self.realised_loss(date)).max(0.0)
    }

    fn live_names(&self, date: Date) -> Vec<usize> {
        (0..self.hazard_rates.len())
            .filter(|&i| self.is_alive(i, date))
            .collect()
    }

    fn remaining_default_probabilities(&self, date: Date) -> Vec<f64> {
        let t = self
            .day_count
            .year_fraction(self.reference_date, date)
            .max(0.0);
        self.live_names(date)
            .into_iter()
            .map(|i| -(-self.hazard_rates[i] * t).exp_m1())
            .collect()
    }
}
