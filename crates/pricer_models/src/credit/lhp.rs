//! Gaussian copula large homogeneous pool (LHP) tranche loss model.
//!
//! Under the one-factor Gaussian copula every name defaults when
//! `sqrt(ρ) M + sqrt(1 - ρ) Zᵢ < Φ⁻¹(p)`. In the limit of infinitely many
//! identical names the portfolio loss fraction conditional on the factor
//! `M` is deterministic:
//!
//! ```text
//! L(M) = (1 - a) Φ((Φ⁻¹(p) - sqrt(ρ) M) / sqrt(1 - ρ))
//! ```
//!
//! which yields closed forms for the loss distribution, its percentiles,
//! the expected tranche loss and the expected shortfall. Heterogeneous
//! baskets are collapsed onto a single name by averaging the remaining
//! default probabilities and recovery rates.
//!
//! # References
//! - Vasicek, O. (2002). "The distribution of loan portfolio value". Risk.
//! - O'Kane, D. (2008). "Modelling Single-name and Multi-name Credit
//!   Derivatives", chapter 16. Wiley.

use std::fmt;
use std::sync::Arc;

use pricer_core::math::distributions::{inverse_norm_cdf, norm_cdf, BivariateNormal};
use pricer_core::types::time::Date;

use super::basket::LossBasket;
use super::error::LossModelError;
use super::quote::ObservableValue;

/// Largest level fed to Φ⁻¹ when converting tranche limits, keeping the
/// inverse finite.
const MAX_LIMIT_FRACTION: f64 = 1.0 - 1.0e-12;

/// Derived constants of the one-factor Gaussian copula.
///
/// Built from a validated correlation and never mutated; a model swaps in
/// a new value on refresh.
///
/// # Examples
/// ```
/// use pricer_models::credit::LhpParameters;
///
/// let params = LhpParameters::new(0.36).unwrap();
/// assert!((params.beta() - 0.6).abs() < 1e-15);
/// assert!((params.sqrt_one_minus_correlation() - 0.8).abs() < 1e-15);
/// assert!(LhpParameters::new(1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LhpParameters {
    correlation: f64,
    sqrt_one_minus_correlation: f64,
    beta: f64,
    biphi: BivariateNormal,
}

impl LhpParameters {
    /// Derives the copula constants for a factor correlation in `[0, 1)`.
    ///
    /// # Errors
    /// `LossModelError::InvalidCorrelation` for correlations outside
    /// `[0, 1)` or NaN.
    pub fn new(correlation: f64) -> Result<Self, LossModelError> {
        if !(0.0..1.0).contains(&correlation) {
            return Err(LossModelError::InvalidCorrelation { correlation });
        }
        let sqrt_one_minus_correlation = (1.0 - correlation).sqrt();
        // Correlation of (Φ⁻¹(p), -Φ⁻¹(L/(1-a))) in the stop-loss integral
        let biphi = BivariateNormal::new(-sqrt_one_minus_correlation)
            .ok_or(LossModelError::InvalidCorrelation { correlation })?;
        Ok(Self {
            correlation,
            sqrt_one_minus_correlation,
            beta: correlation.sqrt(),
            biphi,
        })
    }

    /// Factor correlation ρ.
    #[inline]
    pub fn correlation(&self) -> f64 {
        self.correlation
    }

    /// sqrt(1 - ρ), the idiosyncratic loading.
    #[inline]
    pub fn sqrt_one_minus_correlation(&self) -> f64 {
        self.sqrt_one_minus_correlation
    }

    /// sqrt(ρ), the systematic factor loading.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

/// Tranche and pool quantities a query needs, read once from the basket.
#[derive(Debug, Clone, Copy)]
struct TrancheState {
    remaining_notional: f64,
    attach: f64,
    detach: f64,
    probability: f64,
    recovery: f64,
}

/// Remaining tranche amount as a fraction of the remaining pool, capped
/// at 1. A fully amortised pool saturates at 1.
#[inline]
fn pool_fraction(amount: f64, remaining_notional: f64) -> f64 {
    if remaining_notional <= 0.0 {
        return 1.0;
    }
    (amount / remaining_notional).min(1.0)
}

/// Gaussian copula LHP loss model.
///
/// Holds the factor correlation and one recovery rate per basket name.
/// Both can be bound to [`ObservableValue`] sources; bound sources are
/// re-read only by [`GaussianLhpModel::update`], so queries always see a
/// consistent set of derived constants.
///
/// # Examples
/// ```
/// use pricer_core::types::time::Date;
/// use pricer_models::credit::{FlatHazardBasket, GaussianLhpModel};
///
/// let model = GaussianLhpModel::new(0.2, vec![0.4; 125]).unwrap();
///
/// let today = Date::from_ymd(2026, 3, 20).unwrap();
/// let horizon = Date::from_ymd(2031, 3, 20).unwrap();
/// let basket = FlatHazardBasket::new(today, 1.0e7, vec![0.012; 125], 0.03, 0.07).unwrap();
///
/// let etl = model.expected_tranche_loss(&basket, horizon).unwrap();
/// assert!(etl > 0.0 && etl < 0.04 * 1.0e7);
///
/// let es = model.expected_shortfall(&basket, horizon, 0.99).unwrap();
/// assert!(es >= etl);
/// ```
#[derive(Clone)]
pub struct GaussianLhpModel {
    parameters: LhpParameters,
    recoveries: Vec<f64>,
    correlation_source: Option<Arc<dyn ObservableValue>>,
    recovery_sources: Option<Vec<Arc<dyn ObservableValue>>>,
}

impl fmt::Debug for GaussianLhpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaussianLhpModel")
            .field("parameters", &self.parameters)
            .field("recoveries", &self.recoveries)
            .field("correlation_bound", &self.correlation_source.is_some())
            .field("recoveries_bound", &self.recovery_sources.is_some())
            .finish()
    }
}

fn validate_recoveries(recoveries: &[f64]) -> Result<(), LossModelError> {
    match recoveries
        .iter()
        .enumerate()
        .find(|(_, r)| !(0.0..=1.0).contains(*r))
    {
        Some((index, &recovery)) => Err(LossModelError::InvalidRecovery { index, recovery }),
        None => Ok(()),
    }
}

impl GaussianLhpModel {
    /// Creates a model from literal inputs.
    ///
    /// # Arguments
    /// * `correlation` - Factor correlation ρ in `[0, 1)`
    /// * `recoveries` - Recovery rate of each basket name, in basket order
    ///
    /// # Errors
    /// `InvalidCorrelation` or `InvalidRecovery` on out-of-range inputs.
    pub fn new(correlation: f64, recoveries: Vec<f64>) -> Result<Self, LossModelError> {
        let parameters = LhpParameters::new(correlation)?;
        validate_recoveries(&recoveries)?;
        tracing::debug!(
            correlation,
            names = recoveries.len(),
            "Gaussian LHP model created"
        );
        Ok(Self {
            parameters,
            recoveries,
            correlation_source: None,
            recovery_sources: None,
        })
    }

    /// Binds the correlation to an observable source and reads it.
    ///
    /// # Errors
    /// Propagates the validation failure of the initial refresh.
    pub fn with_correlation_source(
        mut self,
        source: Arc<dyn ObservableValue>,
    ) -> Result<Self, LossModelError> {
        self.correlation_source = Some(source);
        self.update()?;
        Ok(self)
    }

    /// Binds the recovery rates to observable sources, one per name, and
    /// reads them.
    ///
    /// # Errors
    /// `BasketSizeMismatch` if the number of sources differs from the
    /// number of names; otherwise the validation failure of the initial
    /// refresh.
    pub fn with_recovery_sources(
        mut self,
        sources: Vec<Arc<dyn ObservableValue>>,
    ) -> Result<Self, LossModelError> {
        if sources.len() != self.recoveries.len() {
            return Err(LossModelError::BasketSizeMismatch {
                basket: sources.len(),
                model: self.recoveries.len(),
            });
        }
        self.recovery_sources = Some(sources);
        self.update()?;
        Ok(self)
    }

    /// Re-reads bound sources and recomputes the derived constants.
    ///
    /// The refresh is all-or-nothing: on error the model keeps its
    /// previous state.
    pub fn update(&mut self) -> Result<(), LossModelError> {
        let correlation = match &self.correlation_source {
            Some(source) => source.value(),
            None => self.parameters.correlation(),
        };
        let parameters = LhpParameters::new(correlation)?;

        let recoveries = match &self.recovery_sources {
            Some(sources) => {
                let values: Vec<f64> = sources.iter().map(|s| s.value()).collect();
                validate_recoveries(&values)?;
                Some(values)
            }
            None => None,
        };

        self.parameters = parameters;
        if let Some(values) = recoveries {
            self.recoveries = values;
        }
        tracing::debug!(
            correlation,
            beta = self.parameters.beta(),
            "Gaussian LHP parameters refreshed"
        );
        Ok(())
    }

    /// Replaces the correlation with a literal value, unbinding any
    /// correlation source.
    pub fn set_correlation(&mut self, correlation: f64) -> Result<(), LossModelError> {
        self.parameters = LhpParameters::new(correlation)?;
        self.correlation_source = None;
        tracing::debug!(correlation, "Gaussian LHP correlation set");
        Ok(())
    }

    /// Current copula constants.
    pub fn parameters(&self) -> &LhpParameters {
        &self.parameters
    }

    /// Current factor correlation.
    pub fn correlation(&self) -> f64 {
        self.parameters.correlation()
    }

    /// Current recovery rates, in basket order.
    pub fn recoveries(&self) -> &[f64] {
        &self.recoveries
    }

    /// Number of names the model holds recoveries for.
    pub fn size(&self) -> usize {
        self.recoveries.len()
    }

    /// Checks that `basket` has one name per recovery input.
    pub fn check_basket<B: LossBasket + ?Sized>(&self, basket: &B) -> Result<(), LossModelError> {
        if basket.size() != self.recoveries.len() {
            return Err(LossModelError::BasketSizeMismatch {
                basket: basket.size(),
                model: self.recoveries.len(),
            });
        }
        Ok(())
    }

    /// Expected tranche loss in closed form.
    ///
    /// # Arguments
    /// * `remaining_notional` - Live pool notional R
    /// * `probability` - Average default probability p of the live names
    /// * `average_recovery` - Average recovery a of the live names
    /// * `attach_limit` - Attachment as a fraction of R
    /// * `detach_limit` - Detachment as a fraction of R
    ///
    /// # Mathematical Definition
    /// With `kᵢ = min(1 - 1e-12, limitᵢ / (1 - a)) + ε` and
    /// `Φ₂(·, ·; -sqrt(1-ρ))`:
    ///
    /// ```text
    /// ETL = R (1 - a) [Φ₂(-Φ⁻¹(k₁), Φ⁻¹(p)) - Φ₂(-Φ⁻¹(k₂), Φ⁻¹(p))]
    /// ```
    ///
    /// Returns 0 for an empty or inverted tranche, zero notional, zero
    /// default probability or a recovery of 100%, and NaN for a NaN
    /// probability.
    ///
    /// # Examples
    /// ```
    /// use pricer_models::credit::GaussianLhpModel;
    ///
    /// let model = GaussianLhpModel::new(0.2, vec![0.4]).unwrap();
    /// let etl = model.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.03, 0.07);
    /// assert!((etl - 3.907814799465e-4).abs() < 1e-13);
    ///
    /// // Inverted tranche
    /// assert_eq!(model.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.07, 0.03), 0.0);
    /// ```
    pub fn expected_tranche_loss_impl(
        &self,
        remaining_notional: f64,
        probability: f64,
        average_recovery: f64,
        attach_limit: f64,
        detach_limit: f64,
    ) -> f64 {
        if attach_limit >= detach_limit || remaining_notional == 0.0 {
            tracing::debug!(
                attach_limit,
                detach_limit,
                remaining_notional,
                "Degenerate tranche, expected loss is zero"
            );
            return 0.0;
        }
        if probability.is_nan() {
            return f64::NAN;
        }
        let max_loss = 1.0 - average_recovery;
        if max_loss <= 0.0 || probability <= 0.0 {
            return 0.0;
        }

        let k1 = (attach_limit / max_loss).min(MAX_LIMIT_FRACTION) + f64::EPSILON;
        let k2 = (detach_limit / max_loss).min(MAX_LIMIT_FRACTION) + f64::EPSILON;
        let ip = inverse_norm_cdf(probability.min(1.0));
        let biphi = &self.parameters.biphi;

        let upper = biphi.cdf(-inverse_norm_cdf(k2), ip);
        let lower = if k1 > 0.0 {
            biphi.cdf(-inverse_norm_cdf(k1), ip)
        } else {
            probability
        };
        tracing::trace!(k1, k2, ip, lower, upper, "LHP tranche loss terms");

        remaining_notional * max_loss * (lower - upper)
    }

    /// Mean remaining default probability of the live names at `date`.
    ///
    /// # Errors
    /// `EmptyBasket` when no name is alive.
    pub fn average_probability<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
    ) -> Result<f64, LossModelError> {
        let probabilities = basket.remaining_default_probabilities(date);
        if probabilities.is_empty() {
            return Err(LossModelError::EmptyBasket {
                date: date.to_string(),
            });
        }
        Ok(probabilities.iter().sum::<f64>() / probabilities.len() as f64)
    }

    /// Mean recovery rate of the live names at `date`.
    ///
    /// # Errors
    /// `EmptyBasket` when no name is alive, `BasketSizeMismatch` when a
    /// live name has no recovery input.
    pub fn average_recovery<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
    ) -> Result<f64, LossModelError> {
        let live = basket.live_names(date);
        if live.is_empty() {
            return Err(LossModelError::EmptyBasket {
                date: date.to_string(),
            });
        }
        let mut total = 0.0;
        for &index in &live {
            total += self.recoveries.get(index).copied().ok_or(
                LossModelError::BasketSizeMismatch {
                    basket: index + 1,
                    model: self.recoveries.len(),
                },
            )?;
        }
        Ok(total / live.len() as f64)
    }

    fn tranche_state<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
    ) -> Result<TrancheState, LossModelError> {
        self.check_basket(basket)?;
        let remaining_notional = basket.remaining_notional(date);
        let state = TrancheState {
            remaining_notional,
            attach: pool_fraction(basket.remaining_attachment_amount(date), remaining_notional),
            detach: pool_fraction(basket.remaining_detachment_amount(date), remaining_notional),
            probability: self.average_probability(basket, date)?,
            recovery: self.average_recovery(basket, date)?,
        };
        tracing::trace!(
            %date,
            remaining_notional,
            attach = state.attach,
            detach = state.detach,
            probability = state.probability,
            recovery = state.recovery,
            "LHP tranche state"
        );
        Ok(state)
    }

    /// Expected loss of the basket's tranche up to `date`, in currency
    /// units.
    pub fn expected_tranche_loss<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
    ) -> Result<f64, LossModelError> {
        let s = self.tranche_state(basket, date)?;
        Ok(self.expected_tranche_loss_impl(
            s.remaining_notional,
            s.probability,
            s.recovery,
            s.attach,
            s.detach,
        ))
    }

    /// Probability that the tranche loses at least `loss_fraction` of its
    /// remaining notional by `date`.
    ///
    /// For a mezzanine tranche `loss_fraction = 0` gives `P(L ≥ attach)`;
    /// the probability mass of a zero tranche loss is not included.
    ///
    /// # Errors
    /// `InvalidLossFraction` for `loss_fraction` outside `[0, 1]`.
    pub fn prob_over_loss<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
        loss_fraction: f64,
    ) -> Result<f64, LossModelError> {
        if !(0.0..=1.0).contains(&loss_fraction) {
            return Err(LossModelError::InvalidLossFraction {
                fraction: loss_fraction,
            });
        }
        let s = self.tranche_state(basket, date)?;
        Ok(self.tail_probability(&s, loss_fraction))
    }

    fn tail_probability(&self, s: &TrancheState, loss_fraction: f64) -> f64 {
        let portfolio_fraction = s.attach + loss_fraction * (s.detach - s.attach);
        let max_loss = 1.0 - s.recovery;
        if portfolio_fraction > max_loss {
            return 0.0;
        }
        if portfolio_fraction <= f64::EPSILON {
            return 1.0;
        }
        if s.probability <= 0.0 {
            return 0.0;
        }
        if s.probability >= 1.0 {
            return 1.0;
        }

        let p = &self.parameters;
        let numerator = inverse_norm_cdf(s.probability)
            - p.sqrt_one_minus_correlation() * inverse_norm_cdf(portfolio_fraction / max_loss);
        if p.beta() == 0.0 {
            // Independent defaults: the pool loss is deterministic
            return if numerator >= 0.0 { 1.0 } else { 0.0 };
        }
        norm_cdf(numerator / p.beta())
    }

    /// Pool loss fraction not exceeded with probability `percentile`.
    ///
    /// # Mathematical Definition
    /// `(1 - a) Φ((Φ⁻¹(p) + sqrt(ρ) Φ⁻¹(q)) / sqrt(1 - ρ))`, with `q = 1`
    /// replaced by `1 - ε`.
    ///
    /// # Errors
    /// `InvalidPercentile` for `percentile` outside `[0, 1]`.
    pub fn percentile_portfolio_loss_fraction<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
        percentile: f64,
    ) -> Result<f64, LossModelError> {
        validate_percentile(percentile)?;
        let s = self.tranche_state(basket, date)?;
        Ok(self.percentile_loss_fraction(&s, percentile))
    }

    fn percentile_loss_fraction(&self, s: &TrancheState, percentile: f64) -> f64 {
        if percentile == 0.0 {
            return 0.0;
        }
        let q = if percentile == 1.0 {
            1.0 - f64::EPSILON
        } else {
            percentile
        };
        let p = &self.parameters;
        (1.0 - s.recovery)
            * norm_cdf(
                (inverse_norm_cdf(s.probability) + p.beta() * inverse_norm_cdf(q))
                    / p.sqrt_one_minus_correlation(),
            )
    }

    /// Tranche loss amount at `percentile`, in currency units.
    ///
    /// # Errors
    /// `InvalidPercentile` for `percentile` outside `[0, 1]`.
    pub fn percentile<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
        percentile: f64,
    ) -> Result<f64, LossModelError> {
        validate_percentile(percentile)?;
        let s = self.tranche_state(basket, date)?;
        let loss = self.percentile_loss_fraction(&s, percentile);
        Ok(tranche_loss_at(&s, loss))
    }

    /// Expected tranche loss beyond the `percentile` level, in currency
    /// units.
    ///
    /// Once the percentile pool loss reaches the detachment point the
    /// result is the whole remaining tranche notional.
    ///
    /// # Errors
    /// `InvalidPercentile` for `percentile` outside `[0, 1]`.
    pub fn expected_shortfall<B: LossBasket + ?Sized>(
        &self,
        basket: &B,
        date: Date,
        percentile: f64,
    ) -> Result<f64, LossModelError> {
        validate_percentile(percentile)?;
        let s = self.tranche_state(basket, date)?;
        if s.attach >= s.detach {
            return Ok(0.0);
        }
        if self.parameters.beta() == 0.0 {
            // Independent defaults: the pool loses (1 - a) p in every state
            return Ok(tranche_loss_at(&s, (1.0 - s.recovery) * s.probability));
        }

        let loss = self.percentile_loss_fraction(&s, percentile);
        if loss >= s.detach - f64::EPSILON {
            return Ok(s.remaining_notional * (s.detach - s.attach));
        }
        if 1.0 - percentile <= f64::EPSILON {
            tracing::warn!(
                percentile,
                loss,
                "Shortfall at the top percentile, returning the tranche loss at that level"
            );
            return Ok(tranche_loss_at(&s, loss));
        }

        let level = s.attach.max(loss);
        let above = self.expected_tranche_loss_impl(
            s.remaining_notional,
            s.probability,
            s.recovery,
            level,
            s.detach,
        );
        let level_fraction = ((level - s.attach) / (s.detach - s.attach)).clamp(0.0, 1.0);
        let over = self.tail_probability(&s, level_fraction);
        tracing::trace!(percentile, loss, above, over, "LHP shortfall terms");

        Ok((above + (level - s.attach) * s.remaining_notional * over) / (1.0 - percentile))
    }
}

fn validate_percentile(percentile: f64) -> Result<(), LossModelError> {
    if !(0.0..=1.0).contains(&percentile) {
        return Err(LossModelError::InvalidPercentile { percentile });
    }
    Ok(())
}

#[inline]
fn tranche_loss_at(s: &TrancheState, pool_loss: f64) -> f64 {
    s.remaining_notional * (pool_loss - s.attach).max(0.0).min(s.detach - s.attach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::basket::FlatHazardBasket;
    use crate::credit::quote::SimpleQuote;
    use approx::assert_relative_eq;

    const SCENARIO_ETL: f64 = 3.907_814_799_465_260_3e-4;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    /// One year (365 days) horizon with a default probability of `p`.
    fn scenario(p: f64, attach: f64, detach: f64) -> (FlatHazardBasket, Date) {
        let hazard = -(-p).ln_1p();
        let basket =
            FlatHazardBasket::new(date(2025, 1, 1), 1.0, vec![hazard; 10], attach, detach)
                .unwrap();
        (basket, date(2026, 1, 1))
    }

    fn model(rho: f64) -> GaussianLhpModel {
        GaussianLhpModel::new(rho, vec![0.4; 10]).unwrap()
    }

    fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        let mut sum = f(a) + f(b);
        for i in 1..n {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += w * f(a + i as f64 * h);
        }
        sum * h / 3.0
    }

    #[test]
    fn test_parameters_reject_out_of_range_correlation() {
        assert!(LhpParameters::new(0.0).is_ok());
        assert!(LhpParameters::new(0.999).is_ok());
        for rho in [-0.1, 1.0, 1.5, f64::NAN] {
            assert!(matches!(
                LhpParameters::new(rho),
                Err(LossModelError::InvalidCorrelation { .. })
            ));
        }
    }

    #[test]
    fn test_new_rejects_invalid_recovery() {
        let err = GaussianLhpModel::new(0.3, vec![0.4, 1.2, 0.4]).unwrap_err();
        assert_eq!(
            err,
            LossModelError::InvalidRecovery {
                index: 1,
                recovery: 1.2
            }
        );
        assert!(GaussianLhpModel::new(0.3, vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_scenario_expected_tranche_loss() {
        let m = model(0.2);
        let etl = m.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.03, 0.07);
        assert_relative_eq!(etl, SCENARIO_ETL, max_relative = 1e-9);
        assert!(etl >= 0.0 && etl <= 0.04);

        // Deterministic
        let again = m.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.03, 0.07);
        assert_eq!(etl.to_bits(), again.to_bits());
    }

    #[test]
    fn test_expected_tranche_loss_scales_with_notional() {
        let m = model(0.3);
        assert_relative_eq!(
            m.expected_tranche_loss_impl(1.0, 0.02, 0.4, 0.0, 0.03),
            0.008_755_847_375_161_817,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            m.expected_tranche_loss_impl(100.0, 0.02, 0.4, 0.03, 0.07),
            0.224_303_910_881_641_03,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_expected_tranche_loss_zero_cases() {
        let m = model(0.2);
        assert_eq!(m.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.07, 0.07), 0.0);
        assert_eq!(m.expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.1, 0.07), 0.0);
        assert_eq!(m.expected_tranche_loss_impl(0.0, 0.01, 0.4, 0.03, 0.07), 0.0);
        assert_eq!(m.expected_tranche_loss_impl(1.0, 0.0, 0.4, 0.03, 0.07), 0.0);
        assert_eq!(m.expected_tranche_loss_impl(1.0, 0.01, 1.0, 0.03, 0.07), 0.0);
    }

    #[test]
    fn test_full_capital_structure_loses_expected_pool_loss() {
        // E[L] = p (1 - a) whatever the correlation
        for rho in [0.0, 0.1, 0.5, 0.9] {
            let etl = model(rho).expected_tranche_loss_impl(1.0, 0.01, 0.4, 0.0, 1.0);
            assert_relative_eq!(etl, 0.006, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_expected_tranche_loss_is_integral_of_tail() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        let integral = simpson(
            |f| m.prob_over_loss(&basket, d, f).unwrap(),
            0.0,
            1.0,
            4000,
        ) * 0.04;
        let etl = m.expected_tranche_loss(&basket, d).unwrap();
        assert_relative_eq!(etl, SCENARIO_ETL, max_relative = 1e-9);
        assert_relative_eq!(etl, integral, max_relative = 1e-6);
    }

    #[test]
    fn test_zero_correlation_is_deterministic() {
        let m = model(0.0);
        // Pool loses 10% * 60% = 6%, the 3-7% tranche loses 3%
        assert_relative_eq!(
            m.expected_tranche_loss_impl(1.0, 0.1, 0.4, 0.03, 0.07),
            0.03,
            epsilon = 1e-9
        );

        let (basket, d) = scenario(0.1, 0.03, 0.07);
        for (f, expected) in [(0.0, 1.0), (0.5, 1.0), (0.7, 1.0), (0.8, 0.0), (1.0, 0.0)] {
            assert_eq!(m.prob_over_loss(&basket, d, f).unwrap(), expected);
        }
    }

    #[test]
    fn test_zero_correlation_shortfall_is_deterministic_loss() {
        // Pool loses 10% * 60% = 6%, the 3-9% tranche loses 3% in every state
        let m = model(0.0);
        let (basket, d) = scenario(0.1, 0.03, 0.09);
        let etl = m.expected_tranche_loss(&basket, d).unwrap();
        assert_relative_eq!(etl, 0.03, max_relative = 1e-9);
        for q in [0.0, 0.1, 0.5, 0.9, 0.999, 1.0] {
            let es = m.expected_shortfall(&basket, d, q).unwrap();
            assert_relative_eq!(es, etl, max_relative = 1e-9);
        }

        // Senior tranche untouched by the deterministic loss
        let (senior, d) = scenario(0.1, 0.1, 0.3);
        for q in [0.1, 0.5, 0.9] {
            assert_eq!(m.expected_shortfall(&senior, d, q).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_nan_probability_propagates() {
        let m = model(0.2);
        assert!(m
            .expected_tranche_loss_impl(1.0, f64::NAN, 0.4, 0.03, 0.07)
            .is_nan());
        // Degenerate tranches still short-circuit first
        assert_eq!(m.expected_tranche_loss_impl(1.0, f64::NAN, 0.4, 0.07, 0.03), 0.0);
    }

    #[test]
    fn test_prob_over_loss_values() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        let expected = [
            (0.0, 0.027_927_534_099_050_19),
            (0.5, 0.007_427_729_311_699_882),
            (1.0, 0.002_414_387_749_364_033),
        ];
        for (f, p) in expected {
            assert_relative_eq!(m.prob_over_loss(&basket, d, f).unwrap(), p, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_prob_over_loss_equity_tranche() {
        let m = model(0.2);
        let (basket, d) = scenario(0.05, 0.0, 0.1);
        assert_eq!(m.prob_over_loss(&basket, d, 0.0).unwrap(), 1.0);
        assert_relative_eq!(
            m.prob_over_loss(&basket, d, 0.1).unwrap(),
            0.718_396_952_328_857,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            m.prob_over_loss(&basket, d, 1.0).unwrap(),
            0.040_652_713_757_910_13,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_prob_over_loss_above_max_loss_is_zero() {
        // Tranche beyond the 60% maximum pool loss
        let m = model(0.2);
        let (basket, d) = scenario(0.05, 0.6, 0.8);
        assert_eq!(m.prob_over_loss(&basket, d, 0.5).unwrap(), 0.0);
    }

    #[test]
    fn test_prob_over_loss_rejects_bad_fraction() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        for f in [-0.01, 1.01, f64::NAN] {
            assert!(matches!(
                m.prob_over_loss(&basket, d, f),
                Err(LossModelError::InvalidLossFraction { .. })
            ));
        }
    }

    #[test]
    fn test_percentile_loss_fraction_values() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        let expected = [
            (0.0, 0.0),
            (0.5, 0.002_789_093_952_546_395_4),
            (0.9, 0.014_993_120_274_506_621),
            (0.99, 0.045_150_473_661_297_71),
            (0.999, 0.087_315_159_678_642_81),
        ];
        for (q, loss) in expected {
            assert_relative_eq!(
                m.percentile_portfolio_loss_fraction(&basket, d, q).unwrap(),
                loss,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_percentile_one_is_finite() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        let top = m.percentile_portfolio_loss_fraction(&basket, d, 1.0).unwrap();
        assert!(top.is_finite());
        assert_relative_eq!(top, 0.556_878_404_828_756, max_relative = 1e-6);
        assert!(top <= 0.6);
    }

    #[test]
    fn test_percentile_rejects_out_of_bounds() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        for q in [-1e-9, 1.0 + 1e-9, f64::NAN] {
            assert!(matches!(
                m.percentile_portfolio_loss_fraction(&basket, d, q),
                Err(LossModelError::InvalidPercentile { .. })
            ));
            assert!(m.expected_shortfall(&basket, d, q).is_err());
            assert!(m.percentile(&basket, d, q).is_err());
        }
    }

    #[test]
    fn test_percentile_tranche_amount() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        // Below the attachment point
        assert_eq!(m.percentile(&basket, d, 0.5).unwrap(), 0.0);
        assert_relative_eq!(
            m.percentile(&basket, d, 0.99).unwrap(),
            0.045_150_473_661_297_71 - 0.03,
            max_relative = 1e-8
        );
        // Capped at the tranche width
        assert_relative_eq!(m.percentile(&basket, d, 0.999).unwrap(), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn test_expected_shortfall_values() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);

        let es0 = m.expected_shortfall(&basket, d, 0.0).unwrap();
        let etl = m.expected_tranche_loss(&basket, d).unwrap();
        assert_relative_eq!(es0, etl, max_relative = 1e-12);

        assert_relative_eq!(
            m.expected_shortfall(&basket, d, 0.5).unwrap(),
            0.000_781_562_959_893_052_1,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            m.expected_shortfall(&basket, d, 0.95).unwrap(),
            0.007_815_629_598_930_514,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            m.expected_shortfall(&basket, d, 0.99).unwrap(),
            0.028_159_688_787_346_412,
            max_relative = 1e-8
        );
        assert_relative_eq!(
            m.expected_shortfall(&basket, d, 0.995).unwrap(),
            0.036_118_881_099_023_02,
            max_relative = 1e-8
        );
    }

    #[test]
    fn test_expected_shortfall_saturates_at_tranche_notional() {
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        for q in [0.999, 1.0] {
            assert_relative_eq!(m.expected_shortfall(&basket, d, q).unwrap(), 0.04, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_expected_shortfall_top_percentile_below_detach() {
        // Senior tranche never reached even at q = 1 - ε
        let m = model(0.2);
        let (basket, d) = scenario(0.01, 0.3, 0.59);
        let es = m.expected_shortfall(&basket, d, 1.0).unwrap();
        let top = m.percentile_portfolio_loss_fraction(&basket, d, 1.0).unwrap();
        assert!(es.is_finite());
        assert_relative_eq!(es, top - 0.3, max_relative = 1e-12);
    }

    #[test]
    fn test_average_inputs() {
        let today = date(2025, 1, 1);
        let basket = FlatHazardBasket::new(today, 4.0, vec![0.01, 0.02, 0.03, 0.04], 0.0, 0.1)
            .unwrap()
            .with_default(2, date(2025, 3, 1), 0.2)
            .unwrap();
        let m = GaussianLhpModel::new(0.3, vec![0.1, 0.2, 0.9, 0.6]).unwrap();

        let d = date(2026, 1, 1);
        assert_relative_eq!(m.average_recovery(&basket, d).unwrap(), 0.3, epsilon = 1e-15);
        let expected = [0.01, 0.02, 0.04]
            .iter()
            .map(|h: &f64| -(-h).exp_m1())
            .sum::<f64>()
            / 3.0;
        assert_relative_eq!(m.average_probability(&basket, d).unwrap(), expected, epsilon = 1e-15);

        // Before the default all four names are live
        let early = date(2025, 2, 1);
        assert_relative_eq!(m.average_recovery(&basket, early).unwrap(), 0.45, epsilon = 1e-15);
    }

    #[test]
    fn test_empty_basket_is_an_error() {
        let today = date(2025, 1, 1);
        let basket = FlatHazardBasket::new(today, 1.0, vec![0.01], 0.0, 0.1)
            .unwrap()
            .with_default(0, today, 0.4)
            .unwrap();
        let m = GaussianLhpModel::new(0.3, vec![0.4]).unwrap();
        assert!(matches!(
            m.expected_tranche_loss(&basket, date(2026, 1, 1)),
            Err(LossModelError::EmptyBasket { .. })
        ));
    }

    #[test]
    fn test_basket_size_mismatch() {
        let (basket, d) = scenario(0.01, 0.03, 0.07);
        let m = GaussianLhpModel::new(0.2, vec![0.4; 9]).unwrap();
        assert_eq!(
            m.check_basket(&basket),
            Err(LossModelError::BasketSizeMismatch {
                basket: 10,
                model: 9
            })
        );
        assert!(m.expected_tranche_loss(&basket, d).is_err());
        assert!(matches!(
            m.average_recovery(&basket, d),
            Err(LossModelError::BasketSizeMismatch { basket: 10, .. })
        ));
    }

    #[test]
    fn test_zero_notional_pool() {
        let m = model(0.2);
        let basket =
            FlatHazardBasket::new(date(2025, 1, 1), 0.0, vec![0.01; 10], 0.03, 0.07).unwrap();
        let d = date(2026, 1, 1);
        assert_eq!(m.expected_tranche_loss(&basket, d).unwrap(), 0.0);
        assert_eq!(m.expected_shortfall(&basket, d, 0.9).unwrap(), 0.0);
        assert_eq!(m.prob_over_loss(&basket, d, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_update_rereads_bound_sources() {
        let correlation = SimpleQuote::new(0.2);
        let recovery = SimpleQuote::new(0.4);
        let sources: Vec<Arc<dyn ObservableValue>> =
            (0..10).map(|_| Arc::new(recovery.clone()) as Arc<dyn ObservableValue>).collect();
        let mut m = GaussianLhpModel::new(0.5, vec![0.0; 10])
            .unwrap()
            .with_correlation_source(Arc::new(correlation.clone()))
            .unwrap()
            .with_recovery_sources(sources)
            .unwrap();
        assert_eq!(m.correlation(), 0.2);
        assert!(m.recoveries().iter().all(|&r| r == 0.4));

        // Setting a quote has no effect until the model is refreshed
        correlation.set_value(0.3);
        recovery.set_value(0.5);
        assert_eq!(m.correlation(), 0.2);
        m.update().unwrap();
        assert_eq!(m.correlation(), 0.3);
        assert_relative_eq!(m.parameters().beta(), 0.3_f64.sqrt(), epsilon = 1e-15);
        assert!(m.recoveries().iter().all(|&r| r == 0.5));
    }

    #[test]
    fn test_failed_update_keeps_previous_state() {
        let correlation = SimpleQuote::new(0.2);
        let mut m = model(0.1)
            .with_correlation_source(Arc::new(correlation.clone()))
            .unwrap();
        correlation.set_value(1.5);
        assert!(m.update().is_err());
        assert_eq!(m.correlation(), 0.2);
    }

    #[test]
    fn test_recovery_sources_must_match_names() {
        let source: Arc<dyn ObservableValue> = Arc::new(0.4_f64);
        let sources = vec![source; 3];
        assert!(matches!(
            model(0.2).with_recovery_sources(sources),
            Err(LossModelError::BasketSizeMismatch { basket: 3, model: 10 })
        ));
    }

    #[test]
    fn test_set_correlation_unbinds_source() {
        let correlation = SimpleQuote::new(0.2);
        let mut m = model(0.1)
            .with_correlation_source(Arc::new(correlation.clone()))
            .unwrap();
        m.set_correlation(0.4).unwrap();
        correlation.set_value(0.6);
        m.update().unwrap();
        assert_eq!(m.correlation(), 0.4);
        assert!(m.set_correlation(-0.2).is_err());
    }
}
