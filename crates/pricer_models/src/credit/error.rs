//! Error types for the credit loss models.
//!
//! This module provides:
//! - `LossModelError`: Precondition and configuration failures of the
//!   large homogeneous pool model

use pricer_core::types::PricingError;
use thiserror::Error;

/// Loss model errors.
///
/// Every variant is a synchronous precondition failure of the current
/// call. Numerical singularities are avoided by nudging arguments and
/// degenerate tranches short-circuit to zero, so neither appears here.
///
/// # Examples
/// ```
/// use pricer_models::credit::LossModelError;
///
/// let err = LossModelError::InvalidPercentile { percentile: 1.2 };
/// assert_eq!(format!("{}", err), "Percentile argument out of bounds: 1.2");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LossModelError {
    /// Factor correlation outside [0, 1).
    #[error("Invalid correlation: ρ = {correlation} (must be in [0, 1))")]
    InvalidCorrelation {
        /// The rejected correlation
        correlation: f64,
    },

    /// Recovery rate outside [0, 1].
    #[error("Invalid recovery rate for name {index}: {recovery} (must be in [0, 1])")]
    InvalidRecovery {
        /// Position of the name in the recovery list
        index: usize,
        /// The rejected recovery rate
        recovery: f64,
    },

    /// Percentile outside [0, 1].
    #[error("Percentile argument out of bounds: {percentile}")]
    InvalidPercentile {
        /// The rejected percentile
        percentile: f64,
    },

    /// Tranche loss fraction outside [0, 1].
    #[error("Incorrect loss fraction: {fraction}")]
    InvalidLossFraction {
        /// The rejected loss fraction
        fraction: f64,
    },

    /// The basket has no live names at the requested date.
    #[error("Basket has no live names on {date}")]
    EmptyBasket {
        /// Requested date (ISO 8601)
        date: String,
    },

    /// Basket and model disagree on the number of names.
    #[error("Incompatible basket and model sizes: basket has {basket} names, model has {model} recoveries")]
    BasketSizeMismatch {
        /// Names in the basket (or the offending live index + 1)
        basket: usize,
        /// Recovery inputs held by the model
        model: usize,
    },

    /// Invalid model or basket configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LossModelError> for PricingError {
    fn from(err: LossModelError) -> Self {
        match err {
            LossModelError::EmptyBasket { .. } | LossModelError::BasketSizeMismatch { .. } => {
                PricingError::ModelFailure(err.to_string())
            }
            _ => PricingError::InvalidInput(err.to_string()),
        }
    }
}
