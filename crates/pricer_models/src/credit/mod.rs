//! Credit portfolio loss models.
//!
//! This module provides:
//! - [`GaussianLhpModel`]: One-factor Gaussian copula under the large
//!   homogeneous pool approximation, with closed-form expected tranche
//!   loss, tail probabilities, percentiles and expected shortfall
//! - [`LossBasket`]: The portfolio capability the models query
//! - [`FlatHazardBasket`]: Equal-weight flat hazard basket
//! - [`SimpleQuote`] / [`ObservableValue`]: Refreshable model inputs
//! - [`LhpModelConfig`] / [`BasketConfig`]: TOML configuration
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::time::Date;
//! use pricer_models::credit::{FlatHazardBasket, GaussianLhpModel};
//!
//! let today = Date::from_ymd(2026, 3, 20).unwrap();
//! let horizon = Date::from_ymd(2029, 3, 20).unwrap();
//! let basket = FlatHazardBasket::new(today, 100.0, vec![0.015; 50], 0.0, 0.03).unwrap();
//! let model = GaussianLhpModel::new(0.25, vec![0.4; 50]).unwrap();
//!
//! // The equity tranche is hit with certainty at zero loss fraction
//! assert_eq!(model.prob_over_loss(&basket, horizon, 0.0).unwrap(), 1.0);
//!
//! let q50 = model.percentile(&basket, horizon, 0.5).unwrap();
//! let q99 = model.percentile(&basket, horizon, 0.99).unwrap();
//! assert!(q50 <= q99);
//! ```

mod basket;
mod config;
mod error;
mod lhp;
mod quote;

pub use basket::{FlatHazardBasket, LossBasket};
pub use config::{BasketConfig, DefaultConfig, LhpModelConfig, RecoveryConfig};
pub use error::LossModelError;
pub use lhp::{GaussianLhpModel, LhpParameters};
pub use quote::{ObservableValue, SimpleQuote};
