//! Normal distribution functions.
//!
//! - [`normal`]: Univariate standard normal `norm_pdf`, `norm_cdf`, `inverse_norm_cdf`
//! - [`bivariate`]: Bivariate standard normal CDF (Genz 2004)
//!
//! All functions operate on `f64`. The loss models evaluate the inverse CDF
//! at probabilities as small as `1e-12` and as large as `1 - 1e-12`, so
//! the univariate functions are built on double precision `erfc` rather
//! than a short polynomial approximation.

pub mod bivariate;
pub mod normal;

pub use bivariate::{bivariate_norm_cdf, BivariateNormal};
pub use normal::{inverse_norm_cdf, norm_cdf, norm_pdf};
