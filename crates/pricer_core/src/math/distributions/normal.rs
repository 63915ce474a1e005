//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_pdf`: Probability density function φ
//! - `norm_cdf`: Cumulative distribution function Φ
//! - `inverse_norm_cdf`: Quantile function Φ⁻¹
//!
//! `norm_cdf` and `inverse_norm_cdf` are expressed through the
//! complementary error function so that both tails keep full relative
//! precision.

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal probability density function.
///
/// # Mathematical Definition
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0) - 0.3989422804014327).abs() < 1e-15);
/// assert_eq!(norm_pdf(1.5), norm_pdf(-1.5));
/// ```
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) where X ~ N(0, 1).
///
/// # Mathematical Definition
/// Φ(x) = (1/2) * erfc(-x / sqrt(2))
///
/// Saturates to exactly 0 and 1 at `-∞` and `+∞`.
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_cdf;
///
/// assert_eq!(norm_cdf(0.0), 0.5);
/// assert!((norm_cdf(1.0) - 0.8413447460685429).abs() < 1e-15);
/// assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    0.5 * erfc(-x / SQRT_2)
}

/// Inverse of the standard normal cumulative distribution function.
///
/// # Mathematical Definition
/// Φ⁻¹(p) = -sqrt(2) * erfc⁻¹(2p)
///
/// # Returns
/// - `-∞` for `p == 0`, `+∞` for `p == 1`
/// - `NaN` for `p` outside `[0, 1]` or `NaN`
///
/// # Accuracy
/// Relative accuracy close to machine precision across `[1e-300, 1 - 1e-16]`,
/// which covers the `1e-12` guard band used by the loss models.
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::{inverse_norm_cdf, norm_cdf};
///
/// assert_eq!(inverse_norm_cdf(0.5), 0.0);
/// let x = inverse_norm_cdf(1e-12);
/// assert!((norm_cdf(x) / 1e-12 - 1.0).abs() < 1e-10);
/// assert!(inverse_norm_cdf(1.5).is_nan());
/// ```
pub fn inverse_norm_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}
