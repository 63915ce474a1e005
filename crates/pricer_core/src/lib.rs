//! # pricer_core: Numerical Foundation for Credit Loss Models
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace and provides:
//! - Univariate and bivariate normal distribution functions (`math::distributions`)
//! - Time types: `Date`, `DayCountConvention` (`types::time`)
//! - Error types: `PricingError`, `DateError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - statrs: Double precision `erfc` and its inverse
//! - chrono: Date arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::math::distributions::{bivariate_norm_cdf, inverse_norm_cdf, norm_cdf};
//! use pricer_core::types::{Date, DayCountConvention};
//!
//! // Date operations
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2024, 7, 1).unwrap();
//! let yf = DayCountConvention::Actual365Fixed.year_fraction(start, end);
//! assert!((yf - 0.4986).abs() < 1e-3);
//!
//! // Normal distribution round trip
//! let x = inverse_norm_cdf(0.975);
//! assert!((norm_cdf(x) - 0.975).abs() < 1e-14);
//!
//! // Independent normals: P(X <= 0, Y <= 0) = 1/4
//! assert!((bivariate_norm_cdf(0.0, 0.0, 0.0) - 0.25).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for `Date` and `DayCountConvention`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;
