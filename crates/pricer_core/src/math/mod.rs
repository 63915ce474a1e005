//! Mathematical building blocks for the credit loss models.
//!
//! This module provides:
//! - `distributions`: Standard normal CDF/PDF/inverse CDF and the bivariate
//!   normal CDF used by the Gaussian copula loss formulas

pub mod distributions;
