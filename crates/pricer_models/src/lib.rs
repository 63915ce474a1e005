//! # Pricer Models (L2: Business Logic)
//!
//! Credit portfolio loss models built on the `pricer_core` distributions.
//!
//! This crate provides:
//! - The Gaussian copula large homogeneous pool (LHP) tranche loss model
//! - The basket capability the model queries, with a flat hazard basket
//! - Observable model inputs refreshed on demand
//! - TOML configuration for models and baskets
//!
//! ## Design Principles
//!
//! - **Closed forms only**: every query is an analytic expression in Φ,
//!   Φ⁻¹ and the bivariate normal CDF
//! - **Explicit refresh**: derived constants change only through
//!   `GaussianLhpModel::update`
//! - **Queried baskets**: models borrow a basket per call and never own it

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod credit;
