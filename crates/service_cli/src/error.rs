//! CLI error types

use pricer_core::types::{DateError, PricingError};
use pricer_models::credit::LossModelError;
use thiserror::Error;

/// Errors surfaced by the `lhp` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Bad command line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unreadable or inconsistent scenario file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Loss model rejected its inputs
    #[error("Model error: {0}")]
    Model(#[from] LossModelError),

    /// Query produced an unusable number
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Unparseable date
    #[error("Date error: {0}")]
    Date(#[from] DateError),

    /// Report serialisation failure
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    /// I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_conversion() {
        let err: CliError = LossModelError::InvalidPercentile { percentile: 2.0 }.into();
        assert_eq!(
            err.to_string(),
            "Model error: Percentile argument out of bounds: 2"
        );
    }

    #[test]
    fn test_pricing_error_conversion() {
        let err: CliError = PricingError::NumericalInstability("NaN".to_string()).into();
        assert!(matches!(err, CliError::Pricing(PricingError::NumericalInstability(_))));
        assert_eq!(err.to_string(), "Pricing error: Numerical instability: NaN");
    }

    #[test]
    fn test_date_error_conversion() {
        let err: CliError = DateError::ParseError("'x'".to_string()).into();
        assert!(matches!(err, CliError::Date(_)));
    }
}
