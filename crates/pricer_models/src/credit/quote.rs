//! Observable scalar inputs for loss model parameters.
//!
//! A model binds its correlation or recovery rates to an
//! [`ObservableValue`] and re-reads it on an explicit refresh. Market data
//! owners push new levels through a [`SimpleQuote`] handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A source of a scalar market or model input.
///
/// Implementors must be cheap to read; the model calls `value` once per
/// source on every refresh.
pub trait ObservableValue: Send + Sync {
    /// Returns the current level.
    fn value(&self) -> f64;
}

impl ObservableValue for f64 {
    #[inline]
    fn value(&self) -> f64 {
        *self
    }
}

/// Shareable, thread-safe settable scalar.
///
/// Clones share the same storage, so a value set through one handle is
/// observed through every other.
///
/// # Examples
/// ```
/// use pricer_models::credit::{ObservableValue, SimpleQuote};
///
/// let quote = SimpleQuote::new(0.3);
/// let observed = quote.clone();
/// quote.set_value(0.35);
/// assert_eq!(observed.value(), 0.35);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleQuote {
    bits: Arc<AtomicU64>,
}

impl SimpleQuote {
    /// Creates a quote with an initial level.
    pub fn new(value: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    /// Sets a new level and returns the previous one.
    pub fn set_value(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::AcqRel))
    }
}

impl ObservableValue for SimpleQuote {
    #[inline]
    fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
