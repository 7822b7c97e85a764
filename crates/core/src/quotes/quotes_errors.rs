//! Price lookup error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by a price source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: Decimal },

    #[error("Provider '{provider}' failed: {message}")]
    ProviderError { provider: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl PriceError {
    /// Returns true if asking again later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PriceError::ProviderError { .. } | PriceError::Io(_))
    }
}

impl From<std::io::Error> for PriceError {
    fn from(error: std::io::Error) -> Self {
        PriceError::Io(error.to_string())
    }
}
