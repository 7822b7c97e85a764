//! Core error types for the Stockfolio engine.
//!
//! Errors are plain return values. Nothing in the engine retries: every
//! computation is pure, so a failure is either bad input or a collaborator
//! (repository, price source) reporting a problem.

use chrono::ParseError as ChronoParseError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::quotes::PriceError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Malformed transaction data: {0}")]
    Data(#[from] DataError),

    #[error("Price lookup failed: {0}")]
    Price(#[from] PriceError),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl Error {
    /// True when the error is an insufficient-shares rejection.
    pub fn is_insufficient_shares(&self) -> bool {
        matches!(
            self,
            Error::Validation(ValidationError::InsufficientShares { .. })
        )
    }
}

/// Validation errors for transaction values and sell acceptance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Quantity must be greater than 0 (symbol {symbol}, got {quantity})")]
    NonPositiveQuantity { symbol: String, quantity: Decimal },

    #[error("Price must be greater than 0 (symbol {symbol}, got {price})")]
    NonPositivePrice { symbol: String, price: Decimal },

    #[error("Transaction side must be either \"buy\" or \"sell\", got \"{0}\"")]
    UnknownSide(String),

    #[error("Insufficient shares. You only have {available} shares of {symbol} (requested {requested})")]
    InsufficientShares {
        symbol: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Amount out of range while computing {0}")]
    AmountOverflow(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

/// Errors for records that are structurally unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("CSV error at row {row}: {message}")]
    Csv { row: usize, message: String },
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Data(DataError::Malformed(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Data(DataError::Malformed(err.to_string()))
    }
}
