//! Transaction domain models.

use crate::errors::{DataError, ValidationError};
use crate::transactions::transactions_constants::*;
use crate::utils::decimal_utils::checked_mul;
use crate::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSide::Buy => TRANSACTION_SIDE_BUY,
            TransactionSide::Sell => TRANSACTION_SIDE_SELL,
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            TRANSACTION_SIDE_BUY => Ok(TransactionSide::Buy),
            TRANSACTION_SIDE_SELL => Ok(TransactionSide::Sell),
            _ => Err(ValidationError::UnknownSide(s.trim().to_string())),
        }
    }
}

/// A recorded buy or sell. Immutable once stored; only deletion is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub side: TransactionSide,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// quantity × unit_price
    pub fn value(&self) -> Result<Decimal> {
        checked_mul(self.quantity, self.unit_price, "transaction value")
    }

    pub fn is_buy(&self) -> bool {
        self.side == TransactionSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == TransactionSide::Sell
    }

    /// Re-checks the record invariants.
    ///
    /// Records coming back from persistence are not trusted blindly: a
    /// hand-edited row must not reach the FIFO walk.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(DataError::MissingField("symbol".to_string()).into());
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity {
                symbol: self.symbol.clone(),
                quantity: self.quantity,
            }
            .into());
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice {
                symbol: self.symbol.clone(),
                price: self.unit_price,
            }
            .into());
        }
        self.value()?;
        Ok(())
    }
}

/// Input model for recording a new transaction.
///
/// Every field is optional so that missing data can be reported as a
/// [`DataError`] rather than a deserialization failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTransaction {
    pub id: Option<String>,
    pub symbol: Option<String>,
    #[serde(deserialize_with = "decimal_input_format::deserialize_option_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(
        alias = "price",
        alias = "purchasePrice",
        deserialize_with = "decimal_input_format::deserialize_option_decimal"
    )]
    pub unit_price: Option<Decimal>,
    /// "buy" or "sell". Defaults to buy when absent.
    #[serde(alias = "type", alias = "transactionType")]
    pub side: Option<String>,
    #[serde(alias = "date", alias = "transactionDate", alias = "purchaseDate")]
    pub timestamp: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn buy(symbol: &str, quantity: Decimal, unit_price: Decimal, date: &str) -> Self {
        Self::with_side(TransactionSide::Buy, symbol, quantity, unit_price, date)
    }

    pub fn sell(symbol: &str, quantity: Decimal, unit_price: Decimal, date: &str) -> Self {
        Self::with_side(TransactionSide::Sell, symbol, quantity, unit_price, date)
    }

    fn with_side(
        side: TransactionSide,
        symbol: &str,
        quantity: Decimal,
        unit_price: Decimal,
        date: &str,
    ) -> Self {
        NewTransaction {
            id: None,
            symbol: Some(symbol.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            side: Some(side.as_str().to_string()),
            timestamp: Some(date.to_string()),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Normalized symbol: trimmed and upper-cased.
    pub fn normalized_symbol(&self) -> Option<String> {
        self.symbol
            .as_deref()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    }

    /// Parsed side, defaulting to buy when none was given.
    pub fn parsed_side(&self) -> std::result::Result<TransactionSide, ValidationError> {
        match self.side.as_deref().map(str::trim) {
            None | Some("") => Ok(TransactionSide::Buy),
            Some(side) => side.parse(),
        }
    }

    /// Validates the new transaction data
    pub fn validate(&self) -> Result<()> {
        let symbol = self
            .normalized_symbol()
            .ok_or_else(|| DataError::MissingField("symbol".to_string()))?;

        let quantity = self
            .quantity
            .ok_or_else(|| DataError::MissingField("quantity".to_string()))?;
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity { symbol, quantity }.into());
        }

        let price = self
            .unit_price
            .ok_or_else(|| DataError::MissingField("unitPrice".to_string()))?;
        if price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice { symbol, price }.into());
        }
        checked_mul(quantity, price, "transaction value")?;

        self.parsed_side()?;

        let timestamp = self
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DataError::MissingField("timestamp".to_string()))?;
        parse_timestamp(timestamp)?;

        Ok(())
    }

    /// Validates and converts into a stored [`Transaction`] owned by `user_id`.
    pub fn into_transaction(self, user_id: &str) -> Result<Transaction> {
        self.validate()?;

        // validate() guarantees every field below is present and parseable
        let symbol = self.normalized_symbol().unwrap_or_default();
        let side = self.parsed_side()?;
        let timestamp = parse_timestamp(self.timestamp.as_deref().unwrap_or_default().trim())?;
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Transaction {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            symbol,
            quantity: self.quantity.unwrap_or_default(),
            unit_price: self.unit_price.unwrap_or_default(),
            side,
            timestamp,
            notes,
            created_at: Utc::now(),
        })
    }
}

/// Parses RFC3339, naive ISO datetimes (as UTC) and date-only strings
/// (midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&midnight));
            }
        }
    }

    Err(ValidationError::InvalidInput(format!(
        "Invalid date format: {}. Expected YYYY-MM-DD or ISO 8601/RFC3339",
        value
    ))
    .into())
}

// Custom serialization for timestamps to ensure consistent ISO 8601 formatting
pub(crate) mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

// Decimal fields accept JSON numbers, numeric strings in plain or exponent
// form, and null or blank values (read as absent).
mod decimal_input_format {
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    use crate::utils::decimal_utils::parse_decimal;

    pub fn deserialize_option_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "expected a decimal number, got {}",
                    other
                )))
            }
        };
        parse_decimal(&text)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid decimal '{}': {}", text.trim(), e)))
    }
}
