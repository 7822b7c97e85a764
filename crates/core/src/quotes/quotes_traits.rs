use rust_decimal::Decimal;

use super::PriceError;

/// A source of current prices.
///
/// Lookups are synchronous and may fail; callers are expected to tolerate
/// failures (valuation falls back to average cost).
pub trait PriceProviderTrait: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    fn get_current_price(&self, symbol: &str) -> Result<Decimal, PriceError>;
}

/// Rejects zero and negative prices coming out of a source.
pub(crate) fn ensure_positive_price(symbol: &str, price: Decimal) -> Result<Decimal, PriceError> {
    if price <= Decimal::ZERO {
        return Err(PriceError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        });
    }
    Ok(price)
}
