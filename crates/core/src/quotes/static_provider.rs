use std::collections::HashMap;
use std::path::Path;

use log::debug;
use rust_decimal::Decimal;

use super::quotes_traits::ensure_positive_price;
use super::{PriceError, PriceProviderTrait};
use crate::errors::Result;
use crate::portfolio::holdings::normalize_symbol;
use crate::utils::decimal_utils::parse_decimal;

/// Fixed symbol → price table, e.g. loaded from a JSON file such as
/// `{"AAPL": 189.5, "MSFT": "402.10"}`.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceProvider {
    prices: HashMap<String, Decimal>,
}

impl StaticPriceProvider {
    pub fn new<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        Self {
            prices: prices
                .into_iter()
                .map(|(symbol, price)| (normalize_symbol(symbol.as_ref()), price))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut prices = HashMap::with_capacity(raw.len());
        for (symbol, value) in raw {
            let price = match &value {
                serde_json::Value::Number(n) => parse_decimal(&n.to_string())?,
                serde_json::Value::String(s) => parse_decimal(s)?,
                other => {
                    return Err(crate::errors::DataError::Malformed(format!(
                        "price for {} must be a number, got {}",
                        symbol, other
                    ))
                    .into())
                }
            };
            prices.insert(normalize_symbol(&symbol), price);
        }
        debug!("Loaded {} static prices", prices.len());
        Ok(Self { prices })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceProviderTrait for StaticPriceProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn get_current_price(&self, symbol: &str) -> std::result::Result<Decimal, PriceError> {
        let key = normalize_symbol(symbol);
        let price = self
            .prices
            .get(&key)
            .copied()
            .ok_or(PriceError::SymbolNotFound(key.clone()))?;
        ensure_positive_price(&key, price)
    }
}
