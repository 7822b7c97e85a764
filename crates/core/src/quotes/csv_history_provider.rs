use std::path::{Path, PathBuf};

use log::{debug, warn};
use rust_decimal::Decimal;

use super::quotes_traits::ensure_positive_price;
use super::{PriceError, PriceProviderTrait};
use crate::portfolio::holdings::normalize_symbol;

const PROVIDER_NAME: &str = "csv-history";
const CLOSE_COLUMN: &str = "close";

/// Reads the latest close from daily history files laid out as
/// `<dir>/<SYMBOL>_history.csv` with a `Close` column.
///
/// The close is multiplied by `multiplier` so histories quoted in another
/// currency can be converted on the way in.
#[derive(Debug, Clone)]
pub struct CsvHistoryPriceProvider {
    dir: PathBuf,
    multiplier: Decimal,
}

impl CsvHistoryPriceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            multiplier: Decimal::ONE,
        }
    }

    pub fn with_multiplier(mut self, multiplier: Decimal) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn history_path(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("{}_history.csv", normalize_symbol(symbol)))
    }

    fn provider_error(message: impl Into<String>) -> PriceError {
        PriceError::ProviderError {
            provider: PROVIDER_NAME.to_string(),
            message: message.into(),
        }
    }

    fn read_last_close(path: &Path) -> Result<Option<Decimal>, PriceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Self::provider_error(e.to_string()))?;

        let close_idx = reader
            .headers()
            .map_err(|e| Self::provider_error(e.to_string()))?
            .iter()
            .position(|h| h.eq_ignore_ascii_case(CLOSE_COLUMN))
            .ok_or_else(|| {
                Self::provider_error(format!("{} has no Close column", path.display()))
            })?;

        let mut last_close = None;
        for record in reader.records() {
            let record = record.map_err(|e| Self::provider_error(e.to_string()))?;
            if let Some(value) = record.get(close_idx).filter(|v| !v.is_empty()) {
                let close = value.parse::<Decimal>().map_err(|e| {
                    Self::provider_error(format!("bad Close value '{}': {}", value, e))
                })?;
                last_close = Some(close);
            }
        }
        Ok(last_close)
    }
}

impl PriceProviderTrait for CsvHistoryPriceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn get_current_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let symbol = normalize_symbol(symbol);
        let path = self.history_path(&symbol);
        if !path.is_file() {
            debug!("No price history at {}", path.display());
            return Err(PriceError::SymbolNotFound(symbol));
        }

        let close = match Self::read_last_close(&path) {
            Ok(Some(close)) => close,
            Ok(None) => {
                warn!("Price history for {} has no rows", symbol);
                return Err(PriceError::SymbolNotFound(symbol));
            }
            Err(e) => {
                warn!("Failed to read price history for {}: {}", symbol, e);
                return Err(e);
            }
        };

        let price = close.checked_mul(self.multiplier).ok_or_else(|| {
            Self::provider_error(format!(
                "close {} × multiplier {} is out of range",
                close, self.multiplier
            ))
        })?;
        ensure_positive_price(&symbol, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write_history(dir: &Path, symbol: &str, body: &str) {
        fs::write(dir.join(format!("{}_history.csv", symbol)), body).unwrap();
    }

    #[test]
    fn test_reads_last_close() {
        let dir = tempfile::tempdir().unwrap();
        write_history(
            dir.path(),
            "AAPL",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02,185.0,186.0,184.0,185.5,100\n\
             2024-01-03,186.0,188.0,185.0,187.25,120\n",
        );

        let provider = CsvHistoryPriceProvider::new(dir.path());
        assert_eq!(provider.get_current_price("aapl").unwrap(), dec!(187.25));
    }

    #[test]
    fn test_applies_multiplier() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "MSFT", "Date,Close\n2024-01-02,10\n");

        let provider = CsvHistoryPriceProvider::new(dir.path()).with_multiplier(dec!(83));
        assert_eq!(provider.get_current_price("MSFT").unwrap(), dec!(830));
    }

    #[test]
    fn test_out_of_range_conversion_is_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "BIG", "Date,Close\n2024-01-02,50000000000000000000000000000\n");

        let provider = CsvHistoryPriceProvider::new(dir.path()).with_multiplier(dec!(83));
        assert!(matches!(
            provider.get_current_price("BIG"),
            Err(PriceError::ProviderError { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_symbol_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvHistoryPriceProvider::new(dir.path());
        assert_eq!(
            provider.get_current_price("GOOG"),
            Err(PriceError::SymbolNotFound("GOOG".to_string()))
        );
    }

    #[test]
    fn test_missing_close_column_is_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "IBM", "Date,Open\n2024-01-02,10\n");

        let err = CsvHistoryPriceProvider::new(dir.path())
            .get_current_price("IBM")
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_trailing_blank_close_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "AMD", "Date,Close\n2024-01-02,95\n2024-01-03,\n");

        let provider = CsvHistoryPriceProvider::new(dir.path());
        assert_eq!(provider.get_current_price("AMD").unwrap(), dec!(95));
    }

    #[test]
    fn test_header_only_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "NVDA", "Date,Close\n");

        let provider = CsvHistoryPriceProvider::new(dir.path());
        assert!(matches!(
            provider.get_current_price("NVDA"),
            Err(PriceError::SymbolNotFound(_))
        ));
    }
}
