//! Current price lookup: provider trait, TTL cache and the built-in sources.

mod csv_history_provider;
mod price_cache;
mod quotes_errors;
mod quotes_traits;
mod static_provider;

pub use csv_history_provider::CsvHistoryPriceProvider;
pub use price_cache::{CachedPriceProvider, PriceCache};
pub use quotes_errors::PriceError;
pub use quotes_traits::PriceProviderTrait;
pub use static_provider::StaticPriceProvider;
