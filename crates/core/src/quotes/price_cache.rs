//! Time-bounded cache of current prices, backed by `moka`.
//!
//! The cache is an ordinary object shared through `Arc`; there is no
//! process-wide instance. Expired entries are never returned and are
//! evicted by moka's housekeeping or [`PriceCache::purge_expired`].

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use moka::sync::Cache;
use rust_decimal::Decimal;

use super::{PriceError, PriceProviderTrait};
use crate::constants::{DEFAULT_PRICE_CACHE_CAPACITY, DEFAULT_PRICE_CACHE_TTL_SECS};
use crate::portfolio::holdings::normalize_symbol;

/// Thread-safe TTL cache keyed by normalized symbol.
pub struct PriceCache {
    entries: Cache<String, Decimal>,
    ttl: Duration,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_PRICE_CACHE_TTL_SECS))
    }
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_PRICE_CACHE_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.entries.get(&normalize_symbol(symbol))
    }

    pub fn insert(&self, symbol: &str, price: Decimal) {
        self.entries.insert(normalize_symbol(symbol), price);
    }

    /// Returns whether a live entry was removed.
    pub fn invalidate(&self, symbol: &str) -> bool {
        self.entries.remove(&normalize_symbol(symbol)).is_some()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Number of live entries after pending evictions are applied.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts expired entries now instead of on moka's next maintenance run.
    pub fn purge_expired(&self) {
        debug!("Purging expired price cache entries");
        self.entries.run_pending_tasks();
    }
}

/// Serves prices from a [`PriceCache`] and falls through to `inner` on a
/// miss. Failed lookups are not cached.
pub struct CachedPriceProvider {
    inner: Arc<dyn PriceProviderTrait>,
    cache: Arc<PriceCache>,
}

impl CachedPriceProvider {
    pub fn new(inner: Arc<dyn PriceProviderTrait>, cache: Arc<PriceCache>) -> Self {
        Self { inner, cache }
    }
}

impl PriceProviderTrait for CachedPriceProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_current_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
        if let Some(price) = self.cache.get(symbol) {
            debug!("Price cache hit for {}", symbol);
            return Ok(price);
        }

        let price = self.inner.get_current_price(symbol)?;
        self.cache.insert(symbol, price);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;

    struct CountingProvider {
        calls: AtomicUsize,
        price: Option<Decimal>,
    }

    impl PriceProviderTrait for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn get_current_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.price
                .ok_or_else(|| PriceError::SymbolNotFound(symbol.to_string()))
        }
    }

    #[test]
    fn test_entry_is_served_before_expiry() {
        let cache = PriceCache::new(Duration::from_secs(300));
        cache.insert("aapl", dec!(150));

        assert_eq!(cache.get("AAPL"), Some(dec!(150)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_misses_after_expiry_and_is_evicted() {
        let cache = PriceCache::new(Duration::from_millis(50));
        cache.insert("AAPL", dec!(150));
        sleep(Duration::from_millis(150));

        assert_eq!(cache.get("AAPL"), None);
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired_keeps_fresh_entries() {
        let cache = PriceCache::new(Duration::from_millis(400));
        cache.insert("OLD", dec!(1));
        sleep(Duration::from_millis(250));
        cache.insert("NEW", dec!(2));
        sleep(Duration::from_millis(250));

        cache.purge_expired();
        assert_eq!(cache.get("OLD"), None);
        assert_eq!(cache.get("NEW"), Some(dec!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_bounds_entry_count() {
        let cache = PriceCache::with_capacity(Duration::from_secs(300), 2);
        for i in 0..20 {
            cache.insert(&format!("S{i}"), Decimal::from(i));
        }

        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = PriceCache::default();
        assert_eq!(cache.ttl(), Duration::from_secs(300));
        cache.insert("A", dec!(1));
        cache.insert("B", dec!(2));

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("B"), None);
    }

    #[test]
    fn test_cached_provider_hits_inner_once() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            price: Some(dec!(42)),
        });
        let provider = CachedPriceProvider::new(inner.clone(), Arc::new(PriceCache::default()));

        assert_eq!(provider.get_current_price("MSFT").unwrap(), dec!(42));
        assert_eq!(provider.get_current_price("msft").unwrap(), dec!(42));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.name(), "counting");
    }

    #[test]
    fn test_cached_provider_does_not_cache_failures() {
        let inner = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            price: None,
        });
        let cache = Arc::new(PriceCache::default());
        let provider = CachedPriceProvider::new(inner.clone(), cache.clone());

        assert!(provider.get_current_price("X").is_err());
        assert!(provider.get_current_price("X").is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
