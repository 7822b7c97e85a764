/// Default time-to-live for cached prices, in seconds
pub const DEFAULT_PRICE_CACHE_TTL_SECS: u64 = 300;

/// Upper bound on cached symbols
pub const DEFAULT_PRICE_CACHE_CAPACITY: u64 = 1_000;

/// User id applied when records carry none (single-user tooling)
pub const DEFAULT_USER_ID: &str = "local";
