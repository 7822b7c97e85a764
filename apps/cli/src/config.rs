use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use stockfolio_core::constants::{DEFAULT_PRICE_CACHE_TTL_SECS, DEFAULT_USER_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_format: LogFormat,
    pub price_cache_ttl: Duration,
    pub price_history_dir: Option<PathBuf>,
    pub price_multiplier: Decimal,
    pub user_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let log_format = match non_empty("SF_LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let ttl_secs: u64 = match non_empty("SF_PRICE_CACHE_TTL_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid SF_PRICE_CACHE_TTL_SECS: {}", v))?,
            None => DEFAULT_PRICE_CACHE_TTL_SECS,
        };
        let price_multiplier = match non_empty("SF_PRICE_MULTIPLIER") {
            Some(v) => v
                .parse::<Decimal>()
                .with_context(|| format!("Invalid SF_PRICE_MULTIPLIER: {}", v))?,
            None => Decimal::ONE,
        };
        if price_multiplier <= Decimal::ZERO {
            anyhow::bail!("SF_PRICE_MULTIPLIER must be positive, got {}", price_multiplier);
        }

        Ok(Self {
            log_format,
            price_cache_ttl: Duration::from_secs(ttl_secs),
            price_history_dir: non_empty("SF_PRICE_HISTORY_DIR").map(PathBuf::from),
            price_multiplier,
            user_id: non_empty("SF_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.price_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.price_history_dir, None);
        assert_eq!(config.price_multiplier, Decimal::ONE);
        assert_eq!(config.user_id, "local");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SF_LOG_FORMAT", "JSON"),
            ("SF_PRICE_CACHE_TTL_SECS", "60"),
            ("SF_PRICE_HISTORY_DIR", "/data/history"),
            ("SF_PRICE_MULTIPLIER", "83"),
            ("SF_USER_ID", "alice"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.price_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.price_history_dir, Some(PathBuf::from("/data/history")));
        assert_eq!(config.price_multiplier, dec!(83));
        assert_eq!(config.user_id, "alice");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("SF_PRICE_CACHE_TTL_SECS", "soon")]).is_err());
        assert!(config_from(&[("SF_PRICE_MULTIPLIER", "0")]).is_err());
        assert!(config_from(&[("SF_PRICE_MULTIPLIER", "abc")]).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("SF_USER_ID", "  "), ("SF_PRICE_HISTORY_DIR", "")]).unwrap();
        assert_eq!(config.user_id, "local");
        assert_eq!(config.price_history_dir, None);
    }
}
