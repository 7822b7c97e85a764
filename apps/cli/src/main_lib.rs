use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use stockfolio_core::quotes::{
    CachedPriceProvider, CsvHistoryPriceProvider, PriceCache, PriceProviderTrait,
    StaticPriceProvider,
};
use stockfolio_core::transactions::{read_transactions_csv, read_transactions_json, Transaction};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::{Config, LogFormat};

/// Installs the global subscriber. `log` records from the core crate are
/// forwarded through the subscriber's log bridge.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Command-line values win over the environment.
pub fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(dir) = &cli.price_history_dir {
        config.price_history_dir = Some(dir.clone());
    }
    if let Some(multiplier) = cli.price_multiplier {
        config.price_multiplier = multiplier;
    }
    if let Some(user) = &cli.user {
        config.user_id = user.clone();
    }
    config
}

/// Picks the price source (JSON prices, then history files, then none) and
/// puts the TTL cache in front of it.
pub fn build_price_provider(
    config: &Config,
    prices_file: Option<&Path>,
) -> Result<Arc<dyn PriceProviderTrait>> {
    let source: Arc<dyn PriceProviderTrait> = match (prices_file, &config.price_history_dir) {
        (Some(path), _) => Arc::new(
            StaticPriceProvider::from_json_file(path)
                .with_context(|| format!("Failed to load prices from {}", path.display()))?,
        ),
        (None, Some(dir)) => Arc::new(
            CsvHistoryPriceProvider::new(dir.clone()).with_multiplier(config.price_multiplier),
        ),
        (None, None) => {
            tracing::info!("No price source configured; holdings are valued at average cost");
            Arc::new(StaticPriceProvider::default())
        }
    };
    tracing::debug!(
        "Using price source '{}' with a {:?} cache",
        source.name(),
        config.price_cache_ttl
    );

    let cache = Arc::new(PriceCache::new(config.price_cache_ttl));
    Ok(Arc::new(CachedPriceProvider::new(source, cache)))
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads `path` as a JSON array when it ends in `.json`, as CSV otherwise.
pub fn load_transactions(path: Option<&Path>, user_id: &str) -> Result<Vec<Transaction>> {
    let path = path.context("--transactions <FILE> is required for this command")?;
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let transactions = if is_json_file(path) {
        read_transactions_json(file, user_id)
    } else {
        read_transactions_csv(file, user_id)
    }
    .with_context(|| format!("Failed to read transactions from {}", path.display()))?;
    tracing::info!("Loaded {} transactions from {}", transactions.len(), path.display());
    Ok(transactions)
}
