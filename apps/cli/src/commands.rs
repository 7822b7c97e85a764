use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use stockfolio_core::portfolio::holdings::{
    validate_sell, PortfolioValuationService, PortfolioValuationServiceTrait,
};
use stockfolio_core::transactions::{
    InMemoryTransactionRepository, Transaction, TransactionService, TransactionServiceTrait,
};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::main_lib::{build_price_provider, load_transactions};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealizedOutput {
    user_id: String,
    realized_pl: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateSellOutput {
    symbol: String,
    quantity: Decimal,
    available: Decimal,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The loaded file becomes the service's snapshot.
fn service_for(transactions: Vec<Transaction>) -> TransactionService {
    TransactionService::new(Arc::new(InMemoryTransactionRepository::with_transactions(
        transactions,
    )))
}

pub fn run(cli: Cli, config: &Config) -> Result<ExitCode> {
    let user_id = config.user_id.as_str();
    let transactions = load_transactions(cli.transactions.as_deref(), user_id)?;

    match cli.command {
        Commands::Holdings => {
            let provider = build_price_provider(config, cli.prices.as_deref())?;
            let valuation =
                PortfolioValuationService::new(provider).value_portfolio(&transactions)?;
            for symbol in &valuation.failed_symbols {
                tracing::warn!("{} was excluded: its history is inconsistent", symbol);
            }
            print_json(&valuation)?;
        }
        Commands::Realized => {
            let realized_pl = service_for(transactions).get_realized_pl(user_id)?;
            print_json(&RealizedOutput {
                user_id: user_id.to_string(),
                realized_pl,
            })?;
        }
        Commands::Summary => {
            print_json(&service_for(transactions).get_summary(user_id)?)?;
        }
        Commands::Transactions => {
            print_json(&service_for(transactions).get_transactions_with_pl(user_id)?)?;
        }
        Commands::ValidateSell { symbol, quantity } => {
            let available = service_for(transactions.clone()).available_quantity(user_id, &symbol)?;
            let outcome = validate_sell(&transactions, &symbol, quantity);
            let accepted = outcome.is_ok();
            print_json(&ValidateSellOutput {
                symbol: symbol.trim().to_uppercase(),
                quantity,
                available,
                accepted,
                message: outcome.err().map(|e| e.to_string()),
            })?;
            if !accepted {
                return Ok(ExitCode::from(2));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
