use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(
    name = "stockfolio",
    version,
    about = "FIFO cost basis, profit/loss and valuation for a stock transaction history"
)]
pub struct Cli {
    /// Transaction history as CSV (symbol,quantity,price,side,date,notes)
    #[arg(short, long, global = true)]
    pub transactions: Option<PathBuf>,

    /// JSON file mapping symbols to current prices
    #[arg(long, global = true)]
    pub prices: Option<PathBuf>,

    /// Directory of <SYMBOL>_history.csv files [env: SF_PRICE_HISTORY_DIR]
    #[arg(long, global = true)]
    pub price_history_dir: Option<PathBuf>,

    /// Multiplier applied to history closes [env: SF_PRICE_MULTIPLIER]
    #[arg(long, global = true)]
    pub price_multiplier: Option<Decimal>,

    /// Owner recorded on imported transactions [env: SF_USER_ID]
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open positions valued at current prices
    Holdings,

    /// Aggregate realized profit/loss
    Realized,

    /// Buy/sell totals and per-symbol summary
    Summary,

    /// Transactions with proportional profit/loss on sells
    Transactions,

    /// Checks whether a sell would be accepted
    ValidateSell {
        #[arg(short, long)]
        symbol: String,

        #[arg(short, long)]
        quantity: Decimal,
    },
}
