use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::errors::Result;
use crate::portfolio::holdings::Lot;
use crate::utils::decimal_utils::{checked_mul, checked_sub};

/// Open position in one symbol, derived from the user's transactions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSummary {
    pub symbol: String,

    // Position data
    pub quantity_remaining: Decimal,
    /// Cost of the open lots after FIFO relief.
    pub cost_basis_remaining: Decimal,
    pub average_cost: Decimal,

    /// Σ sell value − Σ buy value. A coarse figure kept for aggregate
    /// reporting; it is not lot-matched.
    pub realized_pl: Decimal,
    /// Sell proceeds minus the cost of the lots they relieved.
    pub realized_pl_fifo: Decimal,

    /// Unit price of the most recent buy.
    pub last_trade_price: Decimal,

    // Totals over the full history of the symbol
    pub total_bought_quantity: Decimal,
    pub total_sold_quantity: Decimal,
    pub total_bought_value: Decimal,
    pub total_sold_value: Decimal,

    /// Acquisition date of the oldest open lot.
    pub open_date: Option<DateTime<Utc>>,
    pub lots: VecDeque<Lot>,
}

impl HoldingSummary {
    /// Paper profit/loss against `current_price`.
    pub fn unrealized_pl(&self, current_price: Decimal) -> Result<Decimal> {
        checked_sub(
            self.market_value(current_price)?,
            self.cost_basis_remaining,
            "unrealized P&L",
        )
    }

    /// Market value of the open quantity at `current_price`.
    pub fn market_value(&self, current_price: Decimal) -> Result<Decimal> {
        checked_mul(current_price, self.quantity_remaining, "market value")
    }
}

/// A symbol whose transactions could not be turned into a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFailure {
    pub symbol: String,
    pub message: String,
}

/// Holdings computed with per-symbol isolation.
///
/// A symbol that fails validation contributes nothing to `holdings` or to
/// `realized_pl`; it is listed in `failures` instead.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    pub holdings: Vec<HoldingSummary>,
    /// Simple-method realized P&L over every valid symbol, open or closed.
    pub realized_pl: Decimal,
    pub failures: Vec<SymbolFailure>,
}

impl HoldingsReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_symbols(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.symbol.clone()).collect()
    }
}

/// Where a holding's current price came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    Market,
    /// The lookup failed; the holding is carried at its average cost.
    AverageCostFallback,
}

/// A holding priced against the market.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuedHolding {
    #[serde(flatten)]
    pub holding: HoldingSummary,
    pub current_price: Decimal,
    pub price_source: PriceSource,
    pub current_value: Decimal,
    /// `None` when no market price was available.
    pub unrealized_pl: Option<Decimal>,
    /// Percentage of the remaining cost basis.
    pub unrealized_pl_pct: Option<Decimal>,
}

impl ValuedHolding {
    pub fn is_priced(&self) -> bool {
        self.price_source == PriceSource::Market
    }
}

/// Whole-portfolio valuation at current prices.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub holdings: Vec<ValuedHolding>,
    /// Σ remaining cost basis.
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub total_unrealized_pl: Decimal,
    pub total_unrealized_pl_pct: Decimal,
    pub total_realized_pl: Decimal,
    /// Symbols excluded because their history failed validation.
    pub failed_symbols: Vec<String>,
}
