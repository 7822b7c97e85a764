use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::transactions::Transaction;
use crate::utils::decimal_utils::checked_add;

/// Buy/sell totals for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSummary {
    pub total_bought_value: Decimal,
    pub total_sold_value: Decimal,
    pub profit_loss: Decimal,
    pub buy_transactions: usize,
    pub sell_transactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCounts {
    pub total_transactions: usize,
    pub buy_transactions: usize,
    pub sell_transactions: usize,
}

/// Aggregate view over a user's whole history.
///
/// Profit/loss here is the simple Σ sell value − Σ buy value, not lot-matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_buy_value: Decimal,
    pub total_sell_value: Decimal,
    pub total_buy_quantity: Decimal,
    pub total_sell_quantity: Decimal,
    pub total_profit_loss: Decimal,
    pub total_return_percentage: Decimal,
    pub symbols: BTreeMap<String, SymbolSummary>,
    pub counts: TransactionCounts,
}

impl TransactionSummary {
    pub fn add_transaction(&mut self, symbol: &str, transaction: &Transaction) -> Result<()> {
        let value = transaction.value()?;
        let entry = self.symbols.entry(symbol.to_string()).or_default();

        if transaction.is_buy() {
            self.total_buy_value = checked_add(self.total_buy_value, value, "total buy value")?;
            self.total_buy_quantity =
                checked_add(self.total_buy_quantity, transaction.quantity, "total buy quantity")?;
            self.counts.buy_transactions += 1;
            entry.total_bought_value =
                checked_add(entry.total_bought_value, value, "symbol bought value")?;
            entry.buy_transactions += 1;
        } else {
            self.total_sell_value = checked_add(self.total_sell_value, value, "total sell value")?;
            self.total_sell_quantity =
                checked_add(self.total_sell_quantity, transaction.quantity, "total sell quantity")?;
            self.counts.sell_transactions += 1;
            entry.total_sold_value = checked_add(entry.total_sold_value, value, "symbol sold value")?;
            entry.sell_transactions += 1;
        }
        entry.profit_loss = entry.total_sold_value - entry.total_bought_value;
        self.counts.total_transactions += 1;
        Ok(())
    }
}

/// A transaction with the proportional profit/loss of a sell attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithPl {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// `None` for buys and for sells of a symbol with no recorded buys.
    pub profit_loss: Option<Decimal>,
}
