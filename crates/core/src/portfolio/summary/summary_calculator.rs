use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::Result;
use crate::portfolio::holdings::normalize_symbol;
use crate::portfolio::summary::{TransactionSummary, TransactionWithPl};
use crate::transactions::Transaction;
use crate::utils::decimal_utils::{checked_add, checked_sub, percentage_of, pro_rata};

/// Totals, counts and per-symbol figures over `transactions`.
///
/// Return percentage is `total_profit_loss / total_buy_value × 100`,
/// rounded to 4 places, or 0 when nothing was bought.
pub fn compute_transaction_summary(transactions: &[Transaction]) -> Result<TransactionSummary> {
    let mut summary = TransactionSummary::default();
    for tx in transactions {
        summary.add_transaction(&normalize_symbol(&tx.symbol), tx)?;
    }

    // Both totals are non-negative, so the difference stays in range.
    summary.total_profit_loss = summary.total_sell_value - summary.total_buy_value;
    summary.total_return_percentage = percentage_of(
        summary.total_profit_loss,
        summary.total_buy_value,
        "total return %",
    )?;

    debug!(
        "Summarized {} transactions over {} symbols",
        summary.counts.total_transactions,
        summary.symbols.len()
    );
    Ok(summary)
}

#[derive(Default)]
struct BuyTotals {
    quantity: Decimal,
    value: Decimal,
}

/// Attaches to every sell `sell value − total bought value × sell qty / total
/// bought qty`, using all of the symbol's buys regardless of date.
/// Order of `transactions` is preserved.
pub fn annotate_sell_pl(transactions: &[Transaction]) -> Result<Vec<TransactionWithPl>> {
    let mut buys: HashMap<String, BuyTotals> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_buy()) {
        let totals = buys.entry(normalize_symbol(&tx.symbol)).or_default();
        totals.quantity = checked_add(totals.quantity, tx.quantity, "bought quantity")?;
        totals.value = checked_add(totals.value, tx.value()?, "bought value")?;
    }

    transactions
        .iter()
        .map(|tx| {
            let mut profit_loss = None;
            if tx.is_sell() {
                if let Some(totals) = buys
                    .get(&normalize_symbol(&tx.symbol))
                    .filter(|totals| totals.quantity > Decimal::ZERO)
                {
                    let cost = pro_rata(totals.value, tx.quantity, totals.quantity, "sell cost")?;
                    profit_loss = Some(checked_sub(tx.value()?, cost, "sell P&L")?);
                }
            }
            Ok(TransactionWithPl {
                transaction: tx.clone(),
                profit_loss,
            })
        })
        .collect()
}
