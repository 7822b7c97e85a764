//! FIFO cost-basis engine.
//!
//! Pure functions over a snapshot of one user's transactions. Nothing here
//! performs I/O or keeps state between calls, so identical input always
//! yields identical output.
//!
//! Per symbol:
//! 1. buys are sorted by timestamp (stable, so ties keep insertion order);
//! 2. the full history is replayed chronologically to reject any sell that
//!    exceeds the shares held at that point;
//! 3. the total sold quantity relieves the sorted buy lots from the front;
//! 4. what is left is the open position and its cost basis.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};

use crate::errors::{Result, ValidationError};
use crate::portfolio::holdings::{
    build_open_lots, HoldingSummary, HoldingsReport, Lot, SymbolFailure,
};
use crate::transactions::Transaction;
use crate::utils::decimal_utils::{checked_add, checked_sub, checked_sum};

/// Normalizes a symbol for lookups (trimmed, upper-case).
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Everything known about one symbol after validation and lot relief.
#[derive(Debug)]
struct SymbolLedger {
    symbol: String,
    total_bought: Decimal,
    total_sold: Decimal,
    total_bought_value: Decimal,
    total_sold_value: Decimal,
    relieved_cost: Decimal,
    last_buy_price: Option<Decimal>,
    open_lots: VecDeque<Lot>,
}

impl SymbolLedger {
    fn build(symbol: &str, transactions: &[&Transaction]) -> Result<Self> {
        for tx in transactions {
            tx.validate()?;
        }
        check_chronological_holdings(symbol, transactions)?;

        let (buys, sells): (Vec<&Transaction>, Vec<&Transaction>) =
            transactions.iter().copied().partition(|tx| tx.is_buy());

        let total_bought = checked_sum(buys.iter().map(|tx| tx.quantity), "bought quantity")?;
        let total_sold = checked_sum(sells.iter().map(|tx| tx.quantity), "sold quantity")?;
        let total_bought_value = sum_values(&buys, "bought value")?;
        let total_sold_value = sum_values(&sells, "sold value")?;

        let (open_lots, relieved_cost) = build_open_lots(symbol, &buys, total_sold)?;

        // Latest buy wins; on equal timestamps the later insertion wins.
        let last_buy_price = buys
            .iter()
            .enumerate()
            .max_by_key(|(idx, tx)| (tx.timestamp, *idx))
            .map(|(_, tx)| tx.unit_price);

        Ok(SymbolLedger {
            symbol: symbol.to_string(),
            total_bought,
            total_sold,
            total_bought_value,
            total_sold_value,
            relieved_cost,
            last_buy_price,
            open_lots,
        })
    }

    fn remaining_quantity(&self) -> Decimal {
        self.total_bought - self.total_sold
    }

    fn realized_pl(&self) -> Decimal {
        self.total_sold_value - self.total_bought_value
    }

    fn realized_pl_fifo(&self) -> Decimal {
        self.total_sold_value - self.relieved_cost
    }

    /// The open position, or `None` when nothing is left.
    fn into_holding(self) -> Result<Option<HoldingSummary>> {
        let quantity_remaining = self.remaining_quantity();
        if quantity_remaining <= Decimal::ZERO {
            debug!("{} has no open position", self.symbol);
            return Ok(None);
        }

        let mut cost_basis_remaining = Decimal::ZERO;
        for lot in &self.open_lots {
            cost_basis_remaining =
                checked_add(cost_basis_remaining, lot.cost_basis()?, "remaining cost basis")?;
        }
        // Lies between the smallest and largest lot cost, so it cannot overflow.
        let average_cost = cost_basis_remaining / quantity_remaining;
        let realized_pl = self.realized_pl();
        let realized_pl_fifo = self.realized_pl_fifo();

        Ok(Some(HoldingSummary {
            open_date: self.open_lots.front().map(|lot| lot.acquisition_date),
            symbol: self.symbol,
            quantity_remaining,
            cost_basis_remaining,
            average_cost,
            realized_pl,
            realized_pl_fifo,
            last_trade_price: self.last_buy_price.unwrap_or(Decimal::ZERO),
            total_bought_quantity: self.total_bought,
            total_sold_quantity: self.total_sold,
            total_bought_value: self.total_bought_value,
            total_sold_value: self.total_sold_value,
            lots: self.open_lots,
        }))
    }
}

fn sum_values(transactions: &[&Transaction], context: &str) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for tx in transactions {
        total = checked_add(total, tx.value()?, context)?;
    }
    Ok(total)
}

/// Replays a symbol's history in matching order (timestamp, then insertion)
/// and fails on the first sell that exceeds the shares held before it.
fn check_chronological_holdings(symbol: &str, transactions: &[&Transaction]) -> Result<()> {
    let mut ordered: Vec<&Transaction> = transactions.to_vec();
    ordered.sort_by_key(|tx| tx.timestamp);

    let mut held = Decimal::ZERO;
    for tx in ordered {
        if tx.is_buy() {
            held = checked_add(held, tx.quantity, "held quantity")?;
            continue;
        }
        if tx.quantity > held {
            warn!(
                "Sell {} of {} {} on {} exceeds the {} shares held",
                tx.id, tx.quantity, symbol, tx.timestamp, held
            );
            return Err(ValidationError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: tx.quantity,
                available: held,
            }
            .into());
        }
        held -= tx.quantity;
    }
    Ok(())
}

/// Groups transactions by normalized symbol, keeping insertion order inside
/// each group. Symbols come out sorted.
fn group_by_symbol(transactions: &[Transaction]) -> BTreeMap<String, Vec<&Transaction>> {
    let mut grouped: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        grouped
            .entry(normalize_symbol(&tx.symbol))
            .or_default()
            .push(tx);
    }
    grouped
}

/// Computes every open holding, sorted by symbol.
///
/// Strict: an invalid record or an oversold symbol anywhere fails the whole
/// call and nothing is returned. Use [`compute_holdings_report`] to isolate
/// failures per symbol.
pub fn compute_holdings(transactions: &[Transaction]) -> Result<Vec<HoldingSummary>> {
    let mut holdings = Vec::new();
    for (symbol, group) in group_by_symbol(transactions) {
        let ledger = SymbolLedger::build(&symbol, &group)?;
        if let Some(holding) = ledger.into_holding()? {
            holdings.push(holding);
        }
    }
    debug!(
        "Computed {} holdings from {} transactions",
        holdings.len(),
        transactions.len()
    );
    Ok(holdings)
}

/// Computes holdings symbol by symbol; a failing symbol is reported and
/// skipped without touching the others.
pub fn compute_holdings_report(transactions: &[Transaction]) -> HoldingsReport {
    let mut report = HoldingsReport::default();

    for (symbol, group) in group_by_symbol(transactions) {
        let outcome = SymbolLedger::build(&symbol, &group).and_then(|ledger| {
            let realized_pl = checked_add(report.realized_pl, ledger.realized_pl(), "realized P&L")?;
            Ok((realized_pl, ledger.into_holding()?))
        });
        match outcome {
            Ok((realized_pl, holding)) => {
                report.realized_pl = realized_pl;
                report.holdings.extend(holding);
            }
            Err(e) => {
                warn!("Excluding {} from holdings: {}", symbol, e);
                report.failures.push(SymbolFailure {
                    symbol,
                    message: e.to_string(),
                });
            }
        }
    }
    report
}

/// Computes the holding for a single symbol, `None` when the position is
/// closed or the symbol was never traded.
pub fn compute_symbol_holding(
    transactions: &[Transaction],
    symbol: &str,
) -> Result<Option<HoldingSummary>> {
    let symbol = normalize_symbol(symbol);
    let group: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| normalize_symbol(&tx.symbol) == symbol)
        .collect();
    if group.is_empty() {
        return Ok(None);
    }
    SymbolLedger::build(&symbol, &group)?.into_holding()
}

/// Aggregate realized profit/loss across all symbols, closed positions
/// included: Σ sell value − Σ buy value.
pub fn compute_realized_pl(transactions: &[Transaction]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for (symbol, group) in group_by_symbol(transactions) {
        let realized_pl = SymbolLedger::build(&symbol, &group)?.realized_pl();
        total = checked_add(total, realized_pl, "realized P&L")?;
    }
    Ok(total)
}

/// Shares of `symbol` currently available to sell (Σ buys − Σ sells).
pub fn available_quantity(transactions: &[Transaction], symbol: &str) -> Result<Decimal> {
    let symbol = normalize_symbol(symbol);
    transactions
        .iter()
        .filter(|tx| normalize_symbol(&tx.symbol) == symbol)
        .try_fold(Decimal::ZERO, |acc, tx| {
            if tx.is_buy() {
                checked_add(acc, tx.quantity, "available quantity")
            } else {
                checked_sub(acc, tx.quantity, "available quantity")
            }
        })
}

/// Checks that selling `quantity` shares of `symbol` is covered by the
/// recorded history.
pub fn validate_sell(transactions: &[Transaction], symbol: &str, quantity: Decimal) -> Result<()> {
    let symbol = normalize_symbol(symbol);
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity { symbol, quantity }.into());
    }

    let mut available = available_quantity(transactions, &symbol)?;
    if available.is_sign_negative() {
        warn!(
            "Recorded history of {} is already oversold ({}); reporting 0 available",
            symbol, available
        );
        available = Decimal::ZERO;
    }

    if quantity > available {
        return Err(ValidationError::InsufficientShares {
            symbol,
            requested: quantity,
            available,
        }
        .into());
    }
    Ok(())
}
