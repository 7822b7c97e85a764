use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::errors::{Result, ValidationError};
use crate::transactions::Transaction;
use crate::utils::decimal_utils::{checked_add, checked_mul, checked_sum};

/// An open quantity of shares acquired by one buy. Derived, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    /// Id of the buy transaction that opened the lot.
    pub transaction_id: String,
    pub acquisition_date: DateTime<Utc>,
    /// Quantity still held after FIFO relief.
    pub quantity: Decimal,
    /// Price paid per share.
    pub unit_cost: Decimal,
}

impl Lot {
    pub fn from_buy(transaction: &Transaction) -> Self {
        Lot {
            transaction_id: transaction.id.clone(),
            acquisition_date: transaction.timestamp,
            quantity: transaction.quantity,
            unit_cost: transaction.unit_price,
        }
    }

    /// Cost of the quantity still open in this lot.
    pub fn cost_basis(&self) -> Result<Decimal> {
        checked_mul(self.quantity, self.unit_cost, "lot cost basis")
    }
}

/// Sorts buys into FIFO consumption order.
///
/// Ascending by timestamp; `sort_by_key` is stable so equal timestamps keep
/// their original insertion order.
pub fn sort_fifo(buys: &mut [&Transaction]) {
    buys.sort_by_key(|tx| tx.timestamp);
}

/// Relieves `quantity_to_relieve` from the front of `lots` (earliest first).
///
/// Fully consumed lots are removed, a partially consumed lot keeps its unit
/// cost with a reduced quantity. Returns the cost basis of the relieved
/// shares. Asking for more than the lots hold is an error: the lots are left
/// untouched and nothing is clamped.
pub fn relieve_lots_fifo(
    symbol: &str,
    lots: &mut VecDeque<Lot>,
    quantity_to_relieve: Decimal,
) -> Result<Decimal> {
    if quantity_to_relieve.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if quantity_to_relieve.is_sign_negative() {
        return Err(ValidationError::NonPositiveQuantity {
            symbol: symbol.to_string(),
            quantity: quantity_to_relieve,
        }
        .into());
    }

    let available = checked_sum(lots.iter().map(|lot| lot.quantity), "open lot quantity")?;
    if quantity_to_relieve > available {
        warn!(
            "Cannot relieve {} shares of {}: only {} held in open lots",
            quantity_to_relieve, symbol, available
        );
        return Err(ValidationError::InsufficientShares {
            symbol: symbol.to_string(),
            requested: quantity_to_relieve,
            available,
        }
        .into());
    }

    let mut remaining = quantity_to_relieve;
    let mut relieved_cost = Decimal::ZERO;

    while remaining > Decimal::ZERO {
        let Some(lot) = lots.front_mut() else {
            break;
        };

        let taken = std::cmp::min(lot.quantity, remaining);
        let taken_cost = checked_mul(taken, lot.unit_cost, "relieved cost")?;
        relieved_cost = checked_add(relieved_cost, taken_cost, "relieved cost")?;
        remaining -= taken;
        lot.quantity -= taken;

        if lot.quantity.is_zero() {
            debug!("Lot {} of {} fully relieved", lot.transaction_id, symbol);
            lots.pop_front();
        }
    }

    Ok(relieved_cost)
}

/// Builds the lots still open after `total_sold` shares were relieved FIFO.
///
/// `buys` may arrive in any order; they are sorted with [`sort_fifo`].
/// Returns the open lots and the cost basis of the relieved shares.
pub fn build_open_lots(
    symbol: &str,
    buys: &[&Transaction],
    total_sold: Decimal,
) -> Result<(VecDeque<Lot>, Decimal)> {
    let mut ordered: Vec<&Transaction> = buys.to_vec();
    sort_fifo(&mut ordered);

    let mut lots: VecDeque<Lot> = ordered.iter().map(|tx| Lot::from_buy(tx)).collect();
    let relieved_cost = relieve_lots_fifo(symbol, &mut lots, total_sold)?;
    Ok((lots, relieved_cost))
}
