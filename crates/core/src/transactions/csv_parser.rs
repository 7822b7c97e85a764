//! CSV import of transaction records.
//!
//! Header names are matched case-insensitively and a few aliases used by
//! older exports are accepted (`type`, `purchase_price`, `purchase_date`, ...).

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, error};
use rust_decimal::Decimal;
use std::io::Read;

use crate::errors::DataError;
use crate::transactions::{NewTransaction, Transaction};
use crate::utils::decimal_utils::parse_decimal;
use crate::Result;

const SYMBOL_HEADERS: [&str; 2] = ["symbol", "ticker"];
const QUANTITY_HEADERS: [&str; 2] = ["quantity", "qty"];
const PRICE_HEADERS: [&str; 5] = ["price", "unit_price", "unitprice", "purchase_price", "sell_price"];
const SIDE_HEADERS: [&str; 4] = ["side", "type", "transaction_type", "transactiontype"];
const DATE_HEADERS: [&str; 6] = [
    "date",
    "timestamp",
    "transaction_date",
    "purchase_date",
    "sell_date",
    "transactiondate",
];
const NOTES_HEADERS: [&str; 1] = ["notes"];
const ID_HEADERS: [&str; 1] = ["id"];

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct ColumnMap {
    id: Option<usize>,
    symbol: Option<usize>,
    quantity: Option<usize>,
    price: Option<usize>,
    side: Option<usize>,
    date: Option<usize>,
    notes: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> std::result::Result<Self, DataError> {
        let find = |candidates: &[&str]| {
            headers.iter().position(|h| {
                let normalized = h.trim().to_lowercase();
                candidates.iter().any(|c| *c == normalized)
            })
        };

        let map = ColumnMap {
            id: find(&ID_HEADERS[..]),
            symbol: find(&SYMBOL_HEADERS[..]),
            quantity: find(&QUANTITY_HEADERS[..]),
            price: find(&PRICE_HEADERS[..]),
            side: find(&SIDE_HEADERS[..]),
            date: find(&DATE_HEADERS[..]),
            notes: find(&NOTES_HEADERS[..]),
        };

        for (name, column) in [
            ("symbol", map.symbol),
            ("quantity", map.quantity),
            ("price", map.price),
            ("date", map.date),
        ] {
            if column.is_none() {
                return Err(DataError::Csv {
                    row: 1,
                    message: format!("missing required column '{}'", name),
                });
            }
        }
        Ok(map)
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|idx| record.get(idx))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_decimal_cell(value: Option<String>, field: &str, row: usize) -> Result<Option<Decimal>> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let cleaned = raw.replace(',', "");
            parse_decimal(&cleaned)
                .map(Some)
                .map_err(|e| {
                    DataError::Csv {
                        row,
                        message: format!("invalid {} '{}': {}", field, raw, e),
                    }
                    .into()
                })
        }
    }
}

fn record_line(record: &StringRecord) -> Option<usize> {
    record.position().map(|p| p.line() as usize)
}

/// Reads raw records without validating their values.
///
/// Each record comes with its line in the file (1-based, the header is
/// line 1), so later validation errors can point at it.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<(usize, NewTransaction)>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| DataError::Csv {
            row: 1,
            message: e.to_string(),
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| DataError::Csv {
            row: e.position().map_or(index + 2, |p| p.line() as usize),
            message: e.to_string(),
        })?;
        let row = record_line(&record).unwrap_or(index + 2);
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let transaction = NewTransaction {
            id: cell(&record, columns.id),
            symbol: cell(&record, columns.symbol),
            quantity: parse_decimal_cell(cell(&record, columns.quantity), "quantity", row)?,
            unit_price: parse_decimal_cell(cell(&record, columns.price), "price", row)?,
            side: cell(&record, columns.side),
            timestamp: cell(&record, columns.date),
            notes: cell(&record, columns.notes),
        };
        records.push((row, transaction));
    }

    debug!("Parsed {} transaction rows from CSV", records.len());
    Ok(records)
}

/// Parses and validates a CSV export into transactions owned by `user_id`.
///
/// The first invalid row aborts the import with a [`DataError::Csv`]
/// naming its line; nothing is returned partially.
pub fn read_transactions_csv<R: Read>(reader: R, user_id: &str) -> Result<Vec<Transaction>> {
    let records = parse_transactions_csv(reader)?;
    let mut transactions = Vec::with_capacity(records.len());

    for (row, record) in records {
        match record.into_transaction(user_id) {
            Ok(tx) => transactions.push(tx),
            Err(e) => {
                error!("Rejected CSV row {}: {}", row, e);
                return Err(DataError::Csv {
                    row,
                    message: e.to_string(),
                }
                .into());
            }
        }
    }

    if transactions.is_empty() {
        debug!("CSV contained no transactions");
    }
    Ok(transactions)
}
