//! JSON import of transaction records.
//!
//! The document is an array of objects in the [`NewTransaction`] shape,
//! camelCase with the same aliases the API accepts (`price`, `type`,
//! `date`, ...). Numbers may be JSON numbers or numeric strings.

use log::{debug, error};
use std::io::Read;

use crate::errors::DataError;
use crate::transactions::{NewTransaction, Transaction};
use crate::Result;

/// Parses and validates a JSON array into transactions owned by `user_id`.
///
/// The first invalid record aborts the import with a [`DataError::Malformed`]
/// naming its 1-based position in the array.
pub fn read_transactions_json<R: Read>(reader: R, user_id: &str) -> Result<Vec<Transaction>> {
    let records: Vec<NewTransaction> = serde_json::from_reader(reader)?;
    debug!("Parsed {} transaction records from JSON", records.len());

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.into_transaction(user_id).map_err(|e| {
                error!("Rejected JSON record #{}: {}", index + 1, e);
                DataError::Malformed(format!("record #{}: {}", index + 1, e)).into()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::transactions::TransactionSide;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reads_aliases_and_string_numbers() {
        let data = r#"[
            {"symbol": "aapl", "quantity": 10, "price": "100.5", "type": "buy", "date": "2024-01-02"},
            {"symbol": "AAPL", "quantity": "2.5e0", "unitPrice": 120, "side": "SELL",
             "timestamp": "2024-02-01T10:00:00Z", "notes": "trim"}
        ]"#;

        let txs = read_transactions_json(data.as_bytes(), "u1").unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].symbol, "AAPL");
        assert_eq!(txs[0].unit_price, dec!(100.5));
        assert_eq!(txs[1].side, TransactionSide::Sell);
        assert_eq!(txs[1].quantity, dec!(2.5));
        assert_eq!(txs[1].notes.as_deref(), Some("trim"));
        assert!(txs.iter().all(|tx| tx.user_id == "u1"));
    }

    #[test]
    fn test_invalid_record_names_its_position() {
        let data = r#"[
            {"symbol": "A", "quantity": 1, "price": 10, "date": "2024-01-01"},
            {"symbol": "A", "quantity": 0, "price": 10, "date": "2024-01-02"}
        ]"#;

        match read_transactions_json(data.as_bytes(), "u1").unwrap_err() {
            Error::Data(DataError::Malformed(message)) => {
                assert!(message.starts_with("record #2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_array_document_is_malformed() {
        let err = read_transactions_json(r#"{"symbol": "A"}"#.as_bytes(), "u1").unwrap_err();
        assert!(matches!(err, Error::Data(DataError::Malformed(_))));
    }

    #[test]
    fn test_empty_array() {
        assert!(read_transactions_json("[]".as_bytes(), "u1").unwrap().is_empty());
    }
}
