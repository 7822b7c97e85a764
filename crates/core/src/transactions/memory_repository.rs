//! In-process transaction store.
//!
//! Writes are compare-and-write: the history check for the affected symbol
//! and the mutation happen inside one write-lock critical section, so two
//! concurrent sells cannot both pass against the same snapshot.

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{Error, Result};
use crate::portfolio::holdings::{compute_symbol_holding, normalize_symbol};
use crate::transactions::{Transaction, TransactionRepositoryTrait};

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store without any checks, e.g. from a trusted snapshot.
    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: RwLock::new(transactions),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Transaction>>> {
        self.transactions
            .read()
            .map_err(|e| Error::Repository(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Transaction>>> {
        self.transactions
            .write()
            .map_err(|e| Error::Repository(e.to_string()))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }
}

/// Checks that `candidate` (a user's history for one symbol) stays
/// consistent: every record valid and no sell exceeding what was held.
fn check_symbol_history(candidate: &[Transaction], symbol: &str) -> Result<()> {
    compute_symbol_holding(candidate, symbol).map(|_| ())
}

fn symbol_history<'a>(
    stored: &'a [Transaction],
    user_id: &'a str,
    symbol: &'a str,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    stored
        .iter()
        .filter(move |tx| tx.user_id == user_id && normalize_symbol(&tx.symbol) == symbol)
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryTransactionRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.read()?
            .iter()
            .find(|tx| tx.id == transaction_id)
            .cloned()
            .ok_or_else(|| Error::Repository(format!("Transaction not found: {}", transaction_id)))
    }

    fn get_transactions_by_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .read()?
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_transactions_by_user_and_symbol(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>> {
        let symbol = normalize_symbol(symbol);
        Ok(symbol_history(&self.read()?, user_id, &symbol)
            .cloned()
            .collect())
    }

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        transaction.validate()?;
        let symbol = normalize_symbol(&transaction.symbol);

        let mut stored = self.write()?;
        if stored.iter().any(|tx| tx.id == transaction.id) {
            return Err(Error::Repository(format!(
                "Transaction already exists: {}",
                transaction.id
            )));
        }

        if transaction.is_sell() {
            let mut candidate: Vec<Transaction> =
                symbol_history(&stored, &transaction.user_id, &symbol)
                    .cloned()
                    .collect();
            candidate.push(transaction.clone());
            if let Err(e) = check_symbol_history(&candidate, &symbol) {
                warn!(
                    "Rejected sell {} of {} {} for user {}: {}",
                    transaction.id, transaction.quantity, symbol, transaction.user_id, e
                );
                return Err(e);
            }
        }

        stored.push(transaction.clone());
        debug!(
            "Stored {} {} {} for user {}",
            transaction.side, transaction.quantity, symbol, transaction.user_id
        );
        Ok(transaction)
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction> {
        let mut stored = self.write()?;
        let position = stored
            .iter()
            .position(|tx| tx.id == transaction_id && tx.user_id == user_id)
            .ok_or_else(|| Error::Repository(format!("Transaction not found: {}", transaction_id)))?;

        // Removing a buy must not strand later sells.
        if stored[position].is_buy() {
            let symbol = normalize_symbol(&stored[position].symbol);
            let remaining: Vec<Transaction> = symbol_history(&stored, user_id, &symbol)
                .filter(|tx| tx.id != transaction_id)
                .cloned()
                .collect();
            check_symbol_history(&remaining, &symbol)?;
        }

        let removed = stored.remove(position);
        debug!("Deleted transaction {} for user {}", removed.id, user_id);
        Ok(removed)
    }
}
