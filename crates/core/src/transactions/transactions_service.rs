use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::{DataError, ValidationError};
use crate::portfolio::holdings::{
    self, compute_holdings, compute_realized_pl, normalize_symbol, validate_sell, HoldingSummary,
};
use crate::portfolio::summary::{
    annotate_sell_pl, compute_transaction_summary, TransactionSummary, TransactionWithPl,
};
use crate::transactions::transactions_model::*;
use crate::transactions::{TransactionRepositoryTrait, TransactionServiceTrait};
use crate::Result;

/// Service for recording transactions and reading portfolio figures from them.
pub struct TransactionService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TransactionService {
    pub fn new(transaction_repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self {
            transaction_repository,
        }
    }

    /// Fast pre-check of a sell against the current snapshot. The repository
    /// repeats the check atomically when storing.
    fn precheck_sell(&self, user_id: &str, transaction: &Transaction) -> Result<()> {
        let history = self
            .transaction_repository
            .get_transactions_by_user_and_symbol(user_id, &transaction.symbol)?;
        validate_sell(&history, &transaction.symbol, transaction.quantity)?;

        let mut candidate = history;
        candidate.push(transaction.clone());
        holdings::compute_symbol_holding(&candidate, &transaction.symbol)?;
        Ok(())
    }

    /// Imports a batch in chronological order, stopping at the first
    /// rejected record. Records stored before the failure stay stored.
    pub async fn import_transactions(
        &self,
        user_id: &str,
        new_transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        let mut transactions = new_transactions
            .into_iter()
            .map(|tx| tx.into_transaction(user_id))
            .collect::<Result<Vec<_>>>()?;
        // Stable: same-day records keep file order.
        transactions.sort_by_key(|tx| tx.timestamp);

        let mut stored = Vec::with_capacity(transactions.len());
        for tx in transactions {
            if tx.is_sell() {
                self.precheck_sell(user_id, &tx)?;
            }
            stored.push(self.transaction_repository.create_transaction(tx).await?);
        }
        info!("Imported {} transactions for user {}", stored.len(), user_id);
        Ok(stored)
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.transaction_repository.get_transactions_by_user(user_id)
    }

    fn get_transactions_with_pl(&self, user_id: &str) -> Result<Vec<TransactionWithPl>> {
        let transactions = self.get_transactions(user_id)?;
        annotate_sell_pl(&transactions)
    }

    fn get_holdings(&self, user_id: &str) -> Result<Vec<HoldingSummary>> {
        let transactions = self.get_transactions(user_id)?;
        compute_holdings(&transactions)
    }

    fn get_realized_pl(&self, user_id: &str) -> Result<Decimal> {
        let transactions = self.get_transactions(user_id)?;
        compute_realized_pl(&transactions)
    }

    fn get_summary(&self, user_id: &str) -> Result<TransactionSummary> {
        let transactions = self.get_transactions(user_id)?;
        compute_transaction_summary(&transactions)
    }

    fn available_quantity(&self, user_id: &str, symbol: &str) -> Result<Decimal> {
        let history = self
            .transaction_repository
            .get_transactions_by_user_and_symbol(user_id, symbol)?;
        Ok(holdings::available_quantity(&history, symbol)?.max(Decimal::ZERO))
    }

    async fn add_transaction(
        &self,
        user_id: &str,
        new_transaction: NewTransaction,
    ) -> Result<Transaction> {
        let transaction = new_transaction.into_transaction(user_id)?;
        if transaction.is_sell() {
            self.precheck_sell(user_id, &transaction)?;
        }
        debug!(
            "Recording {} {} {} @ {} for user {}",
            transaction.side,
            transaction.quantity,
            transaction.symbol,
            transaction.unit_price,
            user_id
        );
        self.transaction_repository
            .create_transaction(transaction)
            .await
    }

    async fn record_buy(
        &self,
        user_id: &str,
        mut new_transaction: NewTransaction,
    ) -> Result<Transaction> {
        match new_transaction.parsed_side()? {
            TransactionSide::Buy => {}
            TransactionSide::Sell => {
                return Err(ValidationError::InvalidInput(
                    "record_buy called with a sell transaction".to_string(),
                )
                .into())
            }
        }
        new_transaction.side = Some(TransactionSide::Buy.to_string());
        self.add_transaction(user_id, new_transaction).await
    }

    async fn record_sell(
        &self,
        user_id: &str,
        mut new_transaction: NewTransaction,
    ) -> Result<Transaction> {
        if new_transaction.side.as_deref().map(str::trim).is_some_and(|s| !s.is_empty())
            && new_transaction.parsed_side()? != TransactionSide::Sell
        {
            return Err(ValidationError::InvalidInput(
                "record_sell called with a buy transaction".to_string(),
            )
            .into());
        }
        new_transaction.side = Some(TransactionSide::Sell.to_string());
        self.add_transaction(user_id, new_transaction).await
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction> {
        if transaction_id.trim().is_empty() {
            return Err(DataError::MissingField("id".to_string()).into());
        }
        let removed = self
            .transaction_repository
            .delete_transaction(user_id, transaction_id)
            .await?;
        info!(
            "Deleted {} {} of {} for user {}",
            removed.side,
            removed.quantity,
            normalize_symbol(&removed.symbol),
            user_id
        );
        Ok(removed)
    }
}
