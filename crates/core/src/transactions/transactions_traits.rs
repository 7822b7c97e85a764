use super::transactions_model::*;
use crate::portfolio::holdings::HoldingSummary;
use crate::portfolio::summary::{TransactionSummary, TransactionWithPl};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait defining the contract for Transaction repository operations.
///
/// This is the persistence collaborator of the engine. Implementations own
/// the serialization of sell acceptance: `create_transaction` for a sell must
/// check available shares and insert atomically, so two concurrent sells for
/// the same user and symbol cannot both pass the check.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    /// All transactions of a user, in insertion order.
    fn get_transactions_by_user(&self, user_id: &str) -> Result<Vec<Transaction>>;

    fn get_transactions_by_user_and_symbol(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>>;

    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    /// Deletes a transaction owned by `user_id`, returning the removed record.
    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction>;
}

/// Trait defining the contract for Transaction service operations.
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    fn get_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;
    fn get_transactions_with_pl(&self, user_id: &str) -> Result<Vec<TransactionWithPl>>;
    fn get_holdings(&self, user_id: &str) -> Result<Vec<HoldingSummary>>;
    fn get_realized_pl(&self, user_id: &str) -> Result<Decimal>;
    fn get_summary(&self, user_id: &str) -> Result<TransactionSummary>;
    fn available_quantity(&self, user_id: &str, symbol: &str) -> Result<Decimal>;
    async fn add_transaction(
        &self,
        user_id: &str,
        new_transaction: NewTransaction,
    ) -> Result<Transaction>;
    async fn record_buy(&self, user_id: &str, new_transaction: NewTransaction)
        -> Result<Transaction>;
    async fn record_sell(
        &self,
        user_id: &str,
        new_transaction: NewTransaction,
    ) -> Result<Transaction>;
    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction>;
}
