//! Transactions module - records, CSV/JSON import, persistence and service.

mod csv_parser;
mod json_import;
mod memory_repository;
mod transactions_constants;
mod transactions_model;
mod transactions_service;
mod transactions_traits;



pub use csv_parser::{parse_transactions_csv, read_transactions_csv};
pub use json_import::read_transactions_json;
pub use memory_repository::InMemoryTransactionRepository;
pub use transactions_constants::*;
pub use transactions_model::{parse_timestamp, NewTransaction, Transaction, TransactionSide};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
