//! Stockfolio Core - FIFO cost-basis engine, transactions and valuation.
//!
//! The engine functions are pure: they take a snapshot of one user's
//! transactions and return computed figures. Persistence and price sources
//! are collaborators behind traits.

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod quotes;
pub mod transactions;
pub mod utils;

pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
