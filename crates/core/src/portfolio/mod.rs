//! Portfolio module - holdings, valuation and transaction summaries.

pub mod holdings;
pub mod summary;

pub use holdings::*;
pub use summary::*;
