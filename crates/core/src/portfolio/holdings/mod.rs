//! Holdings - FIFO lot relief, per-symbol holdings and live valuation.

mod holdings_calculator;
mod holdings_model;
mod holdings_valuation_service;
mod lots_model;

pub use holdings_calculator::*;
pub use holdings_model::*;
pub use holdings_valuation_service::*;
pub use lots_model::*;
