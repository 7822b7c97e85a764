//! Transaction summaries - aggregate totals and per-sell profit/loss.

mod summary_calculator;
mod summary_model;

pub use summary_calculator::*;
pub use summary_model::*;

#[cfg(test)]
mod summary_calculator_tests;
