use crate::errors::Result;
use crate::portfolio::holdings::{
    compute_holdings_report, HoldingSummary, PortfolioValuation, PriceSource, ValuedHolding,
};
use crate::quotes::PriceProviderTrait;
use crate::transactions::Transaction;
use crate::utils::decimal_utils::{checked_add, percentage_of};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

pub trait PortfolioValuationServiceTrait: Send + Sync {
    fn value_portfolio(&self, transactions: &[Transaction]) -> Result<PortfolioValuation>;
    fn value_holding(&self, holding: HoldingSummary) -> ValuedHolding;
}

#[derive(Clone)]
pub struct PortfolioValuationService {
    price_provider: Arc<dyn PriceProviderTrait>,
}

impl PortfolioValuationService {
    pub fn new(price_provider: Arc<dyn PriceProviderTrait>) -> Self {
        Self { price_provider }
    }

    // Price lookup with logging; `None` means fall back to average cost.
    fn get_price_or_fallback(&self, symbol: &str) -> Option<Decimal> {
        match self.price_provider.get_current_price(symbol) {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(
                    "PortfolioValuation [{}]: price lookup via '{}' failed: {}. Using average cost.",
                    symbol,
                    self.price_provider.name(),
                    e
                );
                None
            }
        }
    }
}

fn priced_holding(holding: &HoldingSummary, price: Decimal) -> Result<(Decimal, Decimal, Decimal)> {
    let current_value = holding.market_value(price)?;
    let unrealized_pl = holding.unrealized_pl(price)?;
    let unrealized_pl_pct =
        percentage_of(unrealized_pl, holding.cost_basis_remaining, "unrealized P&L %")?;
    Ok((current_value, unrealized_pl, unrealized_pl_pct))
}

fn average_cost_holding(holding: HoldingSummary) -> ValuedHolding {
    ValuedHolding {
        current_price: holding.average_cost,
        price_source: PriceSource::AverageCostFallback,
        current_value: holding.cost_basis_remaining,
        unrealized_pl: None,
        unrealized_pl_pct: None,
        holding,
    }
}

impl PortfolioValuationServiceTrait for PortfolioValuationService {
    fn value_holding(&self, holding: HoldingSummary) -> ValuedHolding {
        let Some(price) = self.get_price_or_fallback(&holding.symbol) else {
            return average_cost_holding(holding);
        };
        match priced_holding(&holding, price) {
            Ok((current_value, unrealized_pl, unrealized_pl_pct)) => ValuedHolding {
                current_price: price,
                price_source: PriceSource::Market,
                current_value,
                unrealized_pl: Some(unrealized_pl),
                unrealized_pl_pct: Some(unrealized_pl_pct),
                holding,
            },
            Err(e) => {
                warn!(
                    "PortfolioValuation [{}]: cannot value at {}: {}. Using average cost.",
                    holding.symbol, price, e
                );
                average_cost_holding(holding)
            }
        }
    }

    fn value_portfolio(&self, transactions: &[Transaction]) -> Result<PortfolioValuation> {
        let report = compute_holdings_report(transactions);
        debug!(
            "Valuing {} holdings ({} symbols excluded)",
            report.holdings.len(),
            report.failures.len()
        );

        let failed_symbols = report.failed_symbols();
        let mut valuation = PortfolioValuation {
            total_realized_pl: report.realized_pl,
            failed_symbols,
            ..Default::default()
        };

        let mut priced_investment = Decimal::ZERO;
        for holding in report.holdings {
            let valued = self.value_holding(holding);

            valuation.total_investment = checked_add(
                valuation.total_investment,
                valued.holding.cost_basis_remaining,
                "total investment",
            )?;
            valuation.current_value =
                checked_add(valuation.current_value, valued.current_value, "current value")?;
            if let Some(unrealized_pl) = valued.unrealized_pl {
                valuation.total_unrealized_pl = checked_add(
                    valuation.total_unrealized_pl,
                    unrealized_pl,
                    "total unrealized P&L",
                )?;
                priced_investment = checked_add(
                    priced_investment,
                    valued.holding.cost_basis_remaining,
                    "priced investment",
                )?;
            }
            valuation.holdings.push(valued);
        }

        valuation.total_unrealized_pl_pct = percentage_of(
            valuation.total_unrealized_pl,
            priced_investment,
            "total unrealized P&L %",
        )?;
        Ok(valuation)
    }
}
