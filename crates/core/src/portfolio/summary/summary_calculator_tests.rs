#[cfg(test)]
mod tests {
    use crate::errors::{Error, ValidationError};
    use crate::portfolio::summary::{annotate_sell_pl, compute_transaction_summary};
    use crate::transactions::{Transaction, TransactionSide};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tx(
        id: &str,
        symbol: &str,
        side: TransactionSide,
        qty: Decimal,
        price: Decimal,
    ) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        Transaction {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            symbol: symbol.to_string(),
            quantity: qty,
            unit_price: price,
            side,
            timestamp: date,
            notes: None,
            created_at: date,
        }
    }

    #[test]
    fn test_summary_totals_and_counts() {
        let txs = vec![
            tx("1", "AAPL", TransactionSide::Buy, dec!(10), dec!(100)),
            tx("2", "AAPL", TransactionSide::Buy, dec!(10), dec!(120)),
            tx("3", "aapl", TransactionSide::Sell, dec!(5), dec!(130)),
            tx("4", "IBM", TransactionSide::Buy, dec!(2), dec!(50)),
        ];

        let summary = compute_transaction_summary(&txs).unwrap();

        assert_eq!(summary.total_buy_value, dec!(2300));
        assert_eq!(summary.total_sell_value, dec!(650));
        assert_eq!(summary.total_buy_quantity, dec!(22));
        assert_eq!(summary.total_sell_quantity, dec!(5));
        assert_eq!(summary.total_profit_loss, dec!(-1650));
        // −1650 / 2300 × 100
        assert_eq!(summary.total_return_percentage, dec!(-71.7391));
        assert_eq!(summary.counts.total_transactions, 4);
        assert_eq!(summary.counts.buy_transactions, 3);
        assert_eq!(summary.counts.sell_transactions, 1);

        let aapl = &summary.symbols["AAPL"];
        assert_eq!(aapl.total_bought_value, dec!(2200));
        assert_eq!(aapl.total_sold_value, dec!(650));
        assert_eq!(aapl.profit_loss, dec!(-1550));
        assert_eq!(aapl.buy_transactions, 2);
        assert_eq!(aapl.sell_transactions, 1);
        assert_eq!(summary.symbols["IBM"].profit_loss, dec!(-100));
    }

    #[test]
    fn test_return_percentage_zero_without_buys() {
        let txs = vec![tx("1", "AAPL", TransactionSide::Sell, dec!(1), dec!(10))];
        let summary = compute_transaction_summary(&txs).unwrap();
        assert_eq!(summary.total_return_percentage, Decimal::ZERO);
        assert_eq!(summary.total_profit_loss, dec!(10));
    }

    #[test]
    fn test_empty_summary() {
        let summary = compute_transaction_summary(&[]).unwrap();
        assert_eq!(summary.counts.total_transactions, 0);
        assert!(summary.symbols.is_empty());
    }

    #[test]
    fn test_proportional_sell_pl() {
        let txs = vec![
            tx("1", "AAPL", TransactionSide::Buy, dec!(10), dec!(100)),
            tx("2", "AAPL", TransactionSide::Buy, dec!(10), dec!(120)),
            tx("3", "AAPL", TransactionSide::Sell, dec!(5), dec!(130)),
        ];

        let annotated = annotate_sell_pl(&txs).unwrap();

        assert_eq!(annotated.len(), 3);
        assert_eq!(annotated[0].profit_loss, None);
        assert_eq!(annotated[1].profit_loss, None);
        // 650 − 2200 × 5 / 20
        assert_eq!(annotated[2].profit_loss, Some(dec!(100)));
        assert_eq!(annotated[2].transaction.id, "3");
    }

    #[test]
    fn test_sell_without_buys_has_no_pl() {
        let txs = vec![tx("1", "TSLA", TransactionSide::Sell, dec!(1), dec!(200))];
        assert_eq!(annotate_sell_pl(&txs).unwrap()[0].profit_loss, None);
    }

    #[test]
    fn test_totals_out_of_range_are_errors() {
        let big = dec!(50000000000000000000000000000);
        let txs = vec![
            tx("1", "BIG", TransactionSide::Buy, big, dec!(1)),
            tx("2", "BIG", TransactionSide::Buy, big, dec!(1)),
        ];

        assert!(matches!(
            compute_transaction_summary(&txs).unwrap_err(),
            Error::Validation(ValidationError::AmountOverflow(_))
        ));
        assert!(annotate_sell_pl(&txs).is_err());
    }

    #[test]
    fn test_sell_pl_of_large_position_resolves() {
        // 6e28 bought; the pro-rata product 6e28 × 2 is out of range
        let txs = vec![
            tx("1", "BIG", TransactionSide::Buy, dec!(4), dec!(15000000000000000000000000000)),
            tx("2", "BIG", TransactionSide::Sell, dec!(2), dec!(15000000000000000000000000000)),
        ];

        let annotated = annotate_sell_pl(&txs).unwrap();
        assert_eq!(annotated[1].profit_loss, Some(Decimal::ZERO));
    }
}
