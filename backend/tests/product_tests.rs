//! Product catalog tests
//!
//! Tests for stock status classification, stock valuation and the
//! restock report arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    is_valid_line_code, profit_margin, received_cost_price, restock_priority_score,
    restock_suggestion, stock_status, stock_value, RestockPriority, StockStatus,
};
use shared::types::{Currency, PriceUnit};
use shared::validation::{
    validate_cost_price, validate_line_code, validate_min_stock_level, validate_sale_price,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_stock_status_out_of_stock() {
        assert_eq!(stock_status(dec("0"), dec("5")), StockStatus::OutOfStock);
        assert_eq!(stock_status(dec("-3"), dec("5")), StockStatus::OutOfStock);
    }

    #[test]
    fn test_stock_status_low_stock() {
        assert_eq!(stock_status(dec("3"), dec("5")), StockStatus::LowStock);
        assert_eq!(stock_status(dec("5"), dec("5")), StockStatus::LowStock);
    }

    #[test]
    fn test_stock_status_normal_band() {
        // Above the minimum but not past three times it
        assert_eq!(stock_status(dec("10"), dec("5")), StockStatus::Normal);
        assert_eq!(stock_status(dec("15"), dec("5")), StockStatus::Normal);
    }

    #[test]
    fn test_stock_status_well_stocked() {
        assert_eq!(stock_status(dec("16"), dec("5")), StockStatus::WellStocked);
    }

    #[test]
    fn test_stock_status_display_strings() {
        assert_eq!(StockStatus::OutOfStock.as_str(), "Out of Stock");
        assert_eq!(StockStatus::LowStock.as_str(), "Low Stock");
        assert_eq!(StockStatus::WellStocked.as_str(), "Well Stocked");
        assert_eq!(StockStatus::Normal.as_str(), "Normal");
    }

    #[test]
    fn test_currency_round_trip() {
        for currency in [Currency::Usd, Currency::Zig] {
            assert_eq!(Currency::parse(currency.code()), Some(currency));
        }
        assert!(Currency::parse("EUR").is_none());
        assert_eq!(Currency::default().to_string(), "USD");
    }

    #[test]
    fn test_price_unit_round_trip() {
        for unit in [
            PriceUnit::Unit,
            PriceUnit::Kg,
            PriceUnit::G,
            PriceUnit::Lb,
            PriceUnit::Oz,
        ] {
            assert_eq!(PriceUnit::parse(unit.as_str()), Some(unit));
        }
        assert!(PriceUnit::parse("litre").is_none());
    }

    #[test]
    fn test_stock_value_never_negative() {
        assert_eq!(stock_value(dec("10"), dec("2.50")), dec("25.00"));
        assert_eq!(stock_value(dec("-3"), dec("2.50")), Decimal::ZERO);
        assert_eq!(stock_value(dec("0"), dec("2.50")), Decimal::ZERO);
    }

    #[test]
    fn test_profit_margin() {
        // Sell at 3.00, cost 2.00: 50% margin on cost
        assert_eq!(profit_margin(dec("3.00"), dec("2.00")), dec("50"));
    }

    #[test]
    fn test_profit_margin_zero_cost() {
        assert_eq!(profit_margin(dec("3.00"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_restock_suggestion_oversold_is_urgent() {
        let s = restock_suggestion(dec("-4"), dec("5"), dec("1.00")).unwrap();
        assert_eq!(s.priority, RestockPriority::Urgent);
        // Clears the oversell and restores the safety level
        assert_eq!(s.suggested_quantity, dec("9"));
        assert_eq!(s.estimated_cost, dec("9.00"));
    }

    #[test]
    fn test_restock_suggestion_out_of_stock_is_high() {
        let s = restock_suggestion(dec("0"), dec("5"), dec("1.00")).unwrap();
        assert_eq!(s.priority, RestockPriority::High);
        assert_eq!(s.suggested_quantity, dec("10"));
    }

    #[test]
    fn test_restock_suggestion_low_stock_is_medium() {
        let s = restock_suggestion(dec("3"), dec("5"), dec("2.00")).unwrap();
        assert_eq!(s.priority, RestockPriority::Medium);
        assert_eq!(s.suggested_quantity, dec("5"));
        assert_eq!(s.estimated_cost, dec("10.00"));
    }

    #[test]
    fn test_restock_suggestion_none_when_healthy() {
        assert!(restock_suggestion(dec("10"), dec("5"), dec("1.00")).is_none());
    }

    #[test]
    fn test_restock_priority_ordering() {
        let oversold = restock_priority_score(dec("-2"), dec("5"));
        let out = restock_priority_score(dec("0"), dec("5"));
        let low = restock_priority_score(dec("3"), dec("5"));
        let healthy = restock_priority_score(dec("10"), dec("5"));

        assert!(oversold > out);
        assert!(out > low);
        assert!(low > healthy);
        assert_eq!(healthy, Decimal::ZERO);
    }

    #[test]
    fn test_line_code_format() {
        assert!(is_valid_line_code("12345678"));
        assert!(!is_valid_line_code("1234567"));
        assert!(!is_valid_line_code("123456789"));
        assert!(!is_valid_line_code("1234567a"));
        assert!(!is_valid_line_code(""));
    }

    #[test]
    fn test_line_code_validation() {
        assert!(validate_line_code("00123456").is_ok());
        assert!(validate_line_code("1234567a").is_err());
        assert!(validate_line_code("1234567").is_err());
    }

    #[test]
    fn test_received_cost_replaces_current() {
        // Latest declared cost wins; receipts never average
        assert_eq!(
            received_cost_price(dec("2.00"), Some(dec("2.50"))),
            dec("2.50")
        );
        assert_eq!(received_cost_price(dec("2.00"), None), dec("2.00"));
        // Declaring zero clears the cost rather than keeping the old one
        assert_eq!(
            received_cost_price(dec("2.00"), Some(Decimal::ZERO)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_price_validations() {
        assert!(validate_sale_price(dec("0.01")).is_ok());
        assert!(validate_sale_price(Decimal::ZERO).is_err());
        assert!(validate_sale_price(dec("-1")).is_err());

        assert!(validate_cost_price(Decimal::ZERO).is_ok());
        assert!(validate_cost_price(dec("-0.01")).is_err());

        assert!(validate_min_stock_level(Decimal::ZERO).is_ok());
        assert!(validate_min_stock_level(dec("-1")).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (-5000i64..=5000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn min_level_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock value is never negative regardless of the signed quantity
        #[test]
        fn prop_stock_value_non_negative(
            quantity in quantity_strategy(),
            cost in cost_strategy()
        ) {
            prop_assert!(stock_value(quantity, cost) >= Decimal::ZERO);
        }

        /// Every product at or below its minimum level gets a suggestion
        #[test]
        fn prop_suggestion_exists_iff_at_or_below_min(
            quantity in quantity_strategy(),
            min_level in min_level_strategy(),
            cost in cost_strategy()
        ) {
            let suggestion = restock_suggestion(quantity, min_level, cost);
            if quantity <= min_level {
                prop_assert!(suggestion.is_some());
            } else {
                prop_assert!(suggestion.is_none());
            }
        }

        /// A suggested restock always brings stock above zero
        #[test]
        fn prop_suggestion_clears_oversell(
            quantity in quantity_strategy(),
            min_level in min_level_strategy(),
            cost in cost_strategy()
        ) {
            if let Some(s) = restock_suggestion(quantity, min_level, cost) {
                prop_assert!(quantity + s.suggested_quantity >= Decimal::ZERO);
                prop_assert_eq!(s.estimated_cost, s.suggested_quantity * cost);
            }
        }

        /// Stock status bands are exhaustive and consistent with their inputs
        #[test]
        fn prop_stock_status_consistent(
            quantity in quantity_strategy(),
            min_level in min_level_strategy()
        ) {
            match stock_status(quantity, min_level) {
                StockStatus::OutOfStock => prop_assert!(quantity <= Decimal::ZERO),
                StockStatus::LowStock => {
                    prop_assert!(quantity > Decimal::ZERO && quantity <= min_level)
                }
                StockStatus::WellStocked => {
                    prop_assert!(quantity > min_level * Decimal::from(3))
                }
                StockStatus::Normal => {
                    prop_assert!(quantity > min_level);
                    prop_assert!(quantity <= min_level * Decimal::from(3));
                }
            }
        }

        /// More urgent situations always score at least as high
        #[test]
        fn prop_priority_score_monotonic(
            min_level in min_level_strategy(),
            positive in (1i64..=1000i64).prop_map(|n| Decimal::new(n, 1))
        ) {
            let oversold = restock_priority_score(-positive, min_level);
            let out = restock_priority_score(Decimal::ZERO, min_level);
            prop_assert!(oversold > out);
        }
    }
}
