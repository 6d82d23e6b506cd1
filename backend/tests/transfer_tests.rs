//! Stock transfer and conversion tests
//!
//! Tests for the yield arithmetic, frozen transfer financials and the
//! business-impact classification. Shrinkage is always measured against
//! the declared conversion ratio and valued at the destination cost.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    business_impact, conversion_ratio, destination_quantity, expected_yield,
    inventory_value_change, shrinkage_quantity, shrinkage_value, transfer_financials,
    validate_transfer_plan, TransferEndpoint, TransferStatus, TransferType,
};
use shared::types::Severity;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn endpoint(name: &str, cost: &str, stock: &str) -> TransferEndpoint {
    TransferEndpoint {
        name: name.to_string(),
        cost_price: dec(cost),
        stock_quantity: dec(stock),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_conversion_ratio() {
        assert_eq!(conversion_ratio(dec("10"), dec("20")), dec("2"));
        assert_eq!(conversion_ratio(dec("4"), dec("1")), dec("0.25"));
    }

    #[test]
    fn test_conversion_ratio_defaults_to_one() {
        assert_eq!(conversion_ratio(Decimal::ZERO, dec("20")), Decimal::ONE);
        assert_eq!(conversion_ratio(dec("10"), Decimal::ZERO), Decimal::ONE);
    }

    #[test]
    fn test_expected_yield_and_shrinkage() {
        let expected = expected_yield(dec("10"), dec("2"));
        assert_eq!(expected, dec("20"));

        assert_eq!(shrinkage_quantity(expected, dec("18")), dec("2"));
        // Surplus never reports negative shrinkage
        assert_eq!(shrinkage_quantity(expected, dec("22")), Decimal::ZERO);
        assert_eq!(shrinkage_value(dec("2"), dec("0.50")), dec("1.00"));
    }

    #[test]
    fn test_split_destination_derives_from_ratio() {
        let qty = destination_quantity(TransferType::Split, dec("10"), dec("99"), dec("0.5"));
        assert_eq!(qty, dec("5.0"));
    }

    #[test]
    fn test_non_split_destination_uses_declared_quantity() {
        for t in [TransferType::Conversion, TransferType::Transfer, TransferType::Adjustment] {
            let qty = destination_quantity(t, dec("10"), dec("18"), dec("2"));
            assert_eq!(qty, dec("18"));
        }
    }

    #[test]
    fn test_conversion_with_shrinkage() {
        // Declared ratio 2.0: 10 units in should make 20, only 18 produced.
        // Source costs 1.00/unit, destination 0.50/unit, both well stocked.
        let f = transfer_financials(
            TransferType::Conversion,
            dec("10"),
            dec("18"),
            dec("2"),
            dec("1.00"),
            dec("0.50"),
            dec("50"),
            dec("30"),
        );

        assert_eq!(f.quantity_added, dec("18"));
        assert_eq!(f.from_product_cost, dec("10.00"));
        assert_eq!(f.to_product_cost, dec("9.00"));
        assert_eq!(f.cost_impact, dec("-1.00"));
        assert_eq!(f.shrinkage_quantity, dec("2"));
        assert_eq!(f.shrinkage_value, dec("1.00"));
        // Source loses 10.00 of value, destination gains 9.00
        assert_eq!(f.net_inventory_value_change, dec("-1.00"));
    }

    #[test]
    fn test_exact_yield_has_no_shrinkage() {
        let f = transfer_financials(
            TransferType::Conversion,
            dec("10"),
            dec("20"),
            dec("2"),
            dec("1.00"),
            dec("0.50"),
            dec("50"),
            dec("30"),
        );

        assert_eq!(f.shrinkage_quantity, Decimal::ZERO);
        assert_eq!(f.shrinkage_value, Decimal::ZERO);
        assert_eq!(f.cost_impact, Decimal::ZERO);
    }

    #[test]
    fn test_financials_clamp_negative_stock_values() {
        // Source already oversold: deducting from it moves no real value
        let f = transfer_financials(
            TransferType::Transfer,
            dec("5"),
            dec("5"),
            dec("1"),
            dec("2.00"),
            dec("2.00"),
            dec("-3"),
            dec("10"),
        );

        // Destination gains 10.00, source side contributes nothing
        assert_eq!(f.net_inventory_value_change, dec("10.00"));
    }

    #[test]
    fn test_business_impact_high_shrinkage() {
        let impact = business_impact(
            TransferType::Conversion,
            dec("-2.00"),
            dec("-2.00"),
            dec("12.00"),
            dec("1.00"),
            dec("0.50"),
        );

        assert_eq!(impact.cost_impact_type, "Shrinkage loss");
        assert_eq!(impact.cost_impact_level, "HIGH");
        assert!(impact.shrinkage_detected);
        assert!(impact.needs_review);
        assert_eq!(impact.alert_level, Severity::Critical);
    }

    #[test]
    fn test_business_impact_critical_shrinkage() {
        let impact = business_impact(
            TransferType::Split,
            Decimal::ZERO,
            dec("-25.00"),
            dec("25.00"),
            dec("1.00"),
            dec("1.00"),
        );

        assert_eq!(impact.cost_impact_level, "CRITICAL");
        assert!(impact
            .recommendations
            .iter()
            .any(|r| r.contains("Management review required")));
    }

    #[test]
    fn test_business_impact_small_shrinkage_no_review() {
        let impact = business_impact(
            TransferType::Conversion,
            Decimal::ZERO,
            dec("-1.00"),
            dec("1.00"),
            dec("1.00"),
            dec("0.50"),
        );

        assert_eq!(impact.cost_impact_level, "MEDIUM");
        assert!(!impact.needs_review);
        assert_eq!(impact.alert_level, Severity::Low);
    }

    #[test]
    fn test_business_impact_zero_cost_is_critical() {
        let impact = business_impact(
            TransferType::Transfer,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            dec("1.00"),
        );

        assert_eq!(impact.cost_impact_type, "Zero cost alert");
        assert!(impact.needs_review);
        assert!(impact
            .recommendations
            .iter()
            .any(|r| r.contains("Set proper cost prices")));
    }

    #[test]
    fn test_business_impact_cost_neutral() {
        let impact = business_impact(
            TransferType::Adjustment,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            dec("1.00"),
            dec("1.00"),
        );

        assert_eq!(impact.cost_impact_type, "Cost neutral");
        assert!(!impact.needs_review);
    }

    #[test]
    fn test_business_impact_large_cost_swing_needs_review() {
        let impact = business_impact(
            TransferType::Transfer,
            dec("60.00"),
            dec("60.00"),
            Decimal::ZERO,
            dec("1.00"),
            dec("2.00"),
        );

        assert_eq!(impact.cost_impact_type, "Cost increase");
        assert_eq!(impact.cost_impact_level, "HIGH");
        assert!(impact.needs_review);
    }

    #[test]
    fn test_validation_zero_cost_source_is_error() {
        let from = endpoint("Bulk beans", "0", "50");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("20"),
            dec("2"),
        );

        assert!(!v.is_ok());
        assert!(v.errors.iter().any(|e| e.contains("no cost price")));
    }

    #[test]
    fn test_validation_zero_cost_destination_is_error() {
        let from = endpoint("Bulk beans", "1.00", "50");
        let to = endpoint("Retail pack", "0", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("20"),
            dec("2"),
        );

        assert!(!v.is_ok());
        assert!(v.errors.iter().any(|e| e.contains("'Retail pack'")));
    }

    #[test]
    fn test_validation_insufficient_stock_is_error() {
        let from = endpoint("Bulk beans", "1.00", "5");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("20"),
            dec("2"),
        );

        assert!(!v.is_ok());
        assert!(v.errors.iter().any(|e| e.contains("Insufficient stock")));
    }

    #[test]
    fn test_validation_unresolved_products_are_errors() {
        let v = validate_transfer_plan(
            None,
            None,
            Some("99990000"),
            None,
            dec("10"),
            dec("10"),
            Decimal::ONE,
        );

        assert!(!v.is_ok());
        assert!(v
            .errors
            .iter()
            .any(|e| e.contains("not found: 99990000")));
        assert!(v
            .errors
            .iter()
            .any(|e| e.contains("Destination product must be specified")));
    }

    #[test]
    fn test_validation_non_positive_quantities_are_errors() {
        let from = endpoint("Bulk beans", "1.00", "50");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            Decimal::ZERO,
            dec("-1"),
            Decimal::ONE,
        );

        assert!(v.errors.iter().any(|e| e.contains("Source quantity")));
        assert!(v.errors.iter().any(|e| e.contains("Destination quantity")));
    }

    #[test]
    fn test_validation_shrinkage_is_warning_only() {
        // Ratio 2: 10 in should make 20, only 18 declared
        let from = endpoint("Bulk beans", "1.00", "50");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("18"),
            dec("2"),
        );

        assert!(v.is_ok());
        assert_eq!(v.warnings.len(), 1);
        assert!(v.warnings[0].contains("Shrinkage detected"));
    }

    #[test]
    fn test_validation_surplus_is_warning_only() {
        let from = endpoint("Bulk beans", "1.00", "50");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("22"),
            dec("2"),
        );

        assert!(v.is_ok());
        assert_eq!(v.warnings.len(), 1);
        assert!(v.warnings[0].contains("Surplus detected"));
    }

    #[test]
    fn test_validation_clean_transfer_passes() {
        let from = endpoint("Bulk beans", "1.00", "50");
        let to = endpoint("Retail pack", "0.50", "0");
        let v = validate_transfer_plan(
            Some(&from),
            Some(&to),
            None,
            None,
            dec("10"),
            dec("20"),
            dec("2"),
        );

        assert!(v.is_ok());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_type_and_status_round_trips() {
        for transfer_type in [
            TransferType::Conversion,
            TransferType::Transfer,
            TransferType::Adjustment,
            TransferType::Split,
        ] {
            assert_eq!(TransferType::parse(transfer_type.as_str()), Some(transfer_type));
        }
        for status in [
            TransferStatus::Pending,
            TransferStatus::Completed,
            TransferStatus::Cancelled,
        ] {
            assert_eq!(TransferStatus::parse(status.as_str()), Some(status));
        }
        assert!(TransferType::parse("MERGE").is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn ratio_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=400i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (-10000i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn transfer_type_strategy() -> impl Strategy<Value = TransferType> {
        prop_oneof![
            Just(TransferType::Conversion),
            Just(TransferType::Transfer),
            Just(TransferType::Adjustment),
            Just(TransferType::Split),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Shrinkage quantity and value are never negative
        #[test]
        fn prop_shrinkage_never_negative(
            transfer_type in transfer_type_strategy(),
            from_qty in quantity_strategy(),
            to_qty in quantity_strategy(),
            ratio in ratio_strategy(),
            from_cost in cost_strategy(),
            to_cost in cost_strategy(),
            from_stock in stock_strategy(),
            to_stock in stock_strategy()
        ) {
            let f = transfer_financials(
                transfer_type, from_qty, to_qty, ratio,
                from_cost, to_cost, from_stock, to_stock,
            );

            prop_assert!(f.shrinkage_quantity >= Decimal::ZERO);
            prop_assert!(f.shrinkage_value >= Decimal::ZERO);
            prop_assert_eq!(f.shrinkage_value, f.shrinkage_quantity * to_cost);
        }

        /// Splits never report shrinkage: the destination quantity is the
        /// expected yield by construction
        #[test]
        fn prop_split_has_no_shrinkage(
            from_qty in quantity_strategy(),
            to_qty in quantity_strategy(),
            ratio in ratio_strategy(),
            from_cost in cost_strategy(),
            to_cost in cost_strategy()
        ) {
            let f = transfer_financials(
                TransferType::Split, from_qty, to_qty, ratio,
                from_cost, to_cost, from_qty, Decimal::ZERO,
            );

            prop_assert_eq!(f.quantity_added, from_qty * ratio);
            prop_assert_eq!(f.shrinkage_quantity, Decimal::ZERO);
        }

        /// An uncosted side is always a blocking error, whatever the quantities
        #[test]
        fn prop_zero_cost_never_validates(
            from_qty in quantity_strategy(),
            to_qty in quantity_strategy(),
            ratio in ratio_strategy(),
            cost in cost_strategy(),
            stock in (0i64..=100000i64).prop_map(|n| Decimal::new(n, 1))
        ) {
            let uncosted = TransferEndpoint {
                name: "Uncosted".to_string(),
                cost_price: Decimal::ZERO,
                stock_quantity: stock,
            };
            let costed = TransferEndpoint {
                name: "Costed".to_string(),
                cost_price: cost,
                stock_quantity: stock,
            };

            let v = validate_transfer_plan(
                Some(&uncosted), Some(&costed), None, None, from_qty, to_qty, ratio,
            );
            prop_assert!(!v.is_ok());

            let v = validate_transfer_plan(
                Some(&costed), Some(&uncosted), None, None, from_qty, to_qty, ratio,
            );
            prop_assert!(!v.is_ok());
        }

        /// The frozen net change equals the sum of the two per-side
        /// valuation deltas the ledger entries produce
        #[test]
        fn prop_net_change_matches_ledger_deltas(
            transfer_type in transfer_type_strategy(),
            from_qty in quantity_strategy(),
            to_qty in quantity_strategy(),
            ratio in ratio_strategy(),
            from_cost in cost_strategy(),
            to_cost in cost_strategy(),
            from_stock in stock_strategy(),
            to_stock in stock_strategy()
        ) {
            let f = transfer_financials(
                transfer_type, from_qty, to_qty, ratio,
                from_cost, to_cost, from_stock, to_stock,
            );

            let from_delta =
                inventory_value_change(from_stock, from_stock - from_qty, from_cost);
            let to_delta =
                inventory_value_change(to_stock, to_stock + f.quantity_added, to_cost);

            prop_assert_eq!(f.net_inventory_value_change, from_delta + to_delta);
        }

        /// Cost impact is exactly destination cost minus source cost
        #[test]
        fn prop_cost_impact_decomposition(
            transfer_type in transfer_type_strategy(),
            from_qty in quantity_strategy(),
            to_qty in quantity_strategy(),
            ratio in ratio_strategy(),
            from_cost in cost_strategy(),
            to_cost in cost_strategy(),
            from_stock in stock_strategy(),
            to_stock in stock_strategy()
        ) {
            let f = transfer_financials(
                transfer_type, from_qty, to_qty, ratio,
                from_cost, to_cost, from_stock, to_stock,
            );

            prop_assert_eq!(f.cost_impact, f.to_product_cost - f.from_product_cost);
        }

        /// Shrinkage above the review threshold always flags review
        #[test]
        fn prop_material_shrinkage_needs_review(
            transfer_type in transfer_type_strategy(),
            cost_impact in (-10000i64..=10000i64).prop_map(|n| Decimal::new(n, 2)),
            inventory_change in (-10000i64..=10000i64).prop_map(|n| Decimal::new(n, 2)),
            shrinkage in (501i64..=100000i64).prop_map(|n| Decimal::new(n, 2)),
            from_cost in cost_strategy(),
            to_cost in cost_strategy()
        ) {
            let impact = business_impact(
                transfer_type, cost_impact, inventory_change,
                shrinkage, from_cost, to_cost,
            );

            prop_assert!(impact.needs_review);
            prop_assert!(impact.shrinkage_detected);
            prop_assert_eq!(impact.alert_level, Severity::Critical);
        }

        /// Well-costed, quiet transfers never demand review
        #[test]
        fn prop_quiet_transfer_no_review(
            transfer_type in transfer_type_strategy(),
            cost_impact in (-5000i64..=5000i64).prop_map(|n| Decimal::new(n, 2)),
            inventory_change in (-10000i64..=10000i64).prop_map(|n| Decimal::new(n, 2)),
            from_cost in cost_strategy(),
            to_cost in cost_strategy()
        ) {
            let impact = business_impact(
                transfer_type, cost_impact, inventory_change,
                Decimal::ZERO, from_cost, to_cost,
            );

            if cost_impact.abs() <= Decimal::from(50)
                && inventory_change.abs() <= Decimal::from(100)
            {
                prop_assert!(!impact.needs_review);
                prop_assert!(!impact.shrinkage_detected);
            }
        }
    }
}
