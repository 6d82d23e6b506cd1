//! Stock transfer and conversion models
//!
//! Covers the validation and yield arithmetic for moving stock between
//! products (conversions, splits, adjustments). Shrinkage is always valued
//! at the destination product's cost price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Kind of stock transfer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    Conversion,
    Transfer,
    Adjustment,
    Split,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Conversion => "CONVERSION",
            TransferType::Transfer => "TRANSFER",
            TransferType::Adjustment => "ADJUSTMENT",
            TransferType::Split => "SPLIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONVERSION" => Some(TransferType::Conversion),
            "TRANSFER" => Some(TransferType::Transfer),
            "ADJUSTMENT" => Some(TransferType::Adjustment),
            "SPLIT" => Some(TransferType::Split),
            _ => None,
        }
    }
}

/// Transfer lifecycle; terminal once resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransferStatus::Pending),
            "COMPLETED" => Some(TransferStatus::Completed),
            "CANCELLED" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }
}

/// Split validation outcome; only errors block processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TransferValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Ratio of produced to consumed units; 1 when either quantity is unset
pub fn conversion_ratio(from_quantity: Decimal, to_quantity: Decimal) -> Decimal {
    if from_quantity > Decimal::ZERO && to_quantity > Decimal::ZERO {
        to_quantity / from_quantity
    } else {
        Decimal::ONE
    }
}

/// Units the conversion should produce at the given ratio
pub fn expected_yield(from_quantity: Decimal, ratio: Decimal) -> Decimal {
    from_quantity * ratio
}

/// Units lost against the expected yield, never negative
pub fn shrinkage_quantity(expected: Decimal, actual: Decimal) -> Decimal {
    (expected - actual).max(Decimal::ZERO)
}

/// Shrinkage valued at the destination cost price
pub fn shrinkage_value(shrinkage_qty: Decimal, to_cost_price: Decimal) -> Decimal {
    shrinkage_qty * to_cost_price
}

/// Quantity credited to the destination product
///
/// SPLIT transfers derive the credited quantity from the ratio; every
/// other type credits the declared destination quantity.
pub fn destination_quantity(
    transfer_type: TransferType,
    from_quantity: Decimal,
    to_quantity: Decimal,
    ratio: Decimal,
) -> Decimal {
    match transfer_type {
        TransferType::Split => from_quantity * ratio,
        _ => to_quantity,
    }
}

/// Frozen financials computed at processing time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFinancials {
    pub conversion_ratio: Decimal,
    pub quantity_added: Decimal,
    pub from_product_cost: Decimal,
    pub to_product_cost: Decimal,
    pub cost_impact: Decimal,
    pub net_inventory_value_change: Decimal,
    pub shrinkage_quantity: Decimal,
    pub shrinkage_value: Decimal,
}

/// Compute all persisted transfer financials in one pass
///
/// `ratio` is the declared conversion ratio (defaulted from the
/// quantities when the caller never set one); shrinkage is measured
/// against it. `from_stock_before`/`to_stock_before` are the stock
/// quantities as read inside the processing transaction, before either
/// side is mutated.
#[allow(clippy::too_many_arguments)]
pub fn transfer_financials(
    transfer_type: TransferType,
    from_quantity: Decimal,
    to_quantity: Decimal,
    ratio: Decimal,
    from_cost_price: Decimal,
    to_cost_price: Decimal,
    from_stock_before: Decimal,
    to_stock_before: Decimal,
) -> TransferFinancials {
    let quantity_added = destination_quantity(transfer_type, from_quantity, to_quantity, ratio);

    let from_product_cost = from_quantity * from_cost_price;
    let to_product_cost = quantity_added * to_cost_price;

    let from_stock_after = from_stock_before - from_quantity;
    let to_stock_after = to_stock_before + quantity_added;
    let from_delta = from_stock_after.max(Decimal::ZERO) * from_cost_price
        - from_stock_before.max(Decimal::ZERO) * from_cost_price;
    let to_delta = to_stock_after.max(Decimal::ZERO) * to_cost_price
        - to_stock_before.max(Decimal::ZERO) * to_cost_price;

    let expected = expected_yield(from_quantity, ratio);
    let shrinkage_qty = shrinkage_quantity(expected, quantity_added);

    TransferFinancials {
        conversion_ratio: ratio,
        quantity_added,
        from_product_cost,
        to_product_cost,
        cost_impact: to_product_cost - from_product_cost,
        net_inventory_value_change: from_delta + to_delta,
        shrinkage_quantity: shrinkage_qty,
        shrinkage_value: shrinkage_value(shrinkage_qty, to_cost_price),
    }
}

/// One side of a transfer as validation sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEndpoint {
    pub name: String,
    pub cost_price: Decimal,
    pub stock_quantity: Decimal,
}

/// Validate a transfer plan against its resolved endpoints
///
/// Unresolved products, missing cost prices, insufficient source stock
/// and non-positive quantities are blocking errors. Shrinkage and surplus
/// against the declared ratio are warnings only.
#[allow(clippy::too_many_arguments)]
pub fn validate_transfer_plan(
    from: Option<&TransferEndpoint>,
    to: Option<&TransferEndpoint>,
    from_identifier: Option<&str>,
    to_identifier: Option<&str>,
    from_quantity: Decimal,
    to_quantity: Decimal,
    ratio: Decimal,
) -> TransferValidation {
    let mut validation = TransferValidation::default();

    match from {
        None => validation.errors.push(match from_identifier {
            Some(identifier) => format!("Source product not found: {}", identifier),
            None => "Source product must be specified".to_string(),
        }),
        Some(from) => {
            // Zero-cost products would hide shrinkage losses entirely
            if from.cost_price <= Decimal::ZERO {
                validation.errors.push(format!(
                    "Source product '{}' has no cost price; shrinkage losses would be masked",
                    from.name
                ));
            }
            if from_quantity > from.stock_quantity {
                validation.errors.push(format!(
                    "Insufficient stock. Available: {}, required: {}",
                    from.stock_quantity, from_quantity
                ));
            }
        }
    }

    match to {
        None => validation.errors.push(match to_identifier {
            Some(identifier) => format!("Destination product not found: {}", identifier),
            None => "Destination product must be specified".to_string(),
        }),
        Some(to) => {
            if to.cost_price <= Decimal::ZERO {
                validation.errors.push(format!(
                    "Destination product '{}' has no cost price; shrinkage losses would be masked",
                    to.name
                ));
            }
        }
    }

    if from_quantity <= Decimal::ZERO {
        validation
            .errors
            .push("Source quantity must be greater than 0".to_string());
    }
    if to_quantity <= Decimal::ZERO {
        validation
            .errors
            .push("Destination quantity must be greater than 0".to_string());
    }

    // Yield analysis: shrinkage and surplus are warnings, not blockers
    if let (Some(_), Some(to)) = (from, to) {
        if from_quantity > Decimal::ZERO && to_quantity > Decimal::ZERO {
            let expected = expected_yield(from_quantity, ratio);
            let actual = to_quantity;

            if actual < expected {
                let qty = expected - actual;
                validation.warnings.push(format!(
                    "Shrinkage detected: expected {} units but only {} produced. Loss: {} units (${})",
                    expected, actual, qty, qty * to.cost_price
                ));
            } else if actual > expected {
                let qty = actual - expected;
                validation.warnings.push(format!(
                    "Surplus detected: expected {} units but produced {}. Gain: {} units (${})",
                    expected, actual, qty, qty * to.cost_price
                ));
            }
        }
    }

    validation
}

/// Derived business-impact view of a processed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessImpact {
    pub cost_impact_type: String,
    pub cost_impact_level: String,
    pub inventory_impact: String,
    pub shrinkage_detected: bool,
    pub shrinkage_amount: Decimal,
    pub recommendations: Vec<String>,
    pub needs_review: bool,
    pub alert_level: Severity,
}

/// Classify a processed transfer by its financial impact
///
/// Shrinkage dominates all other signals. Zero-cost products are flagged
/// as critical even when the transfer is otherwise cost neutral.
pub fn business_impact(
    transfer_type: TransferType,
    cost_impact: Decimal,
    inventory_change: Decimal,
    shrinkage_value: Decimal,
    from_cost_price: Decimal,
    to_cost_price: Decimal,
) -> BusinessImpact {
    let zero_cost = from_cost_price <= Decimal::ZERO || to_cost_price <= Decimal::ZERO;
    let shrinkage_detected = shrinkage_value > Decimal::ZERO;

    let (cost_impact_type, cost_impact_level) = if shrinkage_detected {
        let level = if shrinkage_value > Decimal::from(20) {
            "CRITICAL"
        } else if shrinkage_value > Decimal::from(5) {
            "HIGH"
        } else {
            "MEDIUM"
        };
        ("Shrinkage loss", level)
    } else if cost_impact > Decimal::ZERO {
        let level = if cost_impact > Decimal::from(50) {
            "HIGH"
        } else if cost_impact > Decimal::from(10) {
            "MEDIUM"
        } else {
            "LOW"
        };
        ("Cost increase", level)
    } else if cost_impact < Decimal::ZERO {
        let level = if cost_impact.abs() > Decimal::from(50) {
            "HIGH"
        } else if cost_impact.abs() > Decimal::from(10) {
            "MEDIUM"
        } else {
            "LOW"
        };
        ("Cost savings", level)
    } else if zero_cost {
        ("Zero cost alert", "CRITICAL")
    } else {
        ("Cost neutral", "NONE")
    };

    let inventory_impact = if shrinkage_detected {
        format!("Shrinkage loss: -${:.2}", shrinkage_value)
    } else if inventory_change > Decimal::ZERO {
        format!("Inventory value increased: +${:.2}", inventory_change)
    } else if inventory_change < Decimal::ZERO {
        format!("Inventory value decreased: -${:.2}", inventory_change.abs())
    } else {
        "Inventory value unchanged".to_string()
    };

    let mut recommendations = Vec::new();
    if shrinkage_detected {
        recommendations.push(format!(
            "Investigate shrinkage: ${:.2} loss detected, check handling procedures",
            shrinkage_value
        ));
        recommendations.push("Review staff training on product handling".to_string());
        if shrinkage_value > Decimal::from(20) {
            recommendations.push("Management review required: high shrinkage cost".to_string());
        }
    }
    if zero_cost {
        recommendations.push("Set proper cost prices to track real losses".to_string());
    }
    match transfer_type {
        TransferType::Split => {
            recommendations.push("Monitor splitting process for waste".to_string());
        }
        TransferType::Conversion => {
            recommendations.push("Verify conversion process efficiency".to_string());
        }
        _ => {}
    }
    if cost_impact.abs() > Decimal::from(10) {
        recommendations.push("Review supplier costs and process efficiency".to_string());
    }

    let needs_review = shrinkage_value > Decimal::from(5)
        || cost_impact.abs() > Decimal::from(50)
        || inventory_change.abs() > Decimal::from(100)
        || zero_cost;

    let alert_level = if shrinkage_value > Decimal::from(20) || needs_review {
        Severity::Critical
    } else if shrinkage_value > Decimal::from(5) {
        Severity::High
    } else {
        Severity::Low
    };

    BusinessImpact {
        cost_impact_type: cost_impact_type.to_string(),
        cost_impact_level: cost_impact_level.to_string(),
        inventory_impact,
        shrinkage_detected,
        shrinkage_amount: shrinkage_value,
        recommendations,
        needs_review,
        alert_level,
    }
}
