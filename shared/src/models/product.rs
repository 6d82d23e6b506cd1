//! Stock valuation and restocking rules for the product catalog
//!
//! Stock quantities are signed: overselling drives them negative.
//! Reported stock value is clamped to zero (see [`stock_value`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived stock level classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    WellStocked,
    Normal,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::WellStocked => "Well Stocked",
            StockStatus::Normal => "Normal",
        }
    }
}

/// Reorder urgency tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestockPriority {
    Urgent,
    High,
    Medium,
}

/// Suggested reorder for a product that needs restocking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockSuggestion {
    pub suggested_quantity: Decimal,
    pub reason: String,
    pub priority: RestockPriority,
    pub estimated_cost: Decimal,
}

/// Classify the stock level of a product
///
/// Negative and zero stock both report Out of Stock; the well-stocked
/// band starts above three times the minimum level.
pub fn stock_status(quantity: Decimal, min_level: Decimal) -> StockStatus {
    if quantity <= Decimal::ZERO {
        StockStatus::OutOfStock
    } else if quantity <= min_level {
        StockStatus::LowStock
    } else if quantity > min_level * Decimal::from(3) {
        StockStatus::WellStocked
    } else {
        StockStatus::Normal
    }
}

/// Stock value at cost, never negative
pub fn stock_value(quantity: Decimal, cost_price: Decimal) -> Decimal {
    quantity.max(Decimal::ZERO) * cost_price
}

/// Gross margin as a percentage of cost, zero when cost is unset
pub fn profit_margin(price: Decimal, cost_price: Decimal) -> Decimal {
    if cost_price > Decimal::ZERO {
        (price - cost_price) / cost_price * Decimal::from(100)
    } else {
        Decimal::ZERO
    }
}

/// Suggest a reorder quantity for a product
///
/// Oversold stock is the most urgent case: the suggestion clears the
/// oversell and adds the minimum level as safety stock. Returns `None`
/// when the product does not need restocking.
pub fn restock_suggestion(
    quantity: Decimal,
    min_level: Decimal,
    cost_price: Decimal,
) -> Option<RestockSuggestion> {
    if quantity < Decimal::ZERO {
        let suggested = quantity.abs() + min_level;
        Some(RestockSuggestion {
            suggested_quantity: suggested,
            reason: format!("Clear oversell of {} units plus safety stock", quantity.abs()),
            priority: RestockPriority::Urgent,
            estimated_cost: suggested * cost_price,
        })
    } else if quantity == Decimal::ZERO {
        let suggested = min_level * Decimal::from(2);
        Some(RestockSuggestion {
            suggested_quantity: suggested,
            reason: "Out of stock".to_string(),
            priority: RestockPriority::High,
            estimated_cost: suggested * cost_price,
        })
    } else if quantity <= min_level {
        Some(RestockSuggestion {
            suggested_quantity: min_level,
            reason: format!("Low stock, {} units left", quantity),
            priority: RestockPriority::Medium,
            estimated_cost: min_level * cost_price,
        })
    } else {
        None
    }
}

/// Cost price after receiving stock
///
/// The latest declared cost replaces the current one; receipts never
/// average. An undeclared cost keeps the product's current cost.
pub fn received_cost_price(current_cost: Decimal, declared_cost: Option<Decimal>) -> Decimal {
    declared_cost.unwrap_or(current_cost)
}

/// Numeric restock priority for sorting report rows (higher is more urgent)
pub fn restock_priority_score(quantity: Decimal, min_level: Decimal) -> Decimal {
    if quantity < Decimal::ZERO {
        quantity.abs() * Decimal::from(10) + Decimal::from(100)
    } else if quantity == Decimal::ZERO {
        Decimal::from(50)
    } else if quantity <= min_level {
        (min_level - quantity) * Decimal::from(5)
    } else {
        Decimal::ZERO
    }
}

/// Check a line code has the generated 8-digit form
pub fn is_valid_line_code(code: &str) -> bool {
    code.len() == 8 && code.bytes().all(|b| b.is_ascii_digit())
}
