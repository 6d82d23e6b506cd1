//! Movement ledger vocabulary and transition classification
//!
//! Every stock mutation in the system produces exactly one immutable
//! ledger entry. The arithmetic here is the single source of truth for
//! how a movement is classified and valued.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Business reason for a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Sale,
    Receipt,
    Adjustment,
    Return,
    Damage,
    Theft,
    Transfer,
    Stocktake,
    SupplierReturn,
    Expired,
    Other,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "SALE",
            MovementType::Receipt => "RECEIPT",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Return => "RETURN",
            MovementType::Damage => "DAMAGE",
            MovementType::Theft => "THEFT",
            MovementType::Transfer => "TRANSFER",
            MovementType::Stocktake => "STOCKTAKE",
            MovementType::SupplierReturn => "SUPPLIER_RETURN",
            MovementType::Expired => "EXPIRED",
            MovementType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SALE" => Some(MovementType::Sale),
            "RECEIPT" => Some(MovementType::Receipt),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            "RETURN" => Some(MovementType::Return),
            "DAMAGE" => Some(MovementType::Damage),
            "THEFT" => Some(MovementType::Theft),
            "TRANSFER" => Some(MovementType::Transfer),
            "STOCKTAKE" => Some(MovementType::Stocktake),
            "SUPPLIER_RETURN" => Some(MovementType::SupplierReturn),
            "EXPIRED" => Some(MovementType::Expired),
            "OTHER" => Some(MovementType::Other),
            _ => None,
        }
    }
}

/// Classification of a movement by how it crosses stock boundaries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionType {
    Normal,
    NegativeToPositive,
    PositiveToNegative,
    Restock,
    OverstockCorrection,
}

impl TransitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionType::Normal => "NORMAL",
            TransitionType::NegativeToPositive => "NEGATIVE_TO_POSITIVE",
            TransitionType::PositiveToNegative => "POSITIVE_TO_NEGATIVE",
            TransitionType::Restock => "RESTOCK",
            TransitionType::OverstockCorrection => "OVERSTOCK_CORRECTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(TransitionType::Normal),
            "NEGATIVE_TO_POSITIVE" => Some(TransitionType::NegativeToPositive),
            "POSITIVE_TO_NEGATIVE" => Some(TransitionType::PositiveToNegative),
            "RESTOCK" => Some(TransitionType::Restock),
            "OVERSTOCK_CORRECTION" => Some(TransitionType::OverstockCorrection),
            _ => None,
        }
    }
}

/// Classify a stock transition
///
/// Zero-boundary crossings take precedence; a restock is an addition
/// that starts from oversold stock without reaching zero; an overstock
/// correction is a deduction that crosses the minimum-stock threshold
/// from above.
pub fn classify_transition(
    previous_stock: Decimal,
    new_stock: Decimal,
    min_stock_level: Decimal,
) -> TransitionType {
    let change = new_stock - previous_stock;
    if previous_stock < Decimal::ZERO && new_stock >= Decimal::ZERO {
        TransitionType::NegativeToPositive
    } else if previous_stock >= Decimal::ZERO && new_stock < Decimal::ZERO {
        TransitionType::PositiveToNegative
    } else if change > Decimal::ZERO && previous_stock < Decimal::ZERO {
        TransitionType::Restock
    } else if change < Decimal::ZERO
        && previous_stock > min_stock_level
        && new_stock <= min_stock_level
    {
        TransitionType::OverstockCorrection
    } else {
        TransitionType::Normal
    }
}

/// Absolute value of a movement at cost
pub fn total_cost_value(quantity_change: Decimal, cost_price: Decimal) -> Decimal {
    quantity_change.abs() * cost_price
}

/// Valuation delta of a movement, respecting the never-negative stock-value rule
pub fn inventory_value_change(
    previous_stock: Decimal,
    new_stock: Decimal,
    cost_price: Decimal,
) -> Decimal {
    new_stock.max(Decimal::ZERO) * cost_price - previous_stock.max(Decimal::ZERO) * cost_price
}
