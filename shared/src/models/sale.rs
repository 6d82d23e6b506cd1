//! Sale and refund models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sale lifecycle
///
/// One-way: pending → completed → refunded. A completed sale with partial
/// refunds stays completed until every item is fully refunded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SaleStatus::Pending),
            "completed" => Some(SaleStatus::Completed),
            "refunded" => Some(SaleStatus::Refunded),
            _ => None,
        }
    }
}

/// How a refund is settled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefundType {
    Cash,
    Credit,
    Replacement,
    Exchange,
}

impl RefundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundType::Cash => "cash",
            RefundType::Credit => "credit",
            RefundType::Replacement => "replacement",
            RefundType::Exchange => "exchange",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(RefundType::Cash),
            "credit" => Some(RefundType::Credit),
            "replacement" => Some(RefundType::Replacement),
            "exchange" => Some(RefundType::Exchange),
            _ => None,
        }
    }
}

/// One line of a sale, with unit price frozen at sale time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub refunded: bool,
    pub refund_quantity: Decimal,
    pub refund_reason: Option<String>,
    pub refund_type: Option<RefundType>,
    pub refund_amount: Decimal,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refunded_by: Option<Uuid>,
}

impl SaleItem {
    /// Quantity that has not been refunded yet
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.refund_quantity
    }
}

/// Outcome of applying a refund of `quantity` units to an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPlan {
    pub refund_amount: Decimal,
    pub new_refund_quantity: Decimal,
    pub fully_refunded: bool,
}

/// Refund validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefundError {
    #[error("item already fully refunded")]
    AlreadyRefunded,
    #[error("refund quantity must be positive")]
    NonPositiveQuantity,
    #[error("cannot refund {requested}, only {remaining} remaining")]
    ExceedsRemaining { requested: Decimal, remaining: Decimal },
}

/// Validate a refund against an item and compute the resulting amounts
pub fn plan_refund(item: &SaleItem, quantity: Decimal) -> Result<RefundPlan, RefundError> {
    if item.refunded {
        return Err(RefundError::AlreadyRefunded);
    }
    if quantity <= Decimal::ZERO {
        return Err(RefundError::NonPositiveQuantity);
    }
    let remaining = item.remaining_quantity();
    if quantity > remaining {
        return Err(RefundError::ExceedsRemaining {
            requested: quantity,
            remaining,
        });
    }
    let new_refund_quantity = item.refund_quantity + quantity;
    Ok(RefundPlan {
        refund_amount: quantity * item.unit_price,
        fully_refunded: new_refund_quantity >= item.quantity,
        new_refund_quantity,
    })
}

/// Total for one sale line
pub fn line_total(unit_price: Decimal, quantity: Decimal) -> Decimal {
    unit_price * quantity
}
