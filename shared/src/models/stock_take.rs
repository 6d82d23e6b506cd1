//! Stock take models and the balancing policy

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weekly counts must reconcile to zero; monthly counts record
/// discrepancies for investigation without failing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockTakeType {
    Weekly,
    Monthly,
}

impl StockTakeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockTakeType::Weekly => "weekly",
            StockTakeType::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(StockTakeType::Weekly),
            "monthly" => Some(StockTakeType::Monthly),
            _ => None,
        }
    }
}

/// Stock take lifecycle; terminal once resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockTakeStatus {
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl StockTakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockTakeStatus::InProgress => "in_progress",
            StockTakeStatus::Completed => "completed",
            StockTakeStatus::Failed => "failed",
            StockTakeStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(StockTakeStatus::InProgress),
            "completed" => Some(StockTakeStatus::Completed),
            "failed" => Some(StockTakeStatus::Failed),
            "cancelled" => Some(StockTakeStatus::Cancelled),
            _ => None,
        }
    }
}

/// Reconciliation outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Pending,
    Balanced,
    Unbalanced,
}

impl BalanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceStatus::Pending => "pending",
            BalanceStatus::Balanced => "balanced",
            BalanceStatus::Unbalanced => "unbalanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BalanceStatus::Pending),
            "balanced" => Some(BalanceStatus::Balanced),
            "unbalanced" => Some(BalanceStatus::Unbalanced),
            _ => None,
        }
    }
}

/// One counted product within a stock take
///
/// `system_quantity` is snapshotted the first time the product is added
/// and never refreshed when the count is corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTakeItem {
    pub id: Uuid,
    pub stock_take_id: Uuid,
    pub product_id: Uuid,
    pub system_quantity: Decimal,
    pub counted_quantity: Decimal,
    pub cost_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockTakeItem {
    pub fn discrepancy(&self) -> Decimal {
        self.counted_quantity - self.system_quantity
    }

    pub fn discrepancy_value(&self) -> Decimal {
        self.discrepancy() * self.cost_price
    }
}

/// Aggregated discrepancy tallies across all items of a stock take
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancySummary {
    pub overstock_count: i32,
    pub understock_count: i32,
    pub exact_count: i32,
    pub total_discrepancy_value: Decimal,
}

impl DiscrepancySummary {
    pub fn is_balanced(&self) -> bool {
        self.overstock_count == 0 && self.understock_count == 0
    }
}

/// Tally discrepancies from (counted, system, cost_price) tuples
pub fn summarize_discrepancies<'a, I>(items: I) -> DiscrepancySummary
where
    I: IntoIterator<Item = &'a StockTakeItem>,
{
    let mut summary = DiscrepancySummary::default();
    for item in items {
        let discrepancy = item.discrepancy();
        if discrepancy > Decimal::ZERO {
            summary.overstock_count += 1;
        } else if discrepancy < Decimal::ZERO {
            summary.understock_count += 1;
        } else {
            summary.exact_count += 1;
        }
        summary.total_discrepancy_value += item.discrepancy_value();
    }
    summary
}

/// Result of applying the balancing policy at completion time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancingOutcome {
    pub status: StockTakeStatus,
    pub balance_status: BalanceStatus,
    pub failure_reason: Option<String>,
}

/// Apply the weekly/monthly balancing policy to a discrepancy summary
pub fn balancing_outcome(
    take_type: StockTakeType,
    summary: &DiscrepancySummary,
) -> BalancingOutcome {
    if summary.is_balanced() {
        return BalancingOutcome {
            status: StockTakeStatus::Completed,
            balance_status: BalanceStatus::Balanced,
            failure_reason: None,
        };
    }
    match take_type {
        StockTakeType::Weekly => BalancingOutcome {
            status: StockTakeStatus::Failed,
            balance_status: BalanceStatus::Unbalanced,
            failure_reason: Some(format!(
                "Weekly stock take must reconcile to zero: {} overstocked, {} understocked, total discrepancy value ${}",
                summary.overstock_count, summary.understock_count, summary.total_discrepancy_value
            )),
        },
        StockTakeType::Monthly => BalancingOutcome {
            status: StockTakeStatus::Completed,
            balance_status: BalanceStatus::Unbalanced,
            failure_reason: Some(format!(
                "Discrepancies recorded for investigation: {} overstocked, {} understocked, total discrepancy value ${}",
                summary.overstock_count, summary.understock_count, summary.total_discrepancy_value
            )),
        },
    }
}
