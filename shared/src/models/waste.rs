//! Waste valuation, severity bands and batch numbering

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Why stock was written off
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteReason {
    Expired,
    Damaged,
    Spoiled,
    Stale,
    Contaminated,
    Defective,
    Other,
}

impl WasteReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteReason::Expired => "EXPIRED",
            WasteReason::Damaged => "DAMAGED",
            WasteReason::Spoiled => "SPOILED",
            WasteReason::Stale => "STALE",
            WasteReason::Contaminated => "CONTAMINATED",
            WasteReason::Defective => "DEFECTIVE",
            WasteReason::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EXPIRED" => Some(WasteReason::Expired),
            "DAMAGED" => Some(WasteReason::Damaged),
            "SPOILED" => Some(WasteReason::Spoiled),
            "STALE" => Some(WasteReason::Stale),
            "CONTAMINATED" => Some(WasteReason::Contaminated),
            "DEFECTIVE" => Some(WasteReason::Defective),
            "OTHER" => Some(WasteReason::Other),
            _ => None,
        }
    }

    /// Perishable and handling losses count as shrinkage for reporting
    pub fn is_shrinkage(&self) -> bool {
        matches!(
            self,
            WasteReason::Expired | WasteReason::Damaged | WasteReason::Spoiled | WasteReason::Stale
        )
    }
}

/// Batch lifecycle; items can only be added while DRAFT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Draft,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "DRAFT",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(BatchStatus::Draft),
            "COMPLETED" => Some(BatchStatus::Completed),
            "CANCELLED" => Some(BatchStatus::Cancelled),
            _ => None,
        }
    }
}

/// Value written off, at the cost price snapshotted on the record
pub fn waste_value(quantity: Decimal, cost_price: Decimal) -> Decimal {
    quantity * cost_price
}

/// Severity band for a single waste record
pub fn record_severity(waste_value: Decimal) -> Severity {
    if waste_value > Decimal::from(50) {
        Severity::High
    } else if waste_value > Decimal::from(20) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Severity band for a whole batch; thresholds are double the record bands
pub fn batch_severity(total_waste_value: Decimal) -> Severity {
    if total_waste_value > Decimal::from(100) {
        Severity::High
    } else if total_waste_value > Decimal::from(50) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Batch numbers look like `WB-20260828-4F2A91C3`
pub fn format_batch_number(date: chrono::NaiveDate, unique: &str) -> String {
    format!("WB-{}-{}", date.format("%Y%m%d"), unique.to_uppercase())
}
