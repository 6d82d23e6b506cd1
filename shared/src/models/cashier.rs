//! Cashier account lifecycle

use serde::{Deserialize, Serialize};

/// Cashier account lifecycle
///
/// Registration starts at pending; the owner moves accounts to active or
/// rejected. Only active cashiers can log in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CashierStatus {
    Pending,
    Active,
    Inactive,
    Rejected,
}

impl CashierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashierStatus::Pending => "pending",
            CashierStatus::Active => "active",
            CashierStatus::Inactive => "inactive",
            CashierStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CashierStatus::Pending),
            "active" => Some(CashierStatus::Active),
            "inactive" => Some(CashierStatus::Inactive),
            "rejected" => Some(CashierStatus::Rejected),
            _ => None,
        }
    }

    pub fn can_login(&self) -> bool {
        matches!(self, CashierStatus::Active)
    }
}
