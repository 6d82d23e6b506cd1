//! Expense vocabulary, including staff lunches taken from stock

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpenseCategory {
    #[serde(rename = "Staff Lunch")]
    StaffLunch,
    #[serde(rename = "Product Expense")]
    ProductExpense,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::StaffLunch => "Staff Lunch",
            ExpenseCategory::ProductExpense => "Product Expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Staff Lunch" => Some(ExpenseCategory::StaffLunch),
            "Product Expense" => Some(ExpenseCategory::ProductExpense),
            _ => None,
        }
    }
}

/// Staff lunch settlement
///
/// `Stock` deducts product stock and must not oversell; `Allowance` is a
/// plain cash expense with no stock effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaffLunchType {
    Stock,
    #[serde(rename = "money")]
    Allowance,
}

impl StaffLunchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffLunchType::Stock => "stock",
            StaffLunchType::Allowance => "money",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock" => Some(StaffLunchType::Stock),
            "money" => Some(StaffLunchType::Allowance),
            _ => None,
        }
    }
}

/// Cost of a staff lunch at the product's current cost price
pub fn staff_lunch_cost(quantity: Decimal, cost_price: Decimal) -> Decimal {
    quantity * cost_price
}
