//! Validation utilities for the retail POS backend

use rust_decimal::Decimal;

use crate::models::is_valid_line_code;
use crate::types::Currency;

// ============================================================================
// Stock and Pricing Validations
// ============================================================================

/// Validate a quantity used in a sale, waste record or transfer
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate a selling price; items can never sell at or below zero
pub fn validate_sale_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be greater than 0");
    }
    Ok(())
}

/// Validate a cost price; zero is allowed for products without costing
pub fn validate_cost_price(cost_price: Decimal) -> Result<(), &'static str> {
    if cost_price < Decimal::ZERO {
        return Err("Cost price cannot be negative");
    }
    Ok(())
}

/// Validate a minimum stock level
pub fn validate_min_stock_level(level: Decimal) -> Result<(), &'static str> {
    if level < Decimal::ZERO {
        return Err("Minimum stock level cannot be negative");
    }
    Ok(())
}

/// All items on a sale must share the product currency
pub fn validate_currency_match(expected: Currency, actual: Currency) -> Result<(), &'static str> {
    if expected != actual {
        return Err("All sale items must use the same currency");
    }
    Ok(())
}

/// Validate a line code has the generated 8-digit form
pub fn validate_line_code(code: &str) -> Result<(), &'static str> {
    if !is_valid_line_code(code) {
        return Err("Line code must be exactly 8 digits");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number (7-15 digits, optional leading +)
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err("Invalid phone number");
    }
    Ok(())
}
