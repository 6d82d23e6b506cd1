//! Expense service, including staff lunches taken from stock
//!
//! A stock-settled staff lunch is the one deduction path that refuses to
//! oversell: staff cannot eat stock the shop does not have.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{ApplyMovementInput, LedgerService};
use crate::services::product::{ProductRow, ProductService};
use shared::models::{staff_lunch_cost, ExpenseCategory, MovementType, StaffLunchType};
use shared::types::PaymentMethod;
use shared::validation::validate_positive_quantity;

/// Expense service
#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
    ledger: LedgerService,
}

/// Persisted expense
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub vendor: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub product_id: Option<Uuid>,
    pub product_line_code: Option<String>,
    pub product_name: Option<String>,
    pub product_cost_price: Decimal,
    pub quantity: Decimal,
    pub staff_lunch_type: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an expense
#[derive(Debug, Deserialize)]
pub struct CreateExpenseInput {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub vendor: Option<String>,
    pub expense_date: Option<NaiveDate>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub product_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub staff_lunch_type: Option<StaffLunchType>,
}

impl ExpenseService {
    pub fn new(db: PgPool, ledger: LedgerService) -> Self {
        Self { db, ledger }
    }

    /// Record an expense
    ///
    /// Staff lunches settled from stock deduct the product's stock and
    /// ledger the deduction; the expense amount is the consumed quantity
    /// at cost. Allowance lunches and product expenses carry the caller's
    /// amount and touch no stock.
    pub async fn create_expense(
        &self,
        shop_id: Uuid,
        products: &ProductService,
        input: CreateExpenseInput,
        recorded_by: Option<Uuid>,
    ) -> AppResult<ExpenseRow> {
        let from_stock = input.category == ExpenseCategory::StaffLunch
            && input.staff_lunch_type.unwrap_or(StaffLunchType::Stock) == StaffLunchType::Stock;

        let mut tx = self.db.begin().await?;

        let (product, quantity, amount, currency) = if from_stock {
            let product_id = input.product_id.ok_or_else(|| AppError::Validation {
                field: "product_id".to_string(),
                message: "Staff lunch from stock requires a product".to_string(),
            })?;
            let quantity = input.quantity.unwrap_or(Decimal::ZERO);
            validate_positive_quantity(quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;

            // Lock the product row so the stock check and deduction are
            // consistent under concurrent sales
            let product = ProductService::get_for_update(&mut tx, shop_id, product_id).await?;
            if product.stock_quantity < quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Insufficient stock for {}: available {}, requested {}",
                    product.name, product.stock_quantity, quantity
                )));
            }

            let amount = staff_lunch_cost(quantity, product.cost_price);
            let currency = product.currency.clone();
            (Some(product), quantity, amount, currency)
        } else {
            let amount = input.amount.ok_or_else(|| AppError::Validation {
                field: "amount".to_string(),
                message: "Amount is required".to_string(),
            })?;
            if amount <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "amount".to_string(),
                    message: "Amount must be greater than 0".to_string(),
                });
            }
            let product = match input.product_id {
                Some(id) => Some(products.get_product(shop_id, id).await?),
                None => None,
            };
            let currency = product
                .as_ref()
                .map(|p: &ProductRow| p.currency.clone())
                .unwrap_or_else(|| "USD".to_string());
            (product, input.quantity.unwrap_or(Decimal::ZERO), amount, currency)
        };

        let expense = sqlx::query_as::<_, ExpenseRow>(
            r#"
            INSERT INTO expenses (
                shop_id, category, description, amount, currency, payment_method,
                vendor, expense_date, receipt_number, notes,
                product_id, product_line_code, product_name, product_cost_price,
                quantity, staff_lunch_type, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(input.category.as_str())
        .bind(&input.description)
        .bind(amount)
        .bind(&currency)
        .bind(input.payment_method.unwrap_or(PaymentMethod::Cash).as_str())
        .bind(&input.vendor)
        .bind(input.expense_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(&input.receipt_number)
        .bind(&input.notes)
        .bind(product.as_ref().map(|p| p.id))
        .bind(product.as_ref().map(|p| p.line_code.clone()))
        .bind(product.as_ref().map(|p| p.name.clone()))
        .bind(product.as_ref().map(|p| p.cost_price).unwrap_or(Decimal::ZERO))
        .bind(quantity)
        .bind(input.staff_lunch_type.map(|t| t.as_str()))
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        if from_stock {
            let product = product.as_ref().ok_or_else(|| {
                AppError::Internal("Staff lunch product missing after validation".to_string())
            })?;

            self.ledger
                .apply(
                    &mut tx,
                    ApplyMovementInput {
                        shop_id,
                        product_id: product.id,
                        movement_type: MovementType::Other,
                        quantity_change: -quantity,
                        reference_number: Some(format!("Staff lunch expense #{}", expense.id)),
                        notes: Some(format!("Staff lunch: {} units consumed", quantity)),
                        performed_by: recorded_by,
                    },
                )
                .await?;
        }

        tx.commit().await?;

        Ok(expense)
    }

    /// List expenses for a shop, newest first
    pub async fn list_expenses(
        &self,
        shop_id: Uuid,
        category: Option<String>,
    ) -> AppResult<Vec<ExpenseRow>> {
        let expenses = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT * FROM expenses
            WHERE shop_id = $1 AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(shop_id)
        .bind(category)
        .fetch_all(&self.db)
        .await?;

        Ok(expenses)
    }
}
