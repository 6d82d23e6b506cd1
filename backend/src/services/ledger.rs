//! Movement ledger service
//!
//! Single write path for every stock mutation in the system. `apply` runs
//! inside the caller's transaction: the product row update and the ledger
//! insert commit together or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{classify_transition, inventory_value_change, total_cost_value, MovementType};

/// Ledger service owning all stock movement reads and writes
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Input for applying a stock mutation
#[derive(Debug)]
pub struct ApplyMovementInput {
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    /// Positive for additions, negative for deductions
    pub quantity_change: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
}

/// Persisted ledger entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub transition_type: String,
    pub previous_stock: Decimal,
    pub quantity_change: Decimal,
    pub new_stock: Decimal,
    pub cost_price: Decimal,
    pub total_cost_value: Decimal,
    pub inventory_value_change: Decimal,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Product state returned by the in-place stock update
#[derive(Debug, FromRow)]
struct UpdatedStockRow {
    stock_quantity: Decimal,
    min_stock_level: Decimal,
    cost_price: Decimal,
}

/// Filters for listing ledger entries
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<String>,
    pub limit: Option<i64>,
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a stock mutation and record its ledger entry atomically
    ///
    /// The stock update is an in-place increment, so two concurrent
    /// mutations against the same product serialize on the row lock and
    /// neither loses the other's change.
    pub async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: ApplyMovementInput,
    ) -> AppResult<StockMovementRow> {
        if input.quantity_change == Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Quantity change must be non-zero".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, UpdatedStockRow>(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $1, updated_at = NOW()
            WHERE id = $2 AND shop_id = $3
            RETURNING stock_quantity, min_stock_level, cost_price
            "#,
        )
        .bind(input.quantity_change)
        .bind(input.product_id)
        .bind(input.shop_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let new_stock = updated.stock_quantity;
        let previous_stock = new_stock - input.quantity_change;
        let transition =
            classify_transition(previous_stock, new_stock, updated.min_stock_level);

        let movement = sqlx::query_as::<_, StockMovementRow>(
            r#"
            INSERT INTO stock_movements (
                shop_id, product_id, movement_type, transition_type,
                previous_stock, quantity_change, new_stock,
                cost_price, total_cost_value, inventory_value_change,
                reference_number, notes, performed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(input.shop_id)
        .bind(input.product_id)
        .bind(input.movement_type.as_str())
        .bind(transition.as_str())
        .bind(previous_stock)
        .bind(input.quantity_change)
        .bind(new_stock)
        .bind(updated.cost_price)
        .bind(total_cost_value(input.quantity_change, updated.cost_price))
        .bind(inventory_value_change(
            previous_stock,
            new_stock,
            updated.cost_price,
        ))
        .bind(&input.reference_number)
        .bind(&input.notes)
        .bind(input.performed_by)
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!(
            product_id = %input.product_id,
            movement_type = %input.movement_type.as_str(),
            quantity_change = %input.quantity_change,
            new_stock = %new_stock,
            "Recorded stock movement"
        );

        Ok(movement)
    }

    /// List ledger entries for a shop, newest first
    pub async fn list_movements(
        &self,
        shop_id: Uuid,
        filter: MovementFilter,
    ) -> AppResult<Vec<StockMovementRow>> {
        let limit = filter.limit.unwrap_or(100).clamp(1, 500);

        let movements = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT * FROM stock_movements
            WHERE shop_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::text IS NULL OR movement_type = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(shop_id)
        .bind(filter.product_id)
        .bind(filter.movement_type)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Full movement history for one product, newest first
    pub async fn product_history(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockMovementRow>> {
        let movements = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT * FROM stock_movements
            WHERE shop_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }
}
