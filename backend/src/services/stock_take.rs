//! Stock take service
//!
//! A stock take is a measurement record: completing one never adjusts
//! product stock or writes ledger entries. Corrective adjustments are a
//! separate, explicit operation on the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::ProductService;
use shared::models::{
    balancing_outcome, summarize_discrepancies, StockTakeItem, StockTakeStatus, StockTakeType,
};

/// Stock take service
#[derive(Clone)]
pub struct StockTakeService {
    db: PgPool,
}

/// Persisted stock take
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTakeRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub take_type: String,
    pub status: String,
    pub balance_status: String,
    pub overstock_count: i32,
    pub understock_count: i32,
    pub exact_count: i32,
    pub total_discrepancy_value: Decimal,
    pub failure_reason: Option<String>,
    pub notes: Option<String>,
    pub started_by: Option<Uuid>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Persisted stock take item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockTakeItemRow {
    pub id: Uuid,
    pub stock_take_id: Uuid,
    pub product_id: Uuid,
    pub system_quantity: Decimal,
    pub counted_quantity: Decimal,
    pub cost_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockTakeItemRow {
    fn to_model(&self) -> StockTakeItem {
        StockTakeItem {
            id: self.id,
            stock_take_id: self.stock_take_id,
            product_id: self.product_id,
            system_quantity: self.system_quantity,
            counted_quantity: self.counted_quantity,
            cost_price: self.cost_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Item with derived discrepancy fields
#[derive(Debug, Serialize)]
pub struct StockTakeItemView {
    #[serde(flatten)]
    pub item: StockTakeItemRow,
    pub discrepancy: Decimal,
    pub discrepancy_value: Decimal,
}

impl From<StockTakeItemRow> for StockTakeItemView {
    fn from(item: StockTakeItemRow) -> Self {
        let model = item.to_model();
        Self {
            discrepancy: model.discrepancy(),
            discrepancy_value: model.discrepancy_value(),
            item,
        }
    }
}

/// Input for starting a stock take
#[derive(Debug, Deserialize)]
pub struct CreateStockTakeInput {
    pub name: String,
    pub take_type: StockTakeType,
    pub notes: Option<String>,
}

/// Input for counting one product
#[derive(Debug, Deserialize)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub counted_quantity: Decimal,
}

impl StockTakeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Start a stock take session
    pub async fn create_stock_take(
        &self,
        shop_id: Uuid,
        input: CreateStockTakeInput,
        started_by: Option<Uuid>,
    ) -> AppResult<StockTakeRow> {
        let stock_take = sqlx::query_as::<_, StockTakeRow>(
            r#"
            INSERT INTO stock_takes (shop_id, name, take_type, status, balance_status, notes, started_by)
            VALUES ($1, $2, $3, 'in_progress', 'pending', $4, $5)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(&input.name)
        .bind(input.take_type.as_str())
        .bind(&input.notes)
        .bind(started_by)
        .fetch_one(&self.db)
        .await?;

        Ok(stock_take)
    }

    /// Record or correct a count for one product
    ///
    /// The system quantity is snapshotted from the product's current
    /// stock the first time the product is added; corrections update the
    /// counted quantity only.
    pub async fn add_item(
        &self,
        shop_id: Uuid,
        stock_take_id: Uuid,
        products: &ProductService,
        input: AddItemInput,
    ) -> AppResult<StockTakeItemView> {
        if input.counted_quantity < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "counted_quantity".to_string(),
                message: "Counted quantity cannot be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let stock_take = Self::get_for_update(&mut tx, shop_id, stock_take_id).await?;
        if stock_take.status != StockTakeStatus::InProgress.as_str() {
            return Err(AppError::Conflict {
                resource: "stock_take".to_string(),
                message: "Stock take is no longer in progress".to_string(),
            });
        }

        let product = products.get_product(shop_id, input.product_id).await?;

        let item = sqlx::query_as::<_, StockTakeItemRow>(
            r#"
            INSERT INTO stock_take_items (stock_take_id, product_id, system_quantity, counted_quantity, cost_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stock_take_id, product_id)
            DO UPDATE SET counted_quantity = EXCLUDED.counted_quantity, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(stock_take_id)
        .bind(input.product_id)
        .bind(product.stock_quantity)
        .bind(input.counted_quantity)
        .bind(product.cost_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item.into())
    }

    /// Complete a stock take, applying the weekly/monthly balancing policy
    pub async fn complete(
        &self,
        shop_id: Uuid,
        stock_take_id: Uuid,
        completed_by: Option<Uuid>,
    ) -> AppResult<StockTakeRow> {
        let mut tx = self.db.begin().await?;

        let stock_take = Self::get_for_update(&mut tx, shop_id, stock_take_id).await?;
        if stock_take.status != StockTakeStatus::InProgress.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Stock take has already been resolved".to_string(),
            ));
        }

        let take_type = StockTakeType::parse(&stock_take.take_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown stock take type: {}", stock_take.take_type))
        })?;

        let items = sqlx::query_as::<_, StockTakeItemRow>(
            "SELECT * FROM stock_take_items WHERE stock_take_id = $1",
        )
        .bind(stock_take_id)
        .fetch_all(&mut *tx)
        .await?;

        let models: Vec<_> = items.iter().map(StockTakeItemRow::to_model).collect();
        let summary = summarize_discrepancies(&models);
        let outcome = balancing_outcome(take_type, &summary);

        let stock_take = sqlx::query_as::<_, StockTakeRow>(
            r#"
            UPDATE stock_takes SET
                status = $2,
                balance_status = $3,
                overstock_count = $4,
                understock_count = $5,
                exact_count = $6,
                total_discrepancy_value = $7,
                failure_reason = $8,
                completed_by = $9,
                completed_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(stock_take_id)
        .bind(outcome.status.as_str())
        .bind(outcome.balance_status.as_str())
        .bind(summary.overstock_count)
        .bind(summary.understock_count)
        .bind(summary.exact_count)
        .bind(summary.total_discrepancy_value)
        .bind(&outcome.failure_reason)
        .bind(completed_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            stock_take_id = %stock_take_id,
            status = %stock_take.status,
            balance_status = %stock_take.balance_status,
            "Completed stock take"
        );

        Ok(stock_take)
    }

    /// Cancel an in-progress stock take
    pub async fn cancel(&self, shop_id: Uuid, stock_take_id: Uuid) -> AppResult<StockTakeRow> {
        let mut tx = self.db.begin().await?;

        let stock_take = Self::get_for_update(&mut tx, shop_id, stock_take_id).await?;
        if stock_take.status != StockTakeStatus::InProgress.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only in-progress stock takes can be cancelled".to_string(),
            ));
        }

        let stock_take = sqlx::query_as::<_, StockTakeRow>(
            "UPDATE stock_takes SET status = 'cancelled' WHERE id = $1 RETURNING *",
        )
        .bind(stock_take_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(stock_take)
    }

    /// Get a stock take with its items
    pub async fn get_stock_take(
        &self,
        shop_id: Uuid,
        stock_take_id: Uuid,
    ) -> AppResult<(StockTakeRow, Vec<StockTakeItemView>)> {
        let stock_take = sqlx::query_as::<_, StockTakeRow>(
            "SELECT * FROM stock_takes WHERE id = $1 AND shop_id = $2",
        )
        .bind(stock_take_id)
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock take".to_string()))?;

        let items = sqlx::query_as::<_, StockTakeItemRow>(
            "SELECT * FROM stock_take_items WHERE stock_take_id = $1 ORDER BY created_at",
        )
        .bind(stock_take_id)
        .fetch_all(&self.db)
        .await?;

        Ok((
            stock_take,
            items.into_iter().map(StockTakeItemView::from).collect(),
        ))
    }

    /// List stock takes for a shop, newest first
    pub async fn list_stock_takes(&self, shop_id: Uuid) -> AppResult<Vec<StockTakeRow>> {
        let stock_takes = sqlx::query_as::<_, StockTakeRow>(
            "SELECT * FROM stock_takes WHERE shop_id = $1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(stock_takes)
    }

    async fn get_for_update(
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        stock_take_id: Uuid,
    ) -> AppResult<StockTakeRow> {
        sqlx::query_as::<_, StockTakeRow>(
            "SELECT * FROM stock_takes WHERE id = $1 AND shop_id = $2 FOR UPDATE",
        )
        .bind(stock_take_id)
        .bind(shop_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock take".to_string()))
    }
}
