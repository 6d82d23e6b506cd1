//! Waste recording service
//!
//! Write-offs deduct stock unconditionally: waste never blocks on stock,
//! unlike staff lunches. Every record emits a DAMAGE ledger entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{ApplyMovementInput, LedgerService};
use crate::services::product::ProductService;
use shared::models::{
    batch_severity, format_batch_number, record_severity, waste_value, BatchStatus, MovementType,
    WasteReason,
};
use shared::validation::validate_positive_quantity;

/// Waste service
#[derive(Clone)]
pub struct WasteService {
    db: PgPool,
    ledger: LedgerService,
}

/// Persisted waste batch
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WasteBatchRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub batch_number: String,
    pub reason: String,
    pub reason_details: Option<String>,
    pub status: String,
    pub total_waste_value: Decimal,
    pub total_waste_quantity: Decimal,
    pub recorded_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Persisted waste record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WasteRecordRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub reason: String,
    pub reason_details: Option<String>,
    pub line_code: String,
    pub barcode: Option<String>,
    pub cost_price: Decimal,
    pub waste_value: Decimal,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for opening a waste batch
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub reason: WasteReason,
    pub reason_details: Option<String>,
}

/// Input for recording one wasted product
#[derive(Debug, Deserialize)]
pub struct RecordWasteInput {
    pub product_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub quantity: Decimal,
    pub reason: Option<WasteReason>,
    pub reason_details: Option<String>,
}

/// Waste record with its severity band
#[derive(Debug, Serialize)]
pub struct WasteRecordView {
    #[serde(flatten)]
    pub record: WasteRecordRow,
    pub severity: &'static str,
}

impl From<WasteRecordRow> for WasteRecordView {
    fn from(record: WasteRecordRow) -> Self {
        let severity = record_severity(record.waste_value).as_str();
        Self { record, severity }
    }
}

/// Batch with its severity band
#[derive(Debug, Serialize)]
pub struct WasteBatchView {
    #[serde(flatten)]
    pub batch: WasteBatchRow,
    pub severity: &'static str,
}

impl From<WasteBatchRow> for WasteBatchView {
    fn from(batch: WasteBatchRow) -> Self {
        let severity = batch_severity(batch.total_waste_value).as_str();
        Self { batch, severity }
    }
}

/// Per-reason totals within a waste summary
#[derive(Debug, Serialize, FromRow)]
pub struct WasteReasonTotal {
    pub reason: String,
    pub record_count: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

/// Waste totals over a trailing window of days
#[derive(Debug, Serialize)]
pub struct WasteSummary {
    pub days: i32,
    pub record_count: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
    pub by_reason: Vec<WasteReasonTotal>,
}

impl WasteService {
    pub fn new(db: PgPool, ledger: LedgerService) -> Self {
        Self { db, ledger }
    }

    /// Open a new draft batch
    pub async fn create_batch(
        &self,
        shop_id: Uuid,
        input: CreateBatchInput,
        recorded_by: Option<Uuid>,
    ) -> AppResult<WasteBatchRow> {
        let batch_number = format_batch_number(
            Utc::now().date_naive(),
            &Uuid::new_v4().to_string()[..8],
        );

        let batch = sqlx::query_as::<_, WasteBatchRow>(
            r#"
            INSERT INTO waste_batches (shop_id, batch_number, reason, reason_details, status, recorded_by)
            VALUES ($1, $2, $3, $4, 'DRAFT', $5)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(&batch_number)
        .bind(input.reason.as_str())
        .bind(&input.reason_details)
        .bind(recorded_by)
        .fetch_one(&self.db)
        .await?;

        Ok(batch)
    }

    /// Record waste, standalone or as part of a draft batch
    pub async fn record_waste(
        &self,
        shop_id: Uuid,
        batch_id: Option<Uuid>,
        products: &ProductService,
        input: RecordWasteInput,
        recorded_by: Option<Uuid>,
    ) -> AppResult<WasteRecordView> {
        validate_positive_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let product = match (input.product_id, input.identifier.as_deref()) {
            (Some(id), _) => products.get_product(shop_id, id).await?,
            (None, Some(identifier)) => products
                .find_by_identifier(shop_id, identifier)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Product {}", identifier)))?,
            (None, None) => {
                return Err(AppError::ValidationError(
                    "A product_id or identifier is required".to_string(),
                ))
            }
        };

        let mut tx = self.db.begin().await?;

        // Batch defaults fill in missing reason fields
        let (reason, reason_details) = if let Some(batch_id) = batch_id {
            let batch = Self::get_batch_for_update(&mut tx, shop_id, batch_id).await?;
            if batch.status != BatchStatus::Draft.as_str() {
                return Err(AppError::Conflict {
                    resource: "waste_batch".to_string(),
                    message: "Cannot add items to a completed or cancelled batch".to_string(),
                });
            }
            (
                input
                    .reason
                    .map(|r| r.as_str().to_string())
                    .unwrap_or(batch.reason),
                input.reason_details.or(batch.reason_details),
            )
        } else {
            (
                input
                    .reason
                    .unwrap_or(WasteReason::Other)
                    .as_str()
                    .to_string(),
                input.reason_details,
            )
        };

        let value = waste_value(input.quantity, product.cost_price);

        let record = sqlx::query_as::<_, WasteRecordRow>(
            r#"
            INSERT INTO waste_records (
                shop_id, batch_id, product_id, quantity, reason, reason_details,
                line_code, barcode, cost_price, waste_value, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(batch_id)
        .bind(product.id)
        .bind(input.quantity)
        .bind(&reason)
        .bind(&reason_details)
        .bind(&product.line_code)
        .bind(&product.barcode)
        .bind(product.cost_price)
        .bind(value)
        .bind(recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        self.ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id: product.id,
                    movement_type: MovementType::Damage,
                    quantity_change: -input.quantity,
                    reference_number: Some(format!("Waste record #{}", record.id)),
                    notes: Some(format!("Waste recorded: {}", reason)),
                    performed_by: recorded_by,
                },
            )
            .await?;

        if let Some(batch_id) = batch_id {
            Self::recompute_batch_totals(&mut tx, batch_id).await?;
        }

        tx.commit().await?;

        Ok(record.into())
    }

    /// Mark a draft batch as completed
    pub async fn complete_batch(&self, shop_id: Uuid, batch_id: Uuid) -> AppResult<WasteBatchView> {
        let mut tx = self.db.begin().await?;

        let batch = Self::get_batch_for_update(&mut tx, shop_id, batch_id).await?;
        if batch.status != BatchStatus::Draft.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only draft batches can be completed".to_string(),
            ));
        }

        Self::recompute_batch_totals(&mut tx, batch_id).await?;

        let batch = sqlx::query_as::<_, WasteBatchRow>(
            "UPDATE waste_batches SET status = 'COMPLETED', completed_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(batch.into())
    }

    /// Cancel a draft batch
    ///
    /// Restores the stock each record deducted (RETURN ledger entries),
    /// then deletes the records, so a cancelled batch leaves no net
    /// stock effect behind.
    pub async fn cancel_batch(
        &self,
        shop_id: Uuid,
        batch_id: Uuid,
        performed_by: Option<Uuid>,
    ) -> AppResult<WasteBatchRow> {
        let mut tx = self.db.begin().await?;

        let batch = Self::get_batch_for_update(&mut tx, shop_id, batch_id).await?;
        if batch.status != BatchStatus::Draft.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only draft batches can be cancelled".to_string(),
            ));
        }

        let records = sqlx::query_as::<_, WasteRecordRow>(
            "SELECT * FROM waste_records WHERE batch_id = $1",
        )
        .bind(batch_id)
        .fetch_all(&mut *tx)
        .await?;

        for record in &records {
            self.ledger
                .apply(
                    &mut tx,
                    ApplyMovementInput {
                        shop_id,
                        product_id: record.product_id,
                        movement_type: MovementType::Return,
                        quantity_change: record.quantity,
                        reference_number: Some(format!("Cancelled waste batch {}", batch.batch_number)),
                        notes: None,
                        performed_by,
                    },
                )
                .await?;
        }

        sqlx::query("DELETE FROM waste_records WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut *tx)
            .await?;

        let batch = sqlx::query_as::<_, WasteBatchRow>(
            r#"
            UPDATE waste_batches
            SET status = 'CANCELLED', total_waste_value = 0, total_waste_quantity = 0
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(batch_id = %batch_id, records = records.len(), "Cancelled waste batch");

        Ok(batch)
    }

    /// Get a batch with its records
    pub async fn get_batch(
        &self,
        shop_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<(WasteBatchView, Vec<WasteRecordView>)> {
        let batch = sqlx::query_as::<_, WasteBatchRow>(
            "SELECT * FROM waste_batches WHERE id = $1 AND shop_id = $2",
        )
        .bind(batch_id)
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Waste batch".to_string()))?;

        let records = sqlx::query_as::<_, WasteRecordRow>(
            "SELECT * FROM waste_records WHERE batch_id = $1 ORDER BY created_at",
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        Ok((
            batch.into(),
            records.into_iter().map(WasteRecordView::from).collect(),
        ))
    }

    /// List batches for a shop, newest first
    pub async fn list_batches(&self, shop_id: Uuid) -> AppResult<Vec<WasteBatchView>> {
        let batches = sqlx::query_as::<_, WasteBatchRow>(
            "SELECT * FROM waste_batches WHERE shop_id = $1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(batches.into_iter().map(WasteBatchView::from).collect())
    }

    /// List standalone and batch waste records, newest first
    pub async fn list_records(&self, shop_id: Uuid) -> AppResult<Vec<WasteRecordView>> {
        let records = sqlx::query_as::<_, WasteRecordRow>(
            "SELECT * FROM waste_records WHERE shop_id = $1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records.into_iter().map(WasteRecordView::from).collect())
    }

    /// Waste totals with a per-reason breakdown over the last `days` days
    pub async fn summarize_waste(&self, shop_id: Uuid, days: i32) -> AppResult<WasteSummary> {
        let by_reason = sqlx::query_as::<_, WasteReasonTotal>(
            r#"
            SELECT reason,
                   COUNT(*) AS record_count,
                   COALESCE(SUM(quantity), 0) AS total_quantity,
                   COALESCE(SUM(waste_value), 0) AS total_value
            FROM waste_records
            WHERE shop_id = $1 AND created_at >= NOW() - make_interval(days => $2)
            GROUP BY reason
            ORDER BY total_value DESC
            "#,
        )
        .bind(shop_id)
        .bind(days)
        .fetch_all(&self.db)
        .await?;

        let record_count = by_reason.iter().map(|r| r.record_count).sum();
        let total_quantity = by_reason.iter().map(|r| r.total_quantity).sum();
        let total_value = by_reason.iter().map(|r| r.total_value).sum();

        Ok(WasteSummary {
            days,
            record_count,
            total_quantity,
            total_value,
            by_reason,
        })
    }

    async fn get_batch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<WasteBatchRow> {
        sqlx::query_as::<_, WasteBatchRow>(
            "SELECT * FROM waste_batches WHERE id = $1 AND shop_id = $2 FOR UPDATE",
        )
        .bind(batch_id)
        .bind(shop_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Waste batch".to_string()))
    }

    /// Batch totals are recomputed by summing member records
    async fn recompute_batch_totals(
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE waste_batches SET
                total_waste_value = COALESCE((SELECT SUM(waste_value) FROM waste_records WHERE batch_id = $1), 0),
                total_waste_quantity = COALESCE((SELECT SUM(quantity) FROM waste_records WHERE batch_id = $1), 0)
            WHERE id = $1
            "#,
        )
        .bind(batch_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
