//! Stock transfer and conversion service
//!
//! Transfers move stock between two products, optionally converting units
//! (e.g. splitting a bulk item into retail packs). Processing is atomic:
//! both stock mutations, both ledger entries and the frozen financials
//! commit together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{ApplyMovementInput, LedgerService};
use crate::services::product::{ProductRow, ProductService};
use shared::models::{
    business_impact, conversion_ratio, transfer_financials, validate_transfer_plan,
    BusinessImpact, MovementType, TransferEndpoint, TransferStatus, TransferType,
    TransferValidation,
};

/// Transfer service
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    ledger: LedgerService,
}

/// Persisted transfer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransferRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub transfer_type: String,
    pub status: String,
    pub from_product_id: Option<Uuid>,
    pub to_product_id: Option<Uuid>,
    pub from_identifier: Option<String>,
    pub to_identifier: Option<String>,
    pub from_quantity: Decimal,
    pub to_quantity: Decimal,
    pub conversion_ratio: Decimal,
    pub from_product_cost: Decimal,
    pub to_product_cost: Decimal,
    pub cost_impact: Decimal,
    pub net_inventory_value_change: Decimal,
    pub shrinkage_quantity: Decimal,
    pub shrinkage_value: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a pending transfer
#[derive(Debug, Deserialize)]
pub struct CreateTransferInput {
    pub transfer_type: TransferType,
    pub from_product_id: Option<Uuid>,
    pub to_product_id: Option<Uuid>,
    pub from_identifier: Option<String>,
    pub to_identifier: Option<String>,
    pub from_quantity: Decimal,
    pub to_quantity: Decimal,
    /// Declared expected ratio; defaults to to_quantity / from_quantity
    pub conversion_ratio: Option<Decimal>,
    pub notes: Option<String>,
}

/// Resolved products for a transfer
struct ResolvedPair {
    from: Option<ProductRow>,
    to: Option<ProductRow>,
}

impl TransferService {
    pub fn new(db: PgPool, ledger: LedgerService) -> Self {
        Self { db, ledger }
    }

    /// Create a pending transfer; validation happens at processing time too
    pub async fn create_transfer(
        &self,
        shop_id: Uuid,
        products: &ProductService,
        input: CreateTransferInput,
        created_by: Option<Uuid>,
    ) -> AppResult<(TransferRow, TransferValidation)> {
        let transfer = sqlx::query_as::<_, TransferRow>(
            r#"
            INSERT INTO stock_transfers (
                shop_id, transfer_type, status, from_product_id, to_product_id,
                from_identifier, to_identifier, from_quantity, to_quantity,
                conversion_ratio, notes, created_by
            )
            VALUES ($1, $2, 'PENDING', $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(input.transfer_type.as_str())
        .bind(input.from_product_id)
        .bind(input.to_product_id)
        .bind(&input.from_identifier)
        .bind(&input.to_identifier)
        .bind(input.from_quantity)
        .bind(input.to_quantity)
        .bind(
            input
                .conversion_ratio
                .unwrap_or_else(|| conversion_ratio(input.from_quantity, input.to_quantity)),
        )
        .bind(&input.notes)
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        let validation = self.validate_transfer(shop_id, products, &transfer).await?;

        Ok((transfer, validation))
    }

    /// Validate a transfer, splitting blocking errors from warnings
    pub async fn validate_transfer(
        &self,
        shop_id: Uuid,
        products: &ProductService,
        transfer: &TransferRow,
    ) -> AppResult<TransferValidation> {
        let resolved = self.resolve_products(shop_id, products, transfer).await?;
        Ok(Self::validate_resolved(transfer, &resolved))
    }

    /// Process a pending transfer atomically
    pub async fn process_transfer(
        &self,
        shop_id: Uuid,
        products: &ProductService,
        transfer_id: Uuid,
    ) -> AppResult<TransferRow> {
        let mut tx = self.db.begin().await?;

        let transfer = sqlx::query_as::<_, TransferRow>(
            "SELECT * FROM stock_transfers WHERE id = $1 AND shop_id = $2 FOR UPDATE",
        )
        .bind(transfer_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        if transfer.status != TransferStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Transfer is {} and cannot be processed again",
                transfer.status
            )));
        }

        // Re-validate on rows locked in this transaction; the frozen
        // financials must see the same stock the ledger entries mutate.
        // Warnings never block.
        let resolved = self.resolve_products(shop_id, products, &transfer).await?;
        let resolved = ResolvedPair {
            from: match &resolved.from {
                Some(p) => Some(ProductService::get_for_update(&mut tx, shop_id, p.id).await?),
                None => None,
            },
            to: match &resolved.to {
                Some(p) => Some(ProductService::get_for_update(&mut tx, shop_id, p.id).await?),
                None => None,
            },
        };
        let validation = Self::validate_resolved(&transfer, &resolved);
        if !validation.is_ok() {
            return Err(AppError::TransferValidation {
                errors: validation.errors,
            });
        }

        // Errors guarantee both sides resolved
        let from = resolved.from.as_ref().ok_or_else(|| {
            AppError::Internal("Transfer source missing after validation".to_string())
        })?;
        let to = resolved.to.as_ref().ok_or_else(|| {
            AppError::Internal("Transfer destination missing after validation".to_string())
        })?;

        let transfer_type = TransferType::parse(&transfer.transfer_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown transfer type: {}", transfer.transfer_type))
        })?;

        let financials = transfer_financials(
            transfer_type,
            transfer.from_quantity,
            transfer.to_quantity,
            transfer.conversion_ratio,
            from.cost_price,
            to.cost_price,
            from.stock_quantity,
            to.stock_quantity,
        );

        self.ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id: from.id,
                    movement_type: MovementType::Transfer,
                    quantity_change: -transfer.from_quantity,
                    reference_number: Some(format!("Transfer #{}", transfer.id)),
                    notes: transfer.notes.clone(),
                    performed_by: transfer.created_by,
                },
            )
            .await?;

        self.ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id: to.id,
                    movement_type: MovementType::Transfer,
                    quantity_change: financials.quantity_added,
                    reference_number: Some(format!("Transfer #{}", transfer.id)),
                    notes: transfer.notes.clone(),
                    performed_by: transfer.created_by,
                },
            )
            .await?;

        let transfer = sqlx::query_as::<_, TransferRow>(
            r#"
            UPDATE stock_transfers SET
                status = 'COMPLETED',
                from_product_id = $2,
                to_product_id = $3,
                conversion_ratio = $4,
                from_product_cost = $5,
                to_product_cost = $6,
                cost_impact = $7,
                net_inventory_value_change = $8,
                shrinkage_quantity = $9,
                shrinkage_value = $10,
                completed_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transfer.id)
        .bind(from.id)
        .bind(to.id)
        .bind(financials.conversion_ratio)
        .bind(financials.from_product_cost)
        .bind(financials.to_product_cost)
        .bind(financials.cost_impact)
        .bind(financials.net_inventory_value_change)
        .bind(financials.shrinkage_quantity)
        .bind(financials.shrinkage_value)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id = %transfer.id,
            shrinkage_value = %transfer.shrinkage_value,
            "Processed transfer"
        );

        Ok(transfer)
    }

    /// Cancel a pending transfer
    pub async fn cancel_transfer(&self, shop_id: Uuid, transfer_id: Uuid) -> AppResult<TransferRow> {
        let mut tx = self.db.begin().await?;

        let transfer = sqlx::query_as::<_, TransferRow>(
            "SELECT * FROM stock_transfers WHERE id = $1 AND shop_id = $2 FOR UPDATE",
        )
        .bind(transfer_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))?;

        if transfer.status != TransferStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only pending transfers can be cancelled".to_string(),
            ));
        }

        let transfer = sqlx::query_as::<_, TransferRow>(
            "UPDATE stock_transfers SET status = 'CANCELLED' WHERE id = $1 RETURNING *",
        )
        .bind(transfer_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transfer)
    }

    /// Get a transfer by id
    pub async fn get_transfer(&self, shop_id: Uuid, transfer_id: Uuid) -> AppResult<TransferRow> {
        sqlx::query_as::<_, TransferRow>(
            "SELECT * FROM stock_transfers WHERE id = $1 AND shop_id = $2",
        )
        .bind(transfer_id)
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer".to_string()))
    }

    /// List transfers for a shop, newest first
    pub async fn list_transfers(&self, shop_id: Uuid) -> AppResult<Vec<TransferRow>> {
        let transfers = sqlx::query_as::<_, TransferRow>(
            "SELECT * FROM stock_transfers WHERE shop_id = $1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transfers)
    }

    /// Derived business-impact view of a processed transfer
    pub async fn business_impact_analysis(
        &self,
        shop_id: Uuid,
        transfer_id: Uuid,
    ) -> AppResult<BusinessImpact> {
        let transfer = self.get_transfer(shop_id, transfer_id).await?;

        let transfer_type = TransferType::parse(&transfer.transfer_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown transfer type: {}", transfer.transfer_type))
        })?;

        let (from_cost, to_cost) = self.cost_prices(&transfer).await?;

        Ok(business_impact(
            transfer_type,
            transfer.cost_impact,
            transfer.net_inventory_value_change,
            transfer.shrinkage_value,
            from_cost,
            to_cost,
        ))
    }

    async fn cost_prices(&self, transfer: &TransferRow) -> AppResult<(Decimal, Decimal)> {
        let fetch = |id: Option<Uuid>| async move {
            match id {
                Some(id) => sqlx::query_scalar::<_, Decimal>(
                    "SELECT cost_price FROM products WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await
                .map(|v| v.unwrap_or(Decimal::ZERO)),
                None => Ok(Decimal::ZERO),
            }
        };

        let from_cost = fetch(transfer.from_product_id).await?;
        let to_cost = fetch(transfer.to_product_id).await?;
        Ok((from_cost, to_cost))
    }

    async fn resolve_products(
        &self,
        shop_id: Uuid,
        products: &ProductService,
        transfer: &TransferRow,
    ) -> AppResult<ResolvedPair> {
        let resolve = |id: Option<Uuid>, identifier: Option<String>| async move {
            match (id, identifier) {
                (Some(id), _) => products.get_product(shop_id, id).await.map(Some),
                (None, Some(identifier)) => products.find_by_identifier(shop_id, &identifier).await,
                (None, None) => Ok(None),
            }
        };

        let from = resolve(transfer.from_product_id, transfer.from_identifier.clone()).await?;
        let to = resolve(transfer.to_product_id, transfer.to_identifier.clone()).await?;

        Ok(ResolvedPair { from, to })
    }

    fn validate_resolved(transfer: &TransferRow, resolved: &ResolvedPair) -> TransferValidation {
        fn endpoint(product: &ProductRow) -> TransferEndpoint {
            TransferEndpoint {
                name: product.name.clone(),
                cost_price: product.cost_price,
                stock_quantity: product.stock_quantity,
            }
        }

        let from = resolved.from.as_ref().map(endpoint);
        let to = resolved.to.as_ref().map(endpoint);

        validate_transfer_plan(
            from.as_ref(),
            to.as_ref(),
            transfer.from_identifier.as_deref(),
            transfer.to_identifier.as_deref(),
            transfer.from_quantity,
            transfer.to_quantity,
            transfer.conversion_ratio,
        )
    }
}
