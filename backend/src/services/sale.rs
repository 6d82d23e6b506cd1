//! Sale engine: sale creation and refunds

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{ApplyMovementInput, LedgerService};
use crate::services::product::ProductService;
use shared::models::{line_total, plan_refund, MovementType, RefundError, RefundType, SaleItem, SaleStatus};
use shared::types::{Currency, PaymentMethod};
use shared::validation::{validate_currency_match, validate_positive_quantity};

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    ledger: LedgerService,
}

/// Persisted sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub cashier_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: String,
    pub refund_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Persisted sale item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItemRow {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub refunded: bool,
    pub refund_quantity: Decimal,
    pub refund_reason: Option<String>,
    pub refund_type: Option<String>,
    pub refund_amount: Decimal,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refunded_by: Option<Uuid>,
}

/// One line of a sale request; products resolve by id or identifier
#[derive(Debug, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Option<Uuid>,
    pub identifier: Option<String>,
    pub quantity: Decimal,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub items: Vec<SaleLineInput>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

/// Input for refunding part or all of a sale item
#[derive(Debug, Deserialize)]
pub struct RefundItemInput {
    pub quantity: Decimal,
    pub refund_type: RefundType,
    pub reason: Option<String>,
}

/// Sale with its items
#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: SaleRow,
    pub items: Vec<SaleItemRow>,
}

impl SaleService {
    pub fn new(db: PgPool, ledger: LedgerService) -> Self {
        Self { db, ledger }
    }

    /// Create a completed sale
    ///
    /// Overselling is allowed; stock goes negative rather than blocking
    /// the till. Everything commits in one transaction: the sale, its
    /// items, the stock deductions and their ledger entries.
    pub async fn create_sale(
        &self,
        shop_id: Uuid,
        cashier_id: Option<Uuid>,
        products: &ProductService,
        input: CreateSaleInput,
    ) -> AppResult<SaleWithItems> {
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "Sale must contain at least one item".to_string(),
            ));
        }

        // Resolve and validate all lines before mutating anything
        let mut lines = Vec::with_capacity(input.items.len());
        let mut currency: Option<Currency> = None;
        for line in &input.items {
            validate_positive_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;

            let product = match (line.product_id, line.identifier.as_deref()) {
                (Some(id), _) => products.get_product(shop_id, id).await?,
                (None, Some(identifier)) => products
                    .find_by_identifier(shop_id, identifier)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Product {}", identifier)))?,
                (None, None) => {
                    return Err(AppError::ValidationError(
                        "Each sale item needs a product_id or identifier".to_string(),
                    ))
                }
            };

            if product.price <= Decimal::ZERO {
                return Err(AppError::ValidationError(format!(
                    "Product '{}' has no valid selling price",
                    product.name
                )));
            }

            let product_currency = Currency::parse(&product.currency).ok_or_else(|| {
                AppError::Internal(format!(
                    "Product '{}' has an unknown currency: {}",
                    product.name, product.currency
                ))
            })?;
            match currency {
                None => currency = Some(product_currency),
                Some(expected) => {
                    validate_currency_match(expected, product_currency)
                        .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
                }
            }

            lines.push((product, line.quantity));
        }

        let currency = currency.unwrap_or_default();
        let total_amount: Decimal = lines
            .iter()
            .map(|(p, qty)| line_total(p.price, *qty))
            .sum();

        let mut tx = self.db.begin().await?;

        let sale = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales (shop_id, cashier_id, total_amount, currency, payment_method,
                               customer_name, customer_phone, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'completed')
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(cashier_id)
        .bind(total_amount)
        .bind(currency.code())
        .bind(input.payment_method.as_str())
        .bind(&input.customer_name)
        .bind(&input.customer_phone)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product, quantity) in &lines {
            let item = sqlx::query_as::<_, SaleItemRow>(
                r#"
                INSERT INTO sale_items (sale_id, product_id, product_name, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(sale.id)
            .bind(product.id)
            .bind(&product.name)
            .bind(quantity)
            .bind(product.price)
            .bind(line_total(product.price, *quantity))
            .fetch_one(&mut *tx)
            .await?;

            self.ledger
                .apply(
                    &mut tx,
                    ApplyMovementInput {
                        shop_id,
                        product_id: product.id,
                        movement_type: MovementType::Sale,
                        quantity_change: -*quantity,
                        reference_number: Some(format!("Sale #{}", sale.id)),
                        notes: None,
                        performed_by: cashier_id,
                    },
                )
                .await?;

            items.push(item);
        }

        tx.commit().await?;

        tracing::info!(sale_id = %sale.id, total = %total_amount, "Created sale");

        Ok(SaleWithItems { sale, items })
    }

    /// Refund part or all of one sale item
    ///
    /// Restores stock through a RETURN ledger entry and moves the parent
    /// sale to refunded once every item is fully refunded.
    pub async fn refund_item(
        &self,
        shop_id: Uuid,
        sale_id: Uuid,
        item_id: Uuid,
        input: RefundItemInput,
        performed_by: Option<Uuid>,
    ) -> AppResult<SaleItemRow> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT si.* FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE si.id = $1 AND si.sale_id = $2 AND s.shop_id = $3
            FOR UPDATE OF si
            "#,
        )
        .bind(item_id)
        .bind(sale_id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale item".to_string()))?;

        let item = SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            refunded: row.refunded,
            refund_quantity: row.refund_quantity,
            refund_reason: row.refund_reason.clone(),
            refund_type: row.refund_type.as_deref().and_then(RefundType::parse),
            refund_amount: row.refund_amount,
            refunded_at: row.refunded_at,
            refunded_by: row.refunded_by,
        };

        let plan = plan_refund(&item, input.quantity).map_err(|e| match e {
            RefundError::AlreadyRefunded => AppError::Conflict {
                resource: "sale_item".to_string(),
                message: "Item already fully refunded".to_string(),
            },
            RefundError::NonPositiveQuantity => AppError::Validation {
                field: "quantity".to_string(),
                message: "Refund quantity must be positive".to_string(),
            },
            RefundError::ExceedsRemaining { requested, remaining } => AppError::Validation {
                field: "quantity".to_string(),
                message: format!("Cannot refund {}, only {} remaining", requested, remaining),
            },
        })?;

        let updated = sqlx::query_as::<_, SaleItemRow>(
            r#"
            UPDATE sale_items SET
                refund_quantity = $2,
                refund_amount = refund_amount + $3,
                refunded = $4,
                refund_reason = COALESCE($5, refund_reason),
                refund_type = $6,
                refunded_at = NOW(),
                refunded_by = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(plan.new_refund_quantity)
        .bind(plan.refund_amount)
        .bind(plan.fully_refunded)
        .bind(&input.reason)
        .bind(input.refund_type.as_str())
        .bind(performed_by)
        .fetch_one(&mut *tx)
        .await?;

        // Stock restoration goes through the ledger like every other mutation
        self.ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id: row.product_id,
                    movement_type: MovementType::Return,
                    quantity_change: input.quantity,
                    reference_number: Some(format!("Refund for sale #{}", sale_id)),
                    notes: input.reason.clone(),
                    performed_by,
                },
            )
            .await?;

        sqlx::query(
            "UPDATE sales SET refund_amount = refund_amount + $2 WHERE id = $1",
        )
        .bind(sale_id)
        .bind(plan.refund_amount)
        .execute(&mut *tx)
        .await?;

        // The sale flips to refunded only when no item has quantity remaining
        let outstanding = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sale_items WHERE sale_id = $1 AND refunded = false",
        )
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        if outstanding == 0 {
            sqlx::query("UPDATE sales SET status = $2, refunded_at = NOW() WHERE id = $1")
                .bind(sale_id)
                .bind(SaleStatus::Refunded.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(sale_id = %sale_id, item_id = %item_id, quantity = %input.quantity, "Refunded sale item");

        Ok(updated)
    }

    /// Get a sale with its items
    pub async fn get_sale(&self, shop_id: Uuid, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, SaleRow>(
            "SELECT * FROM sales WHERE id = $1 AND shop_id = $2",
        )
        .bind(sale_id)
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let items = sqlx::query_as::<_, SaleItemRow>(
            "SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY id",
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems { sale, items })
    }

    /// List sales for a shop, newest first
    pub async fn list_sales(&self, shop_id: Uuid, limit: Option<i64>) -> AppResult<Vec<SaleRow>> {
        let limit = limit.unwrap_or(100).clamp(1, 500);

        let sales = sqlx::query_as::<_, SaleRow>(
            "SELECT * FROM sales WHERE shop_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(shop_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }
}
