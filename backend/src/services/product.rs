//! Product catalog service

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{ApplyMovementInput, LedgerService, StockMovementRow};
use shared::models::{
    profit_margin, received_cost_price, restock_suggestion, stock_status, stock_value,
    MovementType, RestockSuggestion,
};
use shared::types::{Currency, PriceUnit};
use shared::validation::{
    validate_cost_price, validate_line_code, validate_min_stock_level, validate_positive_quantity,
    validate_sale_price,
};

/// Attempts before giving up on a unique line code
const LINE_CODE_MAX_ATTEMPTS: u32 = 10;

/// Product catalog service
///
/// Stock mutations go through the injected ledger service so every change
/// produces a movement entry.
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    ledger: LedgerService,
}

/// Persisted product
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub currency: String,
    pub price_unit: String,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub line_code: String,
    pub additional_barcodes: Vec<String>,
    pub stock_quantity: Decimal,
    pub min_stock_level: Decimal,
    pub supplier: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product with derived stock fields for listing
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: ProductRow,
    pub stock_status: &'static str,
    pub stock_value: Decimal,
    pub profit_margin: Decimal,
}

impl From<ProductRow> for ProductView {
    fn from(product: ProductRow) -> Self {
        let status = stock_status(product.stock_quantity, product.min_stock_level);
        let value = stock_value(product.stock_quantity, product.cost_price);
        let margin = profit_margin(product.price, product.cost_price);
        Self {
            product,
            stock_status: status.as_str(),
            stock_value: value,
            profit_margin: margin,
        }
    }
}

/// Input for creating a product
///
/// A caller-supplied line code must be 8 digits and unused within the
/// shop; when absent one is generated.
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub price_unit: Option<PriceUnit>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub line_code: Option<String>,
    pub additional_barcodes: Option<Vec<String>>,
    pub initial_stock: Option<Decimal>,
    pub min_stock_level: Option<Decimal>,
    pub supplier: Option<String>,
}

/// Typed partial update; absent fields are left unchanged
///
/// The line code is generated once and never updatable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub price_unit: Option<PriceUnit>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub additional_barcodes: Option<Vec<String>>,
    pub min_stock_level: Option<Decimal>,
    pub supplier: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub quantity_change: Decimal,
    pub movement_type: Option<String>,
    pub notes: Option<String>,
}

/// Input for receiving stock from a supplier
#[derive(Debug, Deserialize)]
pub struct ReceiveStockInput {
    pub quantity: Decimal,
    pub cost_price: Option<Decimal>,
    pub supplier: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Row for the restock report
#[derive(Debug, Serialize)]
pub struct RestockReportRow {
    pub product_id: Uuid,
    pub name: String,
    pub line_code: String,
    pub stock_quantity: Decimal,
    pub min_stock_level: Decimal,
    #[serde(flatten)]
    pub suggestion: RestockSuggestion,
}

impl ProductService {
    pub fn new(db: PgPool, ledger: LedgerService) -> Self {
        Self { db, ledger }
    }

    /// Create a product with a unique line code, generated when not supplied
    pub async fn create_product(
        &self,
        shop_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<ProductRow> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name is required".to_string(),
            });
        }
        validate_sale_price(input.price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;
        let cost_price = input.cost_price.unwrap_or(Decimal::ZERO);
        validate_cost_price(cost_price).map_err(|msg| AppError::Validation {
            field: "cost_price".to_string(),
            message: msg.to_string(),
        })?;
        let min_stock_level = input.min_stock_level.unwrap_or(Decimal::ZERO);
        validate_min_stock_level(min_stock_level).map_err(|msg| AppError::Validation {
            field: "min_stock_level".to_string(),
            message: msg.to_string(),
        })?;

        let line_code = match input.line_code {
            Some(code) => {
                validate_line_code(&code).map_err(|msg| AppError::Validation {
                    field: "line_code".to_string(),
                    message: msg.to_string(),
                })?;
                if self.line_code_taken(shop_id, &code).await? {
                    return Err(AppError::Conflict {
                        resource: "product".to_string(),
                        message: format!("Line code {} is already in use", code),
                    });
                }
                code
            }
            None => self.generate_line_code(shop_id).await?,
        };

        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                shop_id, name, description, price, cost_price, currency, price_unit,
                category, barcode, line_code, additional_barcodes,
                stock_quantity, min_stock_level, supplier
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(shop_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(cost_price)
        .bind(input.currency.unwrap_or_default().code())
        .bind(input.price_unit.unwrap_or_default().as_str())
        .bind(&input.category)
        .bind(&input.barcode)
        .bind(&line_code)
        .bind(input.additional_barcodes.unwrap_or_default())
        .bind(input.initial_stock.unwrap_or(Decimal::ZERO))
        .bind(min_stock_level)
        .bind(&input.supplier)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %product.id, line_code = %product.line_code, "Created product");

        Ok(product)
    }

    /// Apply a typed partial update
    pub async fn update_product(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductRow> {
        if let Some(price) = input.price {
            validate_sale_price(price).map_err(|msg| AppError::Validation {
                field: "price".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(cost_price) = input.cost_price {
            validate_cost_price(cost_price).map_err(|msg| AppError::Validation {
                field: "cost_price".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(level) = input.min_stock_level {
            validate_min_stock_level(level).map_err(|msg| AppError::Validation {
                field: "min_stock_level".to_string(),
                message: msg.to_string(),
            })?;
        }

        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                cost_price = COALESCE($6, cost_price),
                currency = COALESCE($7, currency),
                price_unit = COALESCE($8, price_unit),
                category = COALESCE($9, category),
                barcode = COALESCE($10, barcode),
                additional_barcodes = COALESCE($11, additional_barcodes),
                min_stock_level = COALESCE($12, min_stock_level),
                supplier = COALESCE($13, supplier),
                is_active = COALESCE($14, is_active),
                updated_at = NOW()
            WHERE id = $1 AND shop_id = $2
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(shop_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.cost_price)
        .bind(input.currency.map(|c| c.code()))
        .bind(input.price_unit.map(|u| u.as_str()))
        .bind(&input.category)
        .bind(&input.barcode)
        .bind(&input.additional_barcodes)
        .bind(input.min_stock_level)
        .bind(&input.supplier)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, shop_id: Uuid, product_id: Uuid) -> AppResult<ProductRow> {
        sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE id = $1 AND shop_id = $2",
        )
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Resolve a product by line code, primary barcode or additional barcode
    pub async fn find_by_identifier(
        &self,
        shop_id: Uuid,
        identifier: &str,
    ) -> AppResult<Option<ProductRow>> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products
            WHERE shop_id = $1
              AND (line_code = $2 OR barcode = $2 OR $2 = ANY(additional_barcodes))
            ORDER BY (line_code = $2) DESC, (barcode = $2) DESC
            LIMIT 1
            "#,
        )
        .bind(shop_id)
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;

        Ok(product)
    }

    /// List products for a shop with derived stock fields
    pub async fn list_products(
        &self,
        shop_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<ProductView>> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products
            WHERE shop_id = $1 AND ($2 OR is_active = true)
            ORDER BY name
            "#,
        )
        .bind(shop_id)
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(products.into_iter().map(ProductView::from).collect())
    }

    /// Manual stock adjustment through the ledger
    pub async fn adjust_stock(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
        input: AdjustStockInput,
        performed_by: Option<Uuid>,
    ) -> AppResult<StockMovementRow> {
        let movement_type = match input.movement_type.as_deref() {
            None => MovementType::Adjustment,
            Some(s) => MovementType::parse(s).ok_or_else(|| AppError::Validation {
                field: "movement_type".to_string(),
                message: format!("Unknown movement type: {}", s),
            })?,
        };

        let mut tx = self.db.begin().await?;

        let movement = self
            .ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id,
                    movement_type,
                    quantity_change: input.quantity_change,
                    reference_number: None,
                    notes: input.notes,
                    performed_by,
                },
            )
            .await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Receive stock from a supplier
    ///
    /// Adds the quantity with a RECEIPT ledger entry; a declared cost
    /// price replaces the current one and a declared supplier is recorded
    /// on the product, all in one transaction.
    pub async fn receive_stock(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
        input: ReceiveStockInput,
        performed_by: Option<Uuid>,
    ) -> AppResult<StockMovementRow> {
        validate_positive_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;
        if let Some(cost) = input.cost_price {
            validate_cost_price(cost).map_err(|msg| AppError::Validation {
                field: "cost_price".to_string(),
                message: msg.to_string(),
            })?;
        }

        let mut tx = self.db.begin().await?;

        let product = Self::get_for_update(&mut tx, shop_id, product_id).await?;

        let cost_price = received_cost_price(product.cost_price, input.cost_price);
        let supplier = input.supplier.or(product.supplier);

        sqlx::query(
            r#"
            UPDATE products SET cost_price = $3, supplier = $4, updated_at = NOW()
            WHERE id = $1 AND shop_id = $2
            "#,
        )
        .bind(product_id)
        .bind(shop_id)
        .bind(cost_price)
        .bind(&supplier)
        .execute(&mut *tx)
        .await?;

        let movement = self
            .ledger
            .apply(
                &mut tx,
                ApplyMovementInput {
                    shop_id,
                    product_id,
                    movement_type: MovementType::Receipt,
                    quantity_change: input.quantity,
                    reference_number: input.reference_number,
                    notes: input.notes,
                    performed_by,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            quantity = %input.quantity,
            "Received stock"
        );

        Ok(movement)
    }

    /// Products at or below their minimum stock level, with suggestions
    pub async fn restock_report(&self, shop_id: Uuid) -> AppResult<Vec<RestockReportRow>> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products
            WHERE shop_id = $1 AND is_active = true AND stock_quantity <= min_stock_level
            ORDER BY stock_quantity
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await?;

        let mut report: Vec<RestockReportRow> = products
            .into_iter()
            .filter_map(|p| {
                restock_suggestion(p.stock_quantity, p.min_stock_level, p.cost_price).map(
                    |suggestion| RestockReportRow {
                        product_id: p.id,
                        name: p.name,
                        line_code: p.line_code,
                        stock_quantity: p.stock_quantity,
                        min_stock_level: p.min_stock_level,
                        suggestion,
                    },
                )
            })
            .collect();

        report.sort_by(|a, b| {
            shared::models::restock_priority_score(b.stock_quantity, b.min_stock_level)
                .cmp(&shared::models::restock_priority_score(
                    a.stock_quantity,
                    a.min_stock_level,
                ))
        });

        Ok(report)
    }

    /// Deactivate a product; history stays intact
    pub async fn deactivate_product(&self, shop_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = false, updated_at = NOW() WHERE id = $1 AND shop_id = $2",
        )
        .bind(product_id)
        .bind(shop_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// Generate an 8-digit line code, retrying on collision
    async fn generate_line_code(&self, shop_id: Uuid) -> AppResult<String> {
        for _ in 0..LINE_CODE_MAX_ATTEMPTS {
            let code: String = {
                let mut rng = rand::thread_rng();
                (0..8).map(|_| rng.gen_range(0..10).to_string()).collect()
            };

            if !self.line_code_taken(shop_id, &code).await? {
                return Ok(code);
            }
        }

        Err(AppError::Internal(
            "Could not generate a unique line code".to_string(),
        ))
    }

    async fn line_code_taken(&self, shop_id: Uuid, code: &str) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE shop_id = $1 AND line_code = $2",
        )
        .bind(shop_id)
        .bind(code)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }

    /// Fetch a product inside an open transaction, locking the row
    pub(crate) async fn get_for_update(
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductRow> {
        sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE id = $1 AND shop_id = $2 FOR UPDATE",
        )
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}
