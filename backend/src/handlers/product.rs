//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentCashier;
use crate::services::ledger::{LedgerService, StockMovementRow};
use crate::services::product::{
    AdjustStockInput, CreateProductInput, ProductRow, ProductService, ProductView,
    ReceiveStockInput, RestockReportRow, UpdateProductInput,
};
use crate::AppState;

fn product_service(state: &AppState) -> ProductService {
    let ledger = LedgerService::new(state.db.clone());
    ProductService::new(state.db.clone(), ledger)
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Identifier lookup query parameters
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub identifier: String,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<ProductRow>> {
    let service = product_service(&state);
    let product = service.create_product(current.0.shop_id, input).await?;
    Ok(Json(product))
}

/// List products with derived stock fields
pub async fn list_products(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(query): Query<ListProductsQuery>,
) -> AppResult<Json<Vec<ProductView>>> {
    let service = product_service(&state);
    let products = service
        .list_products(current.0.shop_id, query.include_inactive)
        .await?;
    Ok(Json(products))
}

/// Get one product
pub async fn get_product(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductView>> {
    let service = product_service(&state);
    let product = service.get_product(current.0.shop_id, product_id).await?;
    Ok(Json(product.into()))
}

/// Resolve a product by line code or barcode
pub async fn lookup_product(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<ProductView>> {
    let service = product_service(&state);
    let product = service
        .find_by_identifier(current.0.shop_id, &query.identifier)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", query.identifier)))?;
    Ok(Json(product.into()))
}

/// Apply a typed partial update
pub async fn update_product(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductRow>> {
    let service = product_service(&state);
    let product = service
        .update_product(current.0.shop_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Manual stock adjustment through the ledger
pub async fn adjust_stock(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockMovementRow>> {
    let service = product_service(&state);
    let movement = service
        .adjust_stock(
            current.0.shop_id,
            product_id,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(movement))
}

/// Receive stock from a supplier
pub async fn receive_stock(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ReceiveStockInput>,
) -> AppResult<Json<StockMovementRow>> {
    let service = product_service(&state);
    let movement = service
        .receive_stock(
            current.0.shop_id,
            product_id,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(movement))
}

/// Restock report for low and oversold products
pub async fn restock_report(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<RestockReportRow>>> {
    let service = product_service(&state);
    let report = service.restock_report(current.0.shop_id).await?;
    Ok(Json(report))
}

/// Deactivate a product
pub async fn deactivate_product(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = product_service(&state);
    service
        .deactivate_product(current.0.shop_id, product_id)
        .await?;
    Ok(Json(()))
}
