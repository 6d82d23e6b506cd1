//! HTTP handlers for sales and refunds

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::ledger::LedgerService;
use crate::services::product::ProductService;
use crate::services::sale::{
    CreateSaleInput, RefundItemInput, SaleItemRow, SaleRow, SaleService, SaleWithItems,
};
use crate::AppState;

fn services(state: &AppState) -> (SaleService, ProductService) {
    let ledger = LedgerService::new(state.db.clone());
    (
        SaleService::new(state.db.clone(), ledger.clone()),
        ProductService::new(state.db.clone(), ledger),
    )
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub limit: Option<i64>,
}

/// Create a completed sale
pub async fn create_sale(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithItems>> {
    let (sales, products) = services(&state);
    let sale = sales
        .create_sale(
            current.0.shop_id,
            Some(current.0.cashier_id),
            &products,
            input,
        )
        .await?;
    Ok(Json(sale))
}

/// List sales
pub async fn list_sales(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<Vec<SaleRow>>> {
    let (sales, _) = services(&state);
    let list = sales.list_sales(current.0.shop_id, query.limit).await?;
    Ok(Json(list))
}

/// Get a sale with its items
pub async fn get_sale(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let (sales, _) = services(&state);
    let sale = sales.get_sale(current.0.shop_id, sale_id).await?;
    Ok(Json(sale))
}

/// Refund part or all of one sale item
pub async fn refund_item(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path((sale_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<RefundItemInput>,
) -> AppResult<Json<SaleItemRow>> {
    let (sales, _) = services(&state);
    let item = sales
        .refund_item(
            current.0.shop_id,
            sale_id,
            item_id,
            input,
            Some(current.0.cashier_id),
        )
        .await?;
    Ok(Json(item))
}
