//! HTTP handlers for stock takes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::ledger::LedgerService;
use crate::services::product::ProductService;
use crate::services::stock_take::{
    AddItemInput, CreateStockTakeInput, StockTakeItemView, StockTakeRow, StockTakeService,
};
use crate::AppState;

fn services(state: &AppState) -> (StockTakeService, ProductService) {
    let ledger = LedgerService::new(state.db.clone());
    (
        StockTakeService::new(state.db.clone()),
        ProductService::new(state.db.clone(), ledger),
    )
}

/// Stock take with its counted items
#[derive(Debug, Serialize)]
pub struct StockTakeDetail {
    #[serde(flatten)]
    pub stock_take: StockTakeRow,
    pub items: Vec<StockTakeItemView>,
}

/// Start a stock take session
pub async fn create_stock_take(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<CreateStockTakeInput>,
) -> AppResult<Json<StockTakeRow>> {
    let (stock_takes, _) = services(&state);
    let stock_take = stock_takes
        .create_stock_take(current.0.shop_id, input, Some(current.0.cashier_id))
        .await?;
    Ok(Json(stock_take))
}

/// List stock takes
pub async fn list_stock_takes(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<StockTakeRow>>> {
    let (stock_takes, _) = services(&state);
    let list = stock_takes.list_stock_takes(current.0.shop_id).await?;
    Ok(Json(list))
}

/// Get a stock take with its items
pub async fn get_stock_take(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(stock_take_id): Path<Uuid>,
) -> AppResult<Json<StockTakeDetail>> {
    let (stock_takes, _) = services(&state);
    let (stock_take, items) = stock_takes
        .get_stock_take(current.0.shop_id, stock_take_id)
        .await?;
    Ok(Json(StockTakeDetail { stock_take, items }))
}

/// Record or correct a product count
pub async fn add_item(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(stock_take_id): Path<Uuid>,
    Json(input): Json<AddItemInput>,
) -> AppResult<Json<StockTakeItemView>> {
    let (stock_takes, products) = services(&state);
    let item = stock_takes
        .add_item(current.0.shop_id, stock_take_id, &products, input)
        .await?;
    Ok(Json(item))
}

/// Complete a stock take
pub async fn complete_stock_take(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(stock_take_id): Path<Uuid>,
) -> AppResult<Json<StockTakeRow>> {
    let (stock_takes, _) = services(&state);
    let stock_take = stock_takes
        .complete(current.0.shop_id, stock_take_id, Some(current.0.cashier_id))
        .await?;
    Ok(Json(stock_take))
}

/// Cancel an in-progress stock take
pub async fn cancel_stock_take(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(stock_take_id): Path<Uuid>,
) -> AppResult<Json<StockTakeRow>> {
    let (stock_takes, _) = services(&state);
    let stock_take = stock_takes
        .cancel(current.0.shop_id, stock_take_id)
        .await?;
    Ok(Json(stock_take))
}
