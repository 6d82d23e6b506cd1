//! HTTP handlers for the movement ledger (read-only)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCashier;
use crate::services::ledger::{LedgerService, MovementFilter, StockMovementRow};
use crate::AppState;

/// List ledger entries for the shop
pub async fn list_movements(
    State(state): State<AppState>,
    current: CurrentCashier,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<StockMovementRow>>> {
    let service = LedgerService::new(state.db);
    let movements = service.list_movements(current.0.shop_id, filter).await?;
    Ok(Json(movements))
}

/// Full movement history for one product
pub async fn product_history(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovementRow>>> {
    let service = LedgerService::new(state.db);
    let movements = service
        .product_history(current.0.shop_id, product_id)
        .await?;
    Ok(Json(movements))
}
