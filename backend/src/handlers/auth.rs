//! HTTP handlers for authentication and cashier management

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentCashier;
use crate::services::auth::{
    AuthService, AuthTokens, CashierInfo, RegisterCashierInput, RegisterResponse,
    RegisterShopInput,
};
use crate::AppState;
use shared::models::CashierStatus;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub phone: String,
    pub password: String,
}

/// Cashier status change request body
#[derive(Debug, Deserialize)]
pub struct SetStatusInput {
    pub status: String,
}

/// Register a new shop with its owner account
pub async fn register_shop(
    State(state): State<AppState>,
    Json(input): Json<RegisterShopInput>,
) -> AppResult<Json<RegisterResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.register_shop(input).await?;
    Ok(Json(response))
}

/// Log in with phone and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.phone, &input.password).await?;
    Ok(Json(tokens))
}

/// Register a cashier for the current shop (starts pending approval)
pub async fn register_cashier(
    State(state): State<AppState>,
    current: CurrentCashier,
    Json(input): Json<RegisterCashierInput>,
) -> AppResult<Json<Value>> {
    let service = AuthService::new(state.db, &state.config);
    let cashier_id = service.register_cashier(current.0.shop_id, input).await?;
    Ok(Json(json!({ "cashier_id": cashier_id })))
}

/// Approve, reject or deactivate a cashier (owner only)
pub async fn set_cashier_status(
    State(state): State<AppState>,
    current: CurrentCashier,
    Path(cashier_id): Path<Uuid>,
    Json(input): Json<SetStatusInput>,
) -> AppResult<Json<Value>> {
    if !current.0.is_owner() {
        return Err(AppError::InsufficientPermissions);
    }

    let status = CashierStatus::parse(&input.status).ok_or_else(|| AppError::Validation {
        field: "status".to_string(),
        message: format!("Unknown status: {}", input.status),
    })?;

    let service = AuthService::new(state.db, &state.config);
    service
        .set_cashier_status(current.0.shop_id, cashier_id, status)
        .await?;

    Ok(Json(json!({ "updated": true })))
}

/// List cashiers for the current shop
pub async fn list_cashiers(
    State(state): State<AppState>,
    current: CurrentCashier,
) -> AppResult<Json<Vec<CashierInfo>>> {
    let service = AuthService::new(state.db, &state.config);
    let cashiers = service.list_cashiers(current.0.shop_id).await?;
    Ok(Json(cashiers))
}
