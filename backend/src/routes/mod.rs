//! Route definitions for the retail POS backend

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - cashier management
        .nest("/cashiers", cashier_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - movement ledger
        .nest("/movements", movement_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
        // Protected routes - waste recording
        .nest("/waste", waste_routes())
        // Protected routes - stock transfers
        .nest("/transfers", transfer_routes())
        // Protected routes - stock takes
        .nest("/stock-takes", stock_take_routes())
        // Protected routes - expenses
        .nest("/expenses", expense_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register_shop))
        .route("/login", post(handlers::login))
}

/// Cashier management routes (protected)
fn cashier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_cashiers).post(handlers::register_cashier),
        )
        .route("/:cashier_id/status", put(handlers::set_cashier_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/lookup", get(handlers::lookup_product))
        .route("/restock-report", get(handlers::restock_report))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::deactivate_product),
        )
        .route("/:product_id/adjust-stock", post(handlers::adjust_stock))
        .route("/:product_id/receive", post(handlers::receive_stock))
        .route("/:product_id/movements", get(handlers::product_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement ledger routes (protected, read-only)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_movements))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/:sale_id", get(handlers::get_sale))
        .route(
            "/:sale_id/items/:item_id/refund",
            post(handlers::refund_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Waste recording routes (protected)
fn waste_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/records",
            get(handlers::list_records).post(handlers::record_waste),
        )
        .route("/summary", get(handlers::waste_summary))
        .route(
            "/batches",
            get(handlers::list_batches).post(handlers::create_batch),
        )
        .route("/batches/:batch_id", get(handlers::get_batch))
        .route("/batches/:batch_id/items", post(handlers::add_batch_item))
        .route(
            "/batches/:batch_id/complete",
            post(handlers::complete_batch),
        )
        .route("/batches/:batch_id/cancel", post(handlers::cancel_batch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock transfer routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/:transfer_id", get(handlers::get_transfer))
        .route("/:transfer_id/validate", get(handlers::validate_transfer))
        .route("/:transfer_id/process", post(handlers::process_transfer))
        .route("/:transfer_id/cancel", post(handlers::cancel_transfer))
        .route("/:transfer_id/impact", get(handlers::business_impact))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock take routes (protected)
fn stock_take_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_takes).post(handlers::create_stock_take),
        )
        .route("/:stock_take_id", get(handlers::get_stock_take))
        .route("/:stock_take_id/items", post(handlers::add_item))
        .route(
            "/:stock_take_id/complete",
            post(handlers::complete_stock_take),
        )
        .route("/:stock_take_id/cancel", post(handlers::cancel_stock_take))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Expense routes (protected)
fn expense_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
