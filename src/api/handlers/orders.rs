use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::portfolio::ApiResponse;
use crate::api::auth::resolve_user;
use crate::db::order_repo;
use crate::errors::AppError;
use crate::models::Order;
use crate::services::{order_sync, trading};
use crate::AppState;

fn default_limit() -> i64 {
    100
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub total: i64,
    pub live: i64,
    pub matched: i64,
    pub cancelled: i64,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<ApiResponse<OrderList>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let orders = order_repo::get_user_orders(
        &state.db,
        user.id,
        query.status.as_deref(),
        query.limit,
        query.offset,
    )
    .await?;
    let total = order_repo::count_user_orders(&state.db, user.id, query.status.as_deref()).await?;
    let (live, matched, cancelled) = order_repo::count_by_statuses(&state.db, user.id).await?;

    Ok(ApiResponse::ok(OrderList {
        orders,
        total,
        live,
        matched,
        cancelled,
    }))
}

#[derive(Serialize)]
pub struct OrderSyncResult {
    pub orders_synced: usize,
}

pub async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<OrderSyncResult>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let orders_synced = order_sync::sync_orders(&state.db, state.gateway.as_ref(), &user).await?;

    Ok(ApiResponse::ok(OrderSyncResult { orders_synced }))
}

#[derive(Deserialize)]
pub struct EditOrderRequest {
    pub price: Decimal,
}

pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(body): Json<EditOrderRequest>,
) -> Result<Json<ApiResponse<trading::TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome = trading::edit_order(
        &state.db,
        state.gateway.as_ref(),
        &user,
        order_id,
        body.price,
    )
    .await?;

    Ok(ApiResponse::ok(outcome))
}

pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<trading::TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome =
        trading::cancel_order(&state.db, state.gateway.as_ref(), &user, order_id).await?;

    Ok(ApiResponse::ok(outcome))
}
