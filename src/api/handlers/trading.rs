use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::portfolio::ApiResponse;
use crate::api::auth::resolve_user;
use crate::errors::AppError;
use crate::services::trading::{self, TradeOutcome};
use crate::AppState;

#[derive(Deserialize)]
pub struct PriceRequest {
    pub price: Decimal,
}

pub async fn market_sell(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome =
        trading::market_sell(&state.db, state.gateway.as_ref(), &user, position_id).await?;

    Ok(ApiResponse::ok(outcome))
}

pub async fn set_take_profit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position_id): Path<Uuid>,
    Json(body): Json<PriceRequest>,
) -> Result<Json<ApiResponse<TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome = trading::set_take_profit(
        &state.db,
        state.gateway.as_ref(),
        &user,
        position_id,
        body.price,
    )
    .await?;

    Ok(ApiResponse::ok(outcome))
}

pub async fn cancel_take_profit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome =
        trading::cancel_take_profit(&state.db, state.gateway.as_ref(), &user, position_id).await?;

    Ok(ApiResponse::ok(outcome))
}

pub async fn set_stop_loss(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position_id): Path<Uuid>,
    Json(body): Json<PriceRequest>,
) -> Result<Json<ApiResponse<TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome = trading::set_stop_loss(&state.db, &user, position_id, body.price).await?;

    Ok(ApiResponse::ok(outcome))
}

pub async fn remove_stop_loss(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(position_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TradeOutcome>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let outcome = trading::remove_stop_loss(&state.db, &user, position_id).await?;

    Ok(ApiResponse::ok(outcome))
}
