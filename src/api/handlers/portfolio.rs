use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::auth::resolve_user;
use crate::db::position_repo;
use crate::errors::AppError;
use crate::models::Position;
use crate::services::{order_sync, portfolio_sync};
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn default_limit() -> i64 {
    200
}

fn default_active_only() -> bool {
    true
}

#[derive(Deserialize)]
pub struct PortfolioQuery {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Serialize)]
pub struct PortfolioView {
    pub positions: Vec<Position>,
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub position_count: usize,
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<ApiResponse<PortfolioView>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let positions =
        position_repo::get_user_positions(&state.db, user.id, query.active_only, query.limit)
            .await?;

    let total_value = positions.iter().map(Position::current_value).sum();
    let total_cost_basis = positions.iter().map(Position::cost_basis).sum();
    let total_unrealized_pnl = positions.iter().map(Position::unrealized_pnl).sum();
    let total_realized_pnl = positions.iter().map(|p| p.realized_pnl).sum();

    Ok(ApiResponse::ok(PortfolioView {
        position_count: positions.len(),
        positions,
        total_value,
        total_cost_basis,
        total_unrealized_pnl,
        total_realized_pnl,
    }))
}

#[derive(Serialize)]
pub struct SyncResult {
    pub positions_synced: usize,
    pub orders_synced: usize,
}

/// On-demand full sync for the acting user, same path the scheduler takes.
pub async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SyncResult>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    let positions_synced =
        portfolio_sync::sync_positions(&state.db, state.gateway.as_ref(), &user).await?;
    let orders_synced = order_sync::sync_orders(&state.db, state.gateway.as_ref(), &user).await?;

    Ok(ApiResponse::ok(SyncResult {
        positions_synced,
        orders_synced,
    }))
}
