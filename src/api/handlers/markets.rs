use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::portfolio::ApiResponse;
use crate::db::snapshot_repo;
use crate::errors::AppError;
use crate::models::PriceSnapshot;
use crate::AppState;

fn default_limit() -> i64 {
    100
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Price observations recorded by the stop-loss monitor, newest first.
pub async fn price_history(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<PriceSnapshot>>>, AppError> {
    let snapshots = snapshot_repo::get_recent(&state.db, &token_id, query.limit).await?;

    Ok(ApiResponse::ok(snapshots))
}
