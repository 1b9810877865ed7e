use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::db::user_repo;
use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

/// Bearer-token authentication middleware.
///
/// If `api_token` is configured, every request must carry
/// `Authorization: Bearer <token>` matching that value.
/// An empty / unset token disables authentication (dev mode).
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let expected = state.config.api_token.as_deref().unwrap_or_default();

    // No token configured → auth disabled (dev / legacy mode)
    if expected.is_empty() {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.strip_prefix("Bearer ") == Some(expected) => next.run(req).await,
        _ => AppError::Unauthorized.into_response(),
    }
}

/// Resolve the acting user from the `X-Wallet-Address` header, registering
/// the wallet on first sight.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let wallet = headers
        .get("x-wallet-address")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::BadRequest("X-Wallet-Address header is required".into()))?;

    let user = user_repo::get_or_create(&state.db, wallet).await?;
    Ok(user)
}
