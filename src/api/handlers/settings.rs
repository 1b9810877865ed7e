use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::portfolio::ApiResponse;
use crate::api::auth::resolve_user;
use crate::db::user_repo;
use crate::errors::AppError;
use crate::AppState;

/// Which credentials are on file. Values themselves are never returned.
#[derive(Serialize)]
pub struct CredentialStatus {
    pub wallet_address: String,
    pub proxy_wallet: Option<String>,
    pub has_signing_key: bool,
    pub has_api_creds: bool,
}

pub async fn get_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CredentialStatus>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    Ok(ApiResponse::ok(CredentialStatus {
        has_signing_key: user.has_signing_key(),
        has_api_creds: user.has_api_creds(),
        wallet_address: user.wallet_address,
        proxy_wallet: user.proxy_wallet,
    }))
}

#[derive(Deserialize)]
pub struct UpdateCredentialsRequest {
    pub proxy_wallet: Option<String>,
    pub private_key: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub passphrase: Option<String>,
}

/// Partial update: absent fields keep their stored values.
pub async fn update_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateCredentialsRequest>,
) -> Result<Json<ApiResponse<CredentialStatus>>, AppError> {
    let user = resolve_user(&state, &headers).await?;

    user_repo::update_credentials(
        &state.db,
        user.id,
        body.proxy_wallet.as_deref(),
        body.private_key.as_deref(),
        body.api_key.as_deref(),
        body.api_secret.as_deref(),
        body.passphrase.as_deref(),
    )
    .await?;

    let user = user_repo::get_user(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok(CredentialStatus {
        has_signing_key: user.has_signing_key(),
        has_api_creds: user.has_api_creds(),
        wallet_address: user.wallet_address,
        proxy_wallet: user.proxy_wallet,
    }))
}
