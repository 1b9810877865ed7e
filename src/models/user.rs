use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the users table.
///
/// Credential columns hold opaque values as handed over by the settings
/// endpoint; encryption-at-rest lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Ethereum EOA address (0x...).
    pub wallet_address: String,
    /// Poly proxy wallet that actually holds tokens/USDC, if configured.
    pub proxy_wallet: Option<String>,
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    #[serde(skip_serializing)]
    pub passphrase: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Wallet to query the public positions feed for: the proxy wallet holds
    /// the tokens, with the EOA as fallback when no proxy is configured.
    pub fn portfolio_wallet(&self) -> &str {
        self.proxy_wallet.as_deref().unwrap_or(&self.wallet_address)
    }

    /// True when the L2 API credential triple is present (order listing).
    pub fn has_api_creds(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some() && self.passphrase.is_some()
    }

    /// True when a signing key is stored (order placement).
    pub fn has_signing_key(&self) -> bool {
        self.private_key.is_some()
    }
}
