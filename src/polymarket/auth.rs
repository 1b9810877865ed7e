use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL_SAFE},
    Engine,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid base64 secret: {0}")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("HMAC computation failed: {0}")]
    HmacError(String),
}

/// L2 API credential triple for authenticated CLOB/Data endpoints.
#[derive(Debug, Clone)]
pub struct PolymarketAuth {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl PolymarketAuth {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }

    /// Build HMAC-SHA256 signature for the Polymarket CLOB API.
    ///
    /// message = `{timestamp}{method}{path}{body}`
    /// secret is base64-decoded before use.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<String, AuthError> {
        // Polymarket API secrets use URL-safe base64 (with - and _)
        let secret_bytes = BASE64_URL_SAFE
            .decode(&self.api_secret)
            .or_else(|_| BASE64.decode(&self.api_secret))?;

        let message = format!("{timestamp}{method}{path}{body}");

        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .map_err(|e| AuthError::HmacError(e.to_string()))?;

        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(BASE64.encode(result.into_bytes()))
    }

    /// Signed header set for an authenticated GET request.
    pub fn headers_for_get(&self, path: &str) -> Result<Vec<(&'static str, String)>, AuthError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp, "GET", path, "")?;

        Ok(vec![
            ("POLY-API-KEY", self.api_key.clone()),
            ("POLY-SIGNATURE", signature),
            ("POLY-TIMESTAMP", timestamp),
            ("POLY-PASSPHRASE", self.passphrase.clone()),
        ])
    }
}
