use std::sync::Arc;

use reqwest::Client;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use super::gateway::GatewayError;
use super::types::decimal_from_value;
use crate::models::Side;

/// Public (unauthenticated) CLOB market-data endpoints.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
    /// Shared ceiling on in-flight CLOB calls; the exchange rate-limits this
    /// family aggressively.
    permits: Arc<Semaphore>,
}

impl ClobClient {
    pub fn new(http: Client, base_url: String, permits: Arc<Semaphore>) -> Self {
        Self {
            http,
            base_url,
            permits,
        }
    }

    /// Best executable price for one side of a token's book, or `None` when
    /// the book is empty on that side.
    pub async fn get_price(
        &self,
        token_id: &str,
        side: Side,
    ) -> Result<Option<Decimal>, GatewayError> {
        let _permit = self.permits.acquire().await.expect("semaphore closed");

        let url = format!("{}/price", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("token_id", token_id), ("side", side.as_price_param())])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        Ok(body.get("price").and_then(decimal_from_value))
    }
}
