use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;

use super::gateway::GatewayError;

#[derive(Debug, Clone, Deserialize)]
struct GammaMarket {
    #[serde(default)]
    question: Option<String>,
}

/// Gamma API client, used only to backfill market questions for tokens the
/// ledger has no display metadata for.
#[derive(Debug, Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
    permits: Arc<Semaphore>,
}

impl GammaClient {
    pub fn new(http: Client, base_url: String, permits: Arc<Semaphore>) -> Self {
        Self {
            http,
            base_url,
            permits,
        }
    }

    /// Look up the market question for a CLOB token id.
    pub async fn get_market_question(
        &self,
        token_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        let _permit = self.permits.acquire().await.expect("semaphore closed");

        let url = format!("{}/markets", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("clob_token_ids", token_id)])
            .send()
            .await?
            .error_for_status()?;

        let markets: Vec<GammaMarket> = resp.json().await?;
        Ok(markets.into_iter().next().and_then(|m| m.question))
    }
}
