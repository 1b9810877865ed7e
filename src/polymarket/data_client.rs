use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Semaphore;

use super::auth::PolymarketAuth;
use super::gateway::GatewayError;
use super::types::{extract_order_list, RawOrder, RawPosition};

/// Page size for the positions feed; the API caps responses at 500 rows.
const POSITIONS_PAGE_SIZE: usize = 500;

/// Polymarket Data API client: public positions feed plus the authenticated
/// live-orders endpoint.
#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
    /// Read-only data endpoints get a generous ceiling.
    data_permits: Arc<Semaphore>,
    /// The authenticated orders endpoint shares the CLOB trading budget.
    clob_permits: Arc<Semaphore>,
}

impl DataClient {
    pub fn new(
        http: Client,
        base_url: String,
        data_permits: Arc<Semaphore>,
        clob_permits: Arc<Semaphore>,
    ) -> Self {
        Self {
            http,
            base_url,
            data_permits,
            clob_permits,
        }
    }

    /// Fetch every position the Data API reports for a wallet, paging until
    /// a short page signals the end.
    pub async fn get_user_positions(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<RawPosition>, GatewayError> {
        let url = format!("{}/positions", self.base_url);
        let mut all: Vec<RawPosition> = Vec::new();
        let mut offset: usize = 0;

        loop {
            let _permit = self.data_permits.acquire().await.expect("semaphore closed");

            let resp = self
                .http
                .get(&url)
                .query(&[
                    ("user", wallet_address),
                    ("limit", &POSITIONS_PAGE_SIZE.to_string()),
                    ("offset", &offset.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let batch: Vec<RawPosition> = resp.json().await?;
            let batch_len = batch.len();
            all.extend(batch);

            if batch_len < POSITIONS_PAGE_SIZE {
                break;
            }
            offset += POSITIONS_PAGE_SIZE;
        }

        Ok(all)
    }

    /// Fetch the user's currently-live orders. The endpoint never returns
    /// historical orders; disappearance from this list is the only fill
    /// signal available.
    pub async fn get_user_orders(
        &self,
        auth: &PolymarketAuth,
    ) -> Result<Vec<RawOrder>, GatewayError> {
        let _permit = self.clob_permits.acquire().await.expect("semaphore closed");

        let url = format!("{}/orders", self.base_url);
        let mut req = self.http.get(&url);
        for (name, value) in auth.headers_for_get("/orders")? {
            req = req.header(name, value);
        }

        let resp = req.send().await?.error_for_status()?;
        let body: serde_json::Value = resp.json().await?;

        Ok(extract_order_list(body))
    }
}
