use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Semaphore;

use super::auth::{AuthError, PolymarketAuth};
use super::clob_client::ClobClient;
use super::data_client::DataClient;
use super::gamma_client::GammaClient;
use super::trading::TradingClient;
use super::types::{RawOrder, RawPosition};
use super::wallet::PolymarketWallet;
use crate::config::AppConfig;
use crate::models::{Side, User};

/// Ceiling on simultaneous in-flight calls to trading-family endpoints.
const CLOB_MAX_IN_FLIGHT: usize = 2;
/// Ceiling for read-only data/gamma endpoints.
const DATA_MAX_IN_FLIGHT: usize = 15;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("trading SDK error: {0}")]
    Sdk(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// L2 credential triple for the authenticated order-listing endpoint.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn for_user(user: &User) -> Option<Self> {
        Some(Self {
            api_key: user.api_key.clone()?,
            api_secret: user.api_secret.clone()?,
            passphrase: user.passphrase.clone()?,
        })
    }
}

/// Signing key for order placement and cancellation.
#[derive(Clone)]
pub struct SigningCredentials {
    pub private_key: String,
}

impl SigningCredentials {
    pub fn for_user(user: &User) -> Option<Self> {
        Some(Self {
            private_key: user.private_key.clone()?,
        })
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials").finish_non_exhaustive()
    }
}

/// The external market gateway contract the core depends on. Everything the
/// reconciliation sweeps, the stop-loss monitor and the trading operations
/// need from the exchange goes through here, so tests can substitute an
/// in-memory implementation.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Best executable price for one side of a token's book.
    async fn get_price(
        &self,
        token_id: &str,
        side: Side,
    ) -> Result<Option<Decimal>, GatewayError>;

    /// All positions the public feed reports for a wallet.
    async fn get_user_positions(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<RawPosition>, GatewayError>;

    /// Currently-live orders for a credentialed user. Never historical.
    async fn get_user_orders(
        &self,
        creds: &ApiCredentials,
    ) -> Result<Vec<RawOrder>, GatewayError>;

    /// Display-metadata backfill for a token the ledger has no title for.
    async fn get_market_question(
        &self,
        token_id: &str,
    ) -> Result<Option<String>, GatewayError>;

    /// Submit a sell order for `size` shares at `price`; returns the
    /// exchange-assigned order id.
    async fn submit_sell(
        &self,
        creds: &SigningCredentials,
        token_id: &str,
        price: Decimal,
        size: Decimal,
    ) -> Result<String, GatewayError>;

    /// Cancel a live exchange order.
    async fn cancel_order(
        &self,
        creds: &SigningCredentials,
        order_id: &str,
    ) -> Result<(), GatewayError>;
}

/// Live gateway over the Polymarket CLOB, Data and Gamma APIs.
pub struct PolymarketGateway {
    clob: ClobClient,
    data: DataClient,
    gamma: GammaClient,
    clob_url: String,
    clob_permits: Arc<Semaphore>,
}

impl PolymarketGateway {
    pub fn new(http: Client, config: &AppConfig) -> Self {
        let clob_permits = Arc::new(Semaphore::new(CLOB_MAX_IN_FLIGHT));
        let data_permits = Arc::new(Semaphore::new(DATA_MAX_IN_FLIGHT));

        Self {
            clob: ClobClient::new(
                http.clone(),
                config.clob_api_url.clone(),
                clob_permits.clone(),
            ),
            data: DataClient::new(
                http.clone(),
                config.data_api_url.clone(),
                data_permits.clone(),
                clob_permits.clone(),
            ),
            gamma: GammaClient::new(http, config.gamma_api_url.clone(), data_permits),
            clob_url: config.clob_api_url.clone(),
            clob_permits,
        }
    }

    /// Build an authenticated per-user trading client. The SDK derives L2
    /// credentials from the signing key during authentication.
    async fn trading_client(
        &self,
        creds: &SigningCredentials,
    ) -> Result<TradingClient, GatewayError> {
        let wallet = PolymarketWallet::new(&self.clob_url, &creds.private_key)
            .await
            .map_err(|e| GatewayError::Sdk(e.to_string()))?;

        Ok(TradingClient::new(wallet))
    }
}

#[async_trait]
impl MarketGateway for PolymarketGateway {
    async fn get_price(
        &self,
        token_id: &str,
        side: Side,
    ) -> Result<Option<Decimal>, GatewayError> {
        self.clob.get_price(token_id, side).await
    }

    async fn get_user_positions(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<RawPosition>, GatewayError> {
        self.data.get_user_positions(wallet_address).await
    }

    async fn get_user_orders(
        &self,
        creds: &ApiCredentials,
    ) -> Result<Vec<RawOrder>, GatewayError> {
        let auth = PolymarketAuth::new(
            creds.api_key.clone(),
            creds.api_secret.clone(),
            creds.passphrase.clone(),
        );
        self.data.get_user_orders(&auth).await
    }

    async fn get_market_question(
        &self,
        token_id: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.gamma.get_market_question(token_id).await
    }

    async fn submit_sell(
        &self,
        creds: &SigningCredentials,
        token_id: &str,
        price: Decimal,
        size: Decimal,
    ) -> Result<String, GatewayError> {
        let client = self.trading_client(creds).await?;

        let _permit = self.clob_permits.acquire().await.expect("semaphore closed");
        client.place_sell_order(token_id, size, price).await
    }

    async fn cancel_order(
        &self,
        creds: &SigningCredentials,
        order_id: &str,
    ) -> Result<(), GatewayError> {
        let client = self.trading_client(creds).await?;

        let _permit = self.clob_permits.acquire().await.expect("semaphore closed");
        client.cancel_order(order_id).await
    }
}
