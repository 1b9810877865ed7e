use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use polymarket_client_sdk::auth::Signer;
use polymarket_client_sdk::clob::client::{Client, Config};
use polymarket_client_sdk::POLYGON;

/// Authenticated Polymarket SDK client plus the signer it was derived from.
///
/// Built per trading request from the owning user's stored key; the key
/// string is consumed during construction and not retained.
pub struct PolymarketWallet {
    signer: PrivateKeySigner,
    client: Client<polymarket_client_sdk::auth::state::Authenticated<polymarket_client_sdk::auth::Normal>>,
}

impl PolymarketWallet {
    /// Create a wallet from a hex-encoded private key (with or without `0x`
    /// prefix), authenticating against the CLOB and deriving or creating an
    /// API key as needed.
    pub async fn new(clob_url: &str, private_key: &str) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key)?
            .with_chain_id(Some(POLYGON));

        let config = Config::default();
        let unauthenticated = Client::new(clob_url, config)?;

        let client = unauthenticated
            .authentication_builder(&signer)
            .authenticate()
            .await?;

        Ok(Self { signer, client })
    }

    pub fn client(
        &self,
    ) -> &Client<polymarket_client_sdk::auth::state::Authenticated<polymarket_client_sdk::auth::Normal>>
    {
        &self.client
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}
