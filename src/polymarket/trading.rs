use polymarket_client_sdk::clob::types::Side as SdkSide;
use polymarket_client_sdk::types::U256;
use rust_decimal::Decimal;

use super::gateway::GatewayError;
use super::wallet::PolymarketWallet;

/// Order placement and cancellation through the Polymarket SDK, on behalf of
/// one authenticated wallet.
pub struct TradingClient {
    wallet: PolymarketWallet,
}

impl TradingClient {
    pub fn new(wallet: PolymarketWallet) -> Self {
        Self { wallet }
    }

    /// Place a sell limit order and return the exchange-assigned order id.
    ///
    /// * `token_id`: CTF token ID (decimal string, hex accepted).
    /// * `size`: number of shares.
    /// * `price`: price per share (0..1), already tick-rounded by the caller.
    pub async fn place_sell_order(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
    ) -> Result<String, GatewayError> {
        let token_id_u256 = parse_token_id(token_id)
            .ok_or_else(|| GatewayError::Unexpected(format!("unparseable token id: {token_id}")))?;

        let client = self.wallet.client();
        let signer = self.wallet.signer();

        let signable_order = client
            .limit_order()
            .token_id(token_id_u256)
            .side(SdkSide::Sell)
            .price(price)
            .size(size)
            .build()
            .await
            .map_err(|e| GatewayError::Sdk(e.to_string()))?;

        let signed_order = client
            .sign(signer, signable_order)
            .await
            .map_err(|e| GatewayError::Sdk(e.to_string()))?;

        let response = client
            .post_order(signed_order)
            .await
            .map_err(|e| GatewayError::Sdk(e.to_string()))?;

        if !response.success {
            return Err(GatewayError::Rejected(
                response.error_msg.unwrap_or_else(|| "order rejected".into()),
            ));
        }

        tracing::info!(
            order_id = %response.order_id,
            status = ?response.status,
            "Sell order submitted to CLOB"
        );

        Ok(response.order_id)
    }

    /// Cancel a single order by CLOB order id.
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), GatewayError> {
        self.wallet
            .client()
            .cancel_order(order_id)
            .await
            .map_err(|e| GatewayError::Sdk(e.to_string()))?;

        tracing::info!(order_id, "Order cancelled on CLOB");
        Ok(())
    }
}

/// Token ids are decimal strings in the APIs, hex on-chain.
fn parse_token_id(token_id: &str) -> Option<U256> {
    U256::from_str_radix(token_id, 10)
        .or_else(|_| match token_id.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(token_id, 16),
        })
        .ok()
}
