pub mod auth;
pub mod clob_client;
pub mod data_client;
pub mod gamma_client;
pub mod gateway;
pub mod trading;
pub mod types;
pub mod wallet;

pub use auth::PolymarketAuth;
pub use clob_client::ClobClient;
pub use data_client::DataClient;
pub use gamma_client::GammaClient;
pub use gateway::{
    ApiCredentials, GatewayError, MarketGateway, PolymarketGateway, SigningCredentials,
};
pub use trading::TradingClient;
pub use types::{RawOrder, RawPosition};
pub use wallet::PolymarketWallet;
