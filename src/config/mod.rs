use std::env;

const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";
const DEFAULT_DATA_URL: &str = "https://data-api.polymarket.com";
const DEFAULT_GAMMA_URL: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Bearer token for the protected API surface. Unset means open access,
    /// intended only for local development.
    pub api_token: Option<String>,

    // Polymarket API endpoints
    pub clob_api_url: String,
    pub data_api_url: String,
    pub gamma_api_url: String,

    // Background job cadence
    pub market_sync_interval_secs: u64,
    pub stop_loss_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            api_token: env::var("API_TOKEN").ok(),

            clob_api_url: env::var("CLOB_API_URL").unwrap_or_else(|_| DEFAULT_CLOB_URL.into()),
            data_api_url: env::var("DATA_API_URL").unwrap_or_else(|_| DEFAULT_DATA_URL.into()),
            gamma_api_url: env::var("GAMMA_API_URL")
                .unwrap_or_else(|_| DEFAULT_GAMMA_URL.into()),

            market_sync_interval_secs: env::var("MARKET_SYNC_INTERVAL_SECS")
                .unwrap_or_else(|_| "600".into())
                .parse()
                .unwrap_or(600),
            stop_loss_interval_secs: env::var("STOP_LOSS_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
        })
    }
}
