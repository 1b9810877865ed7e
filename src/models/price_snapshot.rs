use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only point-in-time price fact, recorded whenever a live price is
/// fetched. Used for charting; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceSnapshot {
    pub id: Uuid,
    pub token_id: String,
    pub price: Decimal,
    pub captured_at: Option<DateTime<Utc>>,
}
