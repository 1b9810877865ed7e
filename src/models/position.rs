use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the positions table.
///
/// One row per (user, token). Size/price fields are overwritten by sync
/// sweeps; `take_profit_price` / `stop_loss_price` / `tp_order_id` are only
/// touched by explicit trading actions and the stop-loss monitor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: Uuid,
    pub user_id: Uuid,
    /// conditionId from the Polymarket Data API (0x-hash).
    pub market_id: String,
    /// CLOB token ID of the outcome held.
    pub token_id: String,
    pub outcome: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    /// Cached mark, refreshed on sync. Zeroed when the feed drops the position.
    pub current_price: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub synced_at: Option<DateTime<Utc>>,

    // Denormalized market info from the Data API
    pub title: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    /// Market resolved; position eligible for redemption.
    pub redeemable: bool,

    pub take_profit_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    /// CLOB order id of the active take-profit GTC order, if any.
    pub tp_order_id: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Market value at the cached price (zero when no mark is cached).
    pub fn current_value(&self) -> Decimal {
        self.size * self.current_price.unwrap_or(Decimal::ZERO)
    }

    pub fn cost_basis(&self) -> Decimal {
        self.size * self.avg_price
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        self.current_value() - self.cost_basis()
    }
}
