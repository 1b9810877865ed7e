use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the orders table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub market_id: String,
    pub token_id: String,
    /// CLOB order id, or the synthetic `sl-<position-id>` watch id for
    /// stop-loss records that exist only in this ledger.
    pub polymarket_order_id: String,
    pub side: String,
    pub outcome: String,
    pub order_type: String,
    pub size: Decimal,
    pub price: Decimal,
    pub size_filled: Decimal,
    pub status: String,
    pub market_question: Option<String>,
    /// Back-reference for orders derived from a position (SL/TP); nulled by
    /// the database if the position row goes away.
    pub position_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_live(&self) -> bool {
        self.status == order_status::LIVE
    }

    pub fn remaining_size(&self) -> Decimal {
        self.size - self.size_filled
    }
}

/// Order status constants. LIVE is the only non-terminal state:
/// LIVE → MATCHED and LIVE → CANCELLED, nothing transitions back out.
pub mod order_status {
    pub const LIVE: &str = "LIVE";
    pub const MATCHED: &str = "MATCHED";
    pub const CANCELLED: &str = "CANCELLED";
}

/// Order type constants. STOP_LOSS rows are synthetic watch records that
/// never exist on the exchange.
pub mod order_type {
    pub const LIMIT: &str = "LIMIT";
    pub const MARKET: &str = "MARKET";
    pub const FOK: &str = "FOK";
    pub const GTC: &str = "GTC";
    pub const STOP_LOSS: &str = "STOP_LOSS";
    pub const TAKE_PROFIT: &str = "TAKE_PROFIT";
}

/// Synthetic ledger id for a position's stop-loss watch order.
///
/// Real CLOB ids are 0x-hashes, so the `sl-` prefix cannot collide in
/// practice. This constructor and the STOP_LOSS order type are the only
/// places that know the convention.
pub fn stop_loss_order_id(position_id: Uuid) -> String {
    format!("sl-{position_id}")
}

/// Normalize a CLOB-reported order status into the ledger's state machine.
/// Unrecognized values pass through unchanged.
pub fn normalize_status(raw: &str) -> String {
    match raw.to_uppercase().as_str() {
        "LIVE" | "OPEN" | "ACTIVE" => order_status::LIVE.into(),
        "MATCHED" | "FILLED" | "CLOSED" => order_status::MATCHED.into(),
        "CANCELLED" | "CANCELED" | "EXPIRED" => order_status::CANCELLED.into(),
        other => other.into(),
    }
}
