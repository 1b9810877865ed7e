use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{order_repo, position_repo};
use crate::models::order::{order_status, order_type, stop_loss_order_id};
use crate::models::{Position, Side, User};
use crate::polymarket::{GatewayError, MarketGateway, SigningCredentials};

/// Exchange price precision: prices are quoted in whole cents.
const PRICE_TICK_DP: u32 = 2;

#[derive(Debug, Error)]
pub enum TradeError {
    /// Validation failure surfaced to the caller as a rejection; never retried.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of a trading operation, shaped for direct API serialization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TradeOutcome {
    pub message: String,
    pub order_id: Option<String>,
}

fn rejected(msg: impl Into<String>) -> TradeError {
    TradeError::Rejected(msg.into())
}

async fn require_position(
    pool: &PgPool,
    user: &User,
    position_id: Uuid,
) -> Result<Position, TradeError> {
    position_repo::get_position(pool, position_id, user.id)
        .await?
        .ok_or_else(|| rejected("Position not found"))
}

fn require_signing_creds(user: &User) -> Result<SigningCredentials, TradeError> {
    SigningCredentials::for_user(user)
        .ok_or_else(|| rejected("Signing key not configured. Add it in settings."))
}

/// Sell an entire position at the best currently available bid.
///
/// Queries the live sell-side price, tick-rounds it, and submits an
/// immediate-or-cancel style order for the full size. The submitted order is
/// recorded in the ledger; position size itself is corrected by the next
/// reconciliation sweep once the feed reflects the fill.
pub async fn market_sell(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
    position_id: Uuid,
) -> Result<TradeOutcome, TradeError> {
    let position = require_position(pool, user, position_id).await?;

    if position.size <= Decimal::ZERO {
        return Err(rejected("Position has no tokens to sell"));
    }

    let creds = require_signing_creds(user)?;

    let bid = gateway.get_price(&position.token_id, Side::Sell).await?;
    let bid = match bid {
        Some(p) if p > Decimal::ZERO => p,
        _ => return Err(rejected("Cannot determine market price. No bids available.")),
    };

    let tick_price = bid.round_dp(PRICE_TICK_DP);

    tracing::info!(
        token_id = %position.token_id,
        size = %position.size,
        price = %bid,
        user_id = %user.id,
        "Submitting market sell"
    );

    let order_id = gateway
        .submit_sell(&creds, &position.token_id, tick_price, position.size)
        .await?;

    // Ledger record for the submitted order. The sell itself already
    // happened, so a write failure here is logged rather than surfaced.
    if let Err(e) = order_repo::insert_order(
        pool,
        user.id,
        &position.market_id,
        &position.token_id,
        &order_id,
        "SELL",
        &position.outcome,
        order_type::FOK,
        position.size,
        tick_price,
        position.title.as_deref(),
        Some(position.id),
    )
    .await
    {
        tracing::error!(error = %e, order_id, "Failed to record market sell in ledger");
    }

    Ok(TradeOutcome {
        message: format!(
            "Market sell order placed for {:.2} tokens at {:.4}",
            position.size, bid
        ),
        order_id: Some(order_id),
    })
}

/// Set a take profit: place a GTC sell limit at the requested price, after
/// best-effort cancellation of any previous TP order for the position.
pub async fn set_take_profit(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
    position_id: Uuid,
    price: Decimal,
) -> Result<TradeOutcome, TradeError> {
    let position = require_position(pool, user, position_id).await?;

    if position.size <= Decimal::ZERO {
        return Err(rejected("Position has no tokens to sell"));
    }
    if price <= position.avg_price {
        return Err(rejected(format!(
            "Take profit price ({price}) must be above avg entry ({:.4})",
            position.avg_price
        )));
    }

    let creds = require_signing_creds(user)?;

    if let Some(old_tp) = &position.tp_order_id {
        if let Err(e) = gateway.cancel_order(&creds, old_tp).await {
            tracing::warn!(order_id = %old_tp, error = %e, "Failed to cancel old TP order");
        }
    }

    let order_id = gateway
        .submit_sell(
            &creds,
            &position.token_id,
            price.round_dp(PRICE_TICK_DP),
            position.size,
        )
        .await?;

    // TP config is persisted only after successful placement.
    position_repo::set_take_profit(pool, position.id, price, &order_id).await?;

    if let Err(e) = order_repo::insert_order(
        pool,
        user.id,
        &position.market_id,
        &position.token_id,
        &order_id,
        "SELL",
        &position.outcome,
        order_type::TAKE_PROFIT,
        position.size,
        price.round_dp(PRICE_TICK_DP),
        position.title.as_deref(),
        Some(position.id),
    )
    .await
    {
        tracing::error!(error = %e, order_id, "Failed to record take profit in ledger");
    }

    tracing::info!(position_id = %position.id, %price, order_id, "Take profit set");

    Ok(TradeOutcome {
        message: format!("Take profit set at {price:.2} ({:.2} tokens)", position.size),
        order_id: Some(order_id),
    })
}

/// Cancel a take profit: best-effort exchange cancel, then clear the fields
/// regardless so the ledger never points at a dead order.
pub async fn cancel_take_profit(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
    position_id: Uuid,
) -> Result<TradeOutcome, TradeError> {
    let position = require_position(pool, user, position_id).await?;

    let Some(tp_order_id) = position.tp_order_id.clone() else {
        return Err(rejected("No take profit order to cancel"));
    };

    let creds = require_signing_creds(user)?;
    if let Err(e) = gateway.cancel_order(&creds, &tp_order_id).await {
        tracing::warn!(order_id = %tp_order_id, error = %e, "Failed to cancel TP order on CLOB");
    }

    position_repo::clear_take_profit(pool, position.id).await?;

    Ok(TradeOutcome {
        message: "Take profit cancelled".into(),
        order_id: None,
    })
}

/// Arm a stop loss: store the trigger price and create (or re-arm) the
/// synthetic watch order. No exchange order exists until the trigger fires.
pub async fn set_stop_loss(
    pool: &PgPool,
    user: &User,
    position_id: Uuid,
    price: Decimal,
) -> Result<TradeOutcome, TradeError> {
    let position = require_position(pool, user, position_id).await?;

    if position.size <= Decimal::ZERO {
        return Err(rejected("Position has no tokens to sell"));
    }
    if price >= position.avg_price {
        return Err(rejected(format!(
            "Stop loss price ({price}) must be below avg entry ({:.4})",
            position.avg_price
        )));
    }

    // Trigger price and watch record commit together.
    position_repo::arm_stop_loss(pool, &position, &stop_loss_order_id(position.id), price)
        .await?;

    tracing::info!(position_id = %position.id, %price, user_id = %user.id, "Stop loss set");

    Ok(TradeOutcome {
        message: format!("Stop loss set at {price:.2}"),
        order_id: None,
    })
}

/// Disarm a stop loss and cancel its watch order record.
pub async fn remove_stop_loss(
    pool: &PgPool,
    user: &User,
    position_id: Uuid,
) -> Result<TradeOutcome, TradeError> {
    let position = require_position(pool, user, position_id).await?;

    position_repo::clear_stop_loss(pool, position.id).await?;

    let synthetic_id = stop_loss_order_id(position.id);
    if let Some(watch) = order_repo::get_by_external_id(pool, user.id, &synthetic_id).await? {
        if watch.is_live() {
            order_repo::set_status(pool, watch.id, order_status::CANCELLED).await?;
        }
    }

    Ok(TradeOutcome {
        message: "Stop loss removed".into(),
        order_id: None,
    })
}

/// Edit a LIVE order's price.
///
/// Synthetic stop-loss watches are mutated in place (there is no exchange
/// order behind them). Exchange orders are edited as cancel-old + place-new
/// with the remaining unfilled size; if the cancel fails, no replacement is
/// placed, so exposure is never doubled.
pub async fn edit_order(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
    order_id: Uuid,
    new_price: Decimal,
) -> Result<TradeOutcome, TradeError> {
    let order = order_repo::get_order(pool, order_id, user.id)
        .await?
        .ok_or_else(|| rejected("Order not found"))?;

    if !order.is_live() {
        return Err(rejected("Can only edit LIVE orders"));
    }

    if order.order_type == order_type::STOP_LOSS {
        order_repo::set_price(pool, order.id, new_price).await?;
        if let Some(position_id) = order.position_id {
            position_repo::set_stop_loss(pool, position_id, new_price).await?;
        }
        return Ok(TradeOutcome {
            message: format!("Stop loss updated to {new_price:.2}"),
            order_id: None,
        });
    }

    if order.side != Side::Sell.to_string() {
        return Err(rejected("Only sell orders can be edited"));
    }

    let creds = require_signing_creds(user)?;

    if let Err(e) = gateway.cancel_order(&creds, &order.polymarket_order_id).await {
        tracing::warn!(
            order_id = %order.polymarket_order_id,
            error = %e,
            "Failed to cancel order on CLOB"
        );
        return Err(rejected("Failed to cancel existing order on CLOB"));
    }

    let remaining = order.remaining_size();
    if remaining <= Decimal::ZERO {
        order_repo::set_status(pool, order.id, order_status::MATCHED).await?;
        return Err(rejected("Order already fully filled"));
    }

    let new_clob_id = gateway
        .submit_sell(
            &creds,
            &order.token_id,
            new_price.round_dp(PRICE_TICK_DP),
            remaining,
        )
        .await?;

    order_repo::replace_exchange_order(pool, order.id, &new_clob_id, new_price, remaining).await?;

    if let Some(position_id) = order.position_id {
        if let Some(position) = position_repo::get_position(pool, position_id, user.id).await? {
            // Keep the position's TP bookkeeping pointing at the replacement.
            if position.tp_order_id.as_deref() == Some(order.polymarket_order_id.as_str()) {
                position_repo::set_take_profit(pool, position.id, new_price, &new_clob_id).await?;
            }
        }
    }

    tracing::info!(
        old = %order.polymarket_order_id,
        new = %new_clob_id,
        price = %new_price,
        "Order edited"
    );

    Ok(TradeOutcome {
        message: format!("Order updated to {new_price:.2}"),
        order_id: Some(new_clob_id),
    })
}

/// Cancel a LIVE order. Stop-loss watches are cleared locally; exchange
/// orders get a best-effort CLOB cancel before the ledger transition.
pub async fn cancel_order(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
    order_id: Uuid,
) -> Result<TradeOutcome, TradeError> {
    let order = order_repo::get_order(pool, order_id, user.id)
        .await?
        .ok_or_else(|| rejected("Order not found"))?;

    if !order.is_live() {
        return Err(rejected("Can only cancel LIVE orders"));
    }

    if order.order_type == order_type::STOP_LOSS {
        if let Some(position_id) = order.position_id {
            position_repo::clear_stop_loss(pool, position_id).await?;
        }
        order_repo::set_status(pool, order.id, order_status::CANCELLED).await?;
        return Ok(TradeOutcome {
            message: "Stop loss cancelled".into(),
            order_id: None,
        });
    }

    let creds = require_signing_creds(user)?;
    if let Err(e) = gateway.cancel_order(&creds, &order.polymarket_order_id).await {
        tracing::warn!(
            order_id = %order.polymarket_order_id,
            error = %e,
            "Failed to cancel order on CLOB"
        );
    }

    order_repo::set_status(pool, order.id, order_status::CANCELLED).await?;

    if let Some(position_id) = order.position_id {
        if let Some(position) = position_repo::get_position(pool, position_id, user.id).await? {
            if position.tp_order_id.as_deref() == Some(order.polymarket_order_id.as_str()) {
                position_repo::clear_take_profit(pool, position.id).await?;
            }
        }
    }

    tracing::info!(order_id = %order.id, order_type = %order.order_type, "Order cancelled");

    Ok(TradeOutcome {
        message: "Order cancelled".into(),
        order_id: None,
    })
}
