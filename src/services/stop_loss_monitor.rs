use metrics::{counter, gauge};
use sqlx::PgPool;

use crate::db::{position_repo, snapshot_repo, user_repo};
use crate::models::order::stop_loss_order_id;
use crate::models::{Position, Side};
use crate::polymarket::MarketGateway;
use crate::services::trading;

/// One sweep over every armed stop loss. Returns how many triggers fired.
///
/// Each position is checked in isolation so one bad market or one user's
/// broken credentials never blocks the rest of the sweep.
pub async fn run_stop_loss_sweep(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
) -> anyhow::Result<u32> {
    let candidates = position_repo::get_stop_loss_candidates(pool).await?;
    gauge!("active_stop_losses").set(candidates.len() as f64);

    if candidates.is_empty() {
        return Ok(0);
    }

    tracing::debug!(count = candidates.len(), "Checking stop loss candidates");

    let mut triggered = 0u32;
    for position in candidates {
        match check_position(pool, gateway, &position).await {
            Ok(true) => triggered += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    position_id = %position.id,
                    token_id = %position.token_id,
                    error = %e,
                    "Stop loss check failed"
                );
            }
        }
    }

    if triggered > 0 {
        tracing::info!(triggered, "Stop loss sweep complete");
    }

    Ok(triggered)
}

/// Check one armed position against the live bid. Returns whether it fired.
async fn check_position(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    position: &Position,
) -> anyhow::Result<bool> {
    let Some(stop_price) = position.stop_loss_price else {
        return Ok(false);
    };

    // The trigger compares against what a sell would actually get, so the
    // sell side of the book is the reference price.
    let current = match gateway.get_price(&position.token_id, Side::Sell).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            tracing::debug!(token_id = %position.token_id, "No bid available, skipping");
            return Ok(false);
        }
        Err(e) => {
            tracing::warn!(token_id = %position.token_id, error = %e, "Price fetch failed");
            return Ok(false);
        }
    };

    if let Err(e) = snapshot_repo::insert_snapshot(pool, &position.token_id, current).await {
        tracing::warn!(token_id = %position.token_id, error = %e, "Snapshot insert failed");
    }

    if current > stop_price {
        return Ok(false);
    }

    tracing::info!(
        position_id = %position.id,
        token_id = %position.token_id,
        %current,
        %stop_price,
        "Stop loss triggered"
    );

    let user = user_repo::get_user(pool, position.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("owner of position {} not found", position.id))?;

    if !user.has_signing_key() {
        tracing::error!(
            position_id = %position.id,
            user_id = %user.id,
            "Stop loss triggered but user has no signing key"
        );
        counter!("stop_loss_failed_total").increment(1);
        return Ok(false);
    }

    match trading::market_sell(pool, gateway, &user, position.id).await {
        Ok(outcome) => {
            // Clearing the trigger and settling the watch commit together,
            // so a fired stop loss can never fire twice.
            position_repo::finalize_stop_loss_execution(
                pool,
                position.id,
                position.user_id,
                &stop_loss_order_id(position.id),
            )
            .await?;

            counter!("stop_loss_triggered_total").increment(1);
            tracing::info!(
                position_id = %position.id,
                order_id = ?outcome.order_id,
                "Stop loss executed"
            );
            Ok(true)
        }
        Err(e) => {
            // Trigger stays armed; the next sweep retries.
            counter!("stop_loss_failed_total").increment(1);
            tracing::error!(
                position_id = %position.id,
                error = %e,
                "Stop loss sell failed"
            );
            Ok(false)
        }
    }
}
