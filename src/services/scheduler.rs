use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::AppConfig;
use crate::db::user_repo;
use crate::polymarket::MarketGateway;
use crate::services::{order_sync, portfolio_sync, stop_loss_monitor};

/// Spawn the background loops: the market sync sweep and the stop loss
/// monitor. Both run for the life of the process.
pub fn spawn_background_jobs(pool: PgPool, gateway: Arc<dyn MarketGateway>, config: &AppConfig) {
    let sync_every = Duration::from_secs(config.market_sync_interval_secs);
    let sweep_every = Duration::from_secs(config.stop_loss_interval_secs);

    {
        let pool = pool.clone();
        let gateway = gateway.clone();
        tokio::spawn(async move {
            // First tick fires immediately so the dashboard is warm at boot.
            let mut ticker = interval(sync_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = run_market_sync(&pool, gateway.as_ref()).await {
                    tracing::error!(error = %e, "Market sync sweep failed");
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut ticker = interval(sweep_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = stop_loss_monitor::run_stop_loss_sweep(&pool, gateway.as_ref()).await
            {
                tracing::error!(error = %e, "Stop loss sweep failed");
            }
        }
    });

    tracing::info!(
        market_sync_secs = config.market_sync_interval_secs,
        stop_loss_secs = config.stop_loss_interval_secs,
        "Background jobs started"
    );
}

/// Sync positions and orders for every registered user. Per-user failures
/// are logged and skipped so one user's upstream trouble never stalls the
/// others.
async fn run_market_sync(pool: &PgPool, gateway: &dyn MarketGateway) -> anyhow::Result<()> {
    let users = user_repo::list_users(pool).await?;
    if users.is_empty() {
        return Ok(());
    }

    tracing::debug!(users = users.len(), "Starting market sync sweep");

    for user in &users {
        if let Err(e) = portfolio_sync::sync_positions(pool, gateway, user).await {
            tracing::error!(user_id = %user.id, error = %e, "Position sync failed");
        }
        if let Err(e) = order_sync::sync_orders(pool, gateway, user).await {
            tracing::error!(user_id = %user.id, error = %e, "Order sync failed");
        }
    }

    Ok(())
}
