use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::position_repo::{self, PositionUpsert};
use crate::models::User;
use crate::polymarket::{MarketGateway, RawPosition};

/// Reconcile a user's positions against the public Data API feed.
/// Returns the number of rows upserted.
pub async fn sync_positions(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
) -> anyhow::Result<usize> {
    let wallet = user.portfolio_wallet();
    tracing::info!(
        user_id = %user.id,
        wallet = %wallet,
        "Syncing positions from Data API"
    );

    let raw_positions = gateway.get_user_positions(wallet).await?;

    if raw_positions.is_empty() {
        // An empty feed is indistinguishable from a transient upstream gap,
        // so nothing is zeroed here; the next sweep with data self-heals.
        tracing::info!(user_id = %user.id, "No positions reported for wallet");
        return Ok(0);
    }

    apply_position_sync(pool, user.id, &raw_positions).await
}

/// Apply one externally-reported position set to the ledger.
///
/// Rows with positive size are upserted; every stored position whose token
/// does not appear in the report at all (any size) is then zeroed, since the
/// feed drops closed positions instead of reporting them empty. The two
/// passes commit independently; a failure in between leaves extra non-zeroed
/// rows that the next sweep cleans up.
pub async fn apply_position_sync(
    pool: &PgPool,
    user_id: Uuid,
    raw_positions: &[RawPosition],
) -> anyhow::Result<usize> {
    let mut rows: Vec<PositionUpsert> = Vec::new();
    let mut reported_token_ids: Vec<String> = Vec::new();

    for raw in raw_positions {
        if raw.asset.is_empty() {
            tracing::debug!("Skipping position record without token id");
            continue;
        }

        reported_token_ids.push(raw.asset.clone());

        let size = raw.size.unwrap_or(Decimal::ZERO);
        if size <= Decimal::ZERO {
            continue;
        }
        if raw.condition_id.is_empty() {
            tracing::debug!(token_id = %raw.asset, "Skipping position record without market id");
            continue;
        }

        rows.push(PositionUpsert {
            market_id: raw.condition_id.clone(),
            token_id: raw.asset.clone(),
            outcome: raw.outcome.clone().unwrap_or_else(|| "Unknown".into()),
            size,
            avg_price: raw.avg_price.unwrap_or(Decimal::ZERO),
            current_price: raw.cur_price,
            realized_pnl: raw.realized_pnl.unwrap_or(Decimal::ZERO),
            title: raw.title.clone(),
            slug: raw.display_slug().map(str::to_string),
            icon: raw.icon.clone(),
            redeemable: raw.redeemable,
        });
    }

    let count = position_repo::upsert_many(pool, user_id, &rows).await?;

    if !reported_token_ids.is_empty() {
        let zeroed =
            position_repo::zero_missing_positions(pool, user_id, &reported_token_ids).await?;
        if zeroed > 0 {
            tracing::info!(user_id = %user_id, zeroed, "Zeroed stale positions");
        }
    }

    counter!("positions_synced_total").increment(count as u64);
    tracing::info!(user_id = %user_id, count, "Position sync complete");

    Ok(count)
}
