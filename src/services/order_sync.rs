use std::collections::{HashMap, HashSet};

use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::order_repo::{self, OrderUpsert};
use crate::db::position_repo;
use crate::models::order::{normalize_status, order_status};
use crate::models::User;
use crate::polymarket::{ApiCredentials, MarketGateway, RawOrder};

/// Reconcile a user's orders against the CLOB's live-order list.
/// Returns the number of rows upserted.
pub async fn sync_orders(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user: &User,
) -> anyhow::Result<usize> {
    let Some(creds) = ApiCredentials::for_user(user) else {
        tracing::warn!(user_id = %user.id, "User has no API credentials, skipping order sync");
        return Ok(0);
    };

    let raw_orders = gateway.get_user_orders(&creds).await?;
    apply_order_sync(pool, gateway, user.id, &raw_orders).await
}

/// Apply one reported live-order set to the ledger.
///
/// Reported orders are upserted, then every LIVE non-STOP_LOSS order absent
/// from the report is resolved as MATCHED: the endpoint only returns live
/// orders, so disappearance means filled or cancelled, and fills are assumed
/// as the default.
pub async fn apply_order_sync(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user_id: Uuid,
    raw_orders: &[RawOrder],
) -> anyhow::Result<usize> {
    if raw_orders.is_empty() {
        // Every previously-live exchange order is gone.
        let resolved = order_repo::resolve_missing_live_orders(pool, user_id, &[]).await?;
        if resolved > 0 {
            counter!("orders_resolved_total").increment(resolved);
            tracing::info!(user_id = %user_id, resolved, "Resolved filled orders (empty live set)");
        }
        return Ok(0);
    }

    let title_map = build_title_map(pool, gateway, user_id, raw_orders).await?;

    let mut rows: Vec<OrderUpsert> = Vec::new();
    let mut live_ids: Vec<String> = Vec::new();

    for raw in raw_orders {
        if raw.id.is_empty() || raw.market.is_empty() || raw.asset_id.is_empty() {
            tracing::debug!("Skipping malformed order record from CLOB");
            continue;
        }

        rows.push(OrderUpsert {
            polymarket_order_id: raw.id.clone(),
            market_id: raw.market.clone(),
            token_id: raw.asset_id.clone(),
            side: raw
                .side
                .as_deref()
                .unwrap_or("BUY")
                .to_uppercase(),
            outcome: raw.outcome.clone().unwrap_or_else(|| "Unknown".into()),
            order_type: raw
                .order_type
                .as_deref()
                .unwrap_or("GTC")
                .to_uppercase(),
            size: raw.original_size.unwrap_or(Decimal::ZERO),
            price: raw.price.unwrap_or(Decimal::ZERO),
            size_filled: raw.size_matched.unwrap_or(Decimal::ZERO),
            status: normalize_status(raw.status.as_deref().unwrap_or(order_status::LIVE)),
            market_question: title_map.get(&raw.asset_id).cloned(),
            placed_at: raw.created_at,
        });
        live_ids.push(raw.id.clone());
    }

    let count = order_repo::upsert_many(pool, user_id, &rows).await?;

    let resolved = order_repo::resolve_missing_live_orders(pool, user_id, &live_ids).await?;
    if resolved > 0 {
        counter!("orders_resolved_total").increment(resolved);
        tracing::info!(user_id = %user_id, resolved, "Resolved filled orders");
    }

    counter!("orders_synced_total").increment(count as u64);
    tracing::info!(user_id = %user_id, count, "Order sync complete");

    Ok(count)
}

/// Token → market question lookup for display metadata: known positions
/// first, then a best-effort Gamma query per still-unknown token. A failed
/// lookup just leaves the question null.
async fn build_title_map(
    pool: &PgPool,
    gateway: &dyn MarketGateway,
    user_id: Uuid,
    raw_orders: &[RawOrder],
) -> anyhow::Result<HashMap<String, String>> {
    let mut title_map: HashMap<String, String> = position_repo::get_token_titles(pool, user_id)
        .await?
        .into_iter()
        .collect();

    let missing: HashSet<&str> = raw_orders
        .iter()
        .filter(|raw| !raw.asset_id.is_empty() && !title_map.contains_key(&raw.asset_id))
        .map(|raw| raw.asset_id.as_str())
        .collect();

    for token_id in missing {
        match gateway.get_market_question(token_id).await {
            Ok(Some(question)) => {
                title_map.insert(token_id.to_string(), question);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(token_id, error = %e, "Gamma title lookup failed");
            }
        }
    }

    Ok(title_map)
}
