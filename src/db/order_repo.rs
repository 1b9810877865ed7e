use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::order::{order_status, order_type};
use crate::models::Order;

/// One live order as reported by the CLOB, ready to upsert.
#[derive(Debug, Clone)]
pub struct OrderUpsert {
    pub polymarket_order_id: String,
    pub market_id: String,
    pub token_id: String,
    pub side: String,
    pub outcome: String,
    pub order_type: String,
    pub size: Decimal,
    pub price: Decimal,
    pub size_filled: Decimal,
    pub status: String,
    pub market_question: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
}

/// Get orders for a user, newest placement first, optionally filtered by status.
pub async fn get_user_orders(
    pool: &PgPool,
    user_id: Uuid,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        r#"
        SELECT * FROM orders
        WHERE user_id = $1
          AND ($2::text IS NULL OR status = $2)
        ORDER BY placed_at DESC NULLS LAST
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(status.map(str::to_uppercase))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn count_user_orders(
    pool: &PgPool,
    user_id: Uuid,
    status: Option<&str>,
) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM orders
        WHERE user_id = $1
          AND ($2::text IS NULL OR status = $2)
        "#,
    )
    .bind(user_id)
    .bind(status.map(str::to_uppercase))
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Per-status order counts for the list summary: (live, matched, cancelled).
pub async fn count_by_statuses(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<(i64, i64, i64)> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM orders WHERE user_id = $1 GROUP BY status",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let count_for = |s: &str| {
        rows.iter()
            .find(|(status, _)| status == s)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };

    Ok((
        count_for(order_status::LIVE),
        count_for(order_status::MATCHED),
        count_for(order_status::CANCELLED),
    ))
}

/// Bulk upsert orders from a sync sweep, keyed on (user_id, polymarket_order_id).
///
/// On conflict only the mutable columns are overwritten; side, outcome,
/// order type and placement time are immutable once created.
pub async fn upsert_many(
    pool: &PgPool,
    user_id: Uuid,
    rows: &[OrderUpsert],
) -> anyhow::Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, market_id, token_id, polymarket_order_id, side,
                outcome, order_type, size, price, size_filled, status,
                market_question, placed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id, polymarket_order_id) DO UPDATE
            SET size = EXCLUDED.size,
                price = EXCLUDED.price,
                size_filled = EXCLUDED.size_filled,
                status = EXCLUDED.status,
                market_question = EXCLUDED.market_question,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&row.market_id)
        .bind(&row.token_id)
        .bind(&row.polymarket_order_id)
        .bind(&row.side)
        .bind(&row.outcome)
        .bind(&row.order_type)
        .bind(row.size)
        .bind(row.price)
        .bind(row.size_filled)
        .bind(&row.status)
        .bind(&row.market_question)
        .bind(row.placed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

/// Resolve LIVE orders that disappeared from the reported live set.
///
/// The CLOB only returns live orders, so a vanished order was filled or
/// cancelled; fills are assumed as the default. Synthetic STOP_LOSS watches
/// are excluded; they never appear in the live set by construction.
pub async fn resolve_missing_live_orders(
    pool: &PgPool,
    user_id: Uuid,
    live_order_ids: &[String],
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'MATCHED', size_filled = size, updated_at = NOW()
        WHERE user_id = $1
          AND status = 'LIVE'
          AND order_type <> $2
          AND NOT (polymarket_order_id = ANY($3))
        "#,
    )
    .bind(user_id)
    .bind(order_type::STOP_LOSS)
    .bind(live_order_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Get a single order by its ledger id, scoped to its owner.
pub async fn get_order(
    pool: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Get an order by its external (or synthetic `sl-*`) id.
pub async fn get_by_external_id(
    pool: &PgPool,
    user_id: Uuid,
    polymarket_order_id: &str,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 AND polymarket_order_id = $2",
    )
    .bind(user_id)
    .bind(polymarket_order_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Insert a locally-originated order record (synthetic stop-loss watch or a
/// just-submitted exchange order).
#[allow(clippy::too_many_arguments)]
pub async fn insert_order(
    pool: &PgPool,
    user_id: Uuid,
    market_id: &str,
    token_id: &str,
    polymarket_order_id: &str,
    side: &str,
    outcome: &str,
    order_type: &str,
    size: Decimal,
    price: Decimal,
    market_question: Option<&str>,
    position_id: Option<Uuid>,
) -> anyhow::Result<Order> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            id, user_id, market_id, token_id, polymarket_order_id, side,
            outcome, order_type, size, price, size_filled, status,
            market_question, position_id, placed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 'LIVE', $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(market_id)
    .bind(token_id)
    .bind(polymarket_order_id)
    .bind(side)
    .bind(outcome)
    .bind(order_type)
    .bind(size)
    .bind(price)
    .bind(market_question)
    .bind(position_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(order)
}

/// Set an order's status (LIVE → MATCHED / CANCELLED transitions only are
/// expected by callers).
pub async fn set_status(pool: &PgPool, order_id: Uuid, status: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Direct price mutation for synthetic stop-loss watches (no exchange-side
/// order to replace).
pub async fn set_price(pool: &PgPool, order_id: Uuid, price: Decimal) -> anyhow::Result<()> {
    sqlx::query("UPDATE orders SET price = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(price)
        .execute(pool)
        .await?;

    Ok(())
}

/// Rebind an edited exchange order to its replacement: fresh external id and
/// price, remaining size, fill counter reset.
pub async fn replace_exchange_order(
    pool: &PgPool,
    order_id: Uuid,
    new_polymarket_order_id: &str,
    price: Decimal,
    remaining_size: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET polymarket_order_id = $2, price = $3, size = $4, size_filled = 0,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(new_polymarket_order_id)
    .bind(price)
    .bind(remaining_size)
    .execute(pool)
    .await?;

    Ok(())
}
