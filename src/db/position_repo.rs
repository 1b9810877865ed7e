use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Position;

/// One position as reported by the external feed, ready to upsert.
#[derive(Debug, Clone)]
pub struct PositionUpsert {
    pub market_id: String,
    pub token_id: String,
    pub outcome: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub current_price: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub redeemable: bool,
}

/// Get positions for a user. `active_only` excludes resolved markets.
pub async fn get_user_positions(
    pool: &PgPool,
    user_id: Uuid,
    active_only: bool,
    limit: i64,
) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        r#"
        SELECT * FROM positions
        WHERE user_id = $1
          AND size > 0
          AND (NOT $2 OR redeemable = false)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(active_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Get a single position by id, scoped to its owner.
pub async fn get_position(
    pool: &PgPool,
    position_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<Position>> {
    let pos = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE id = $1 AND user_id = $2",
    )
    .bind(position_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(pos)
}

/// Bulk upsert positions from a sync sweep, keyed on (user_id, token_id).
///
/// Rows are applied in iteration order inside one transaction, so a
/// duplicate token in the batch leaves the last row's values. On conflict
/// only the feed-owned columns are overwritten; SL/TP configuration is
/// untouched.
pub async fn upsert_many(
    pool: &PgPool,
    user_id: Uuid,
    rows: &[PositionUpsert],
) -> anyhow::Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO positions (
                id, user_id, market_id, token_id, outcome, size, avg_price,
                current_price, realized_pnl, title, slug, icon, redeemable, synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id, token_id) DO UPDATE
            SET size = EXCLUDED.size,
                avg_price = EXCLUDED.avg_price,
                current_price = EXCLUDED.current_price,
                realized_pnl = EXCLUDED.realized_pnl,
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                icon = EXCLUDED.icon,
                redeemable = EXCLUDED.redeemable,
                synced_at = EXCLUDED.synced_at,
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&row.market_id)
        .bind(&row.token_id)
        .bind(&row.outcome)
        .bind(row.size)
        .bind(row.avg_price)
        .bind(row.current_price)
        .bind(row.realized_pnl)
        .bind(&row.title)
        .bind(&row.slug)
        .bind(&row.icon)
        .bind(row.redeemable)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

/// Zero out positions the feed stopped reporting.
///
/// The Data API drops sold/closed positions instead of returning them with
/// size 0, so absence from `active_token_ids` is the closing signal.
pub async fn zero_missing_positions(
    pool: &PgPool,
    user_id: Uuid,
    active_token_ids: &[String],
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE positions
        SET size = 0, current_price = 0, updated_at = NOW()
        WHERE user_id = $1
          AND size > 0
          AND NOT (token_id = ANY($2))
        "#,
    )
    .bind(user_id)
    .bind(active_token_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All positions (any user) with an armed stop loss worth checking.
pub async fn get_stop_loss_candidates(pool: &PgPool) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        r#"
        SELECT * FROM positions
        WHERE stop_loss_price IS NOT NULL
          AND size > 0
          AND redeemable = false
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Arm or move a position's stop loss.
pub async fn set_stop_loss(
    pool: &PgPool,
    position_id: Uuid,
    price: Decimal,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE positions SET stop_loss_price = $2, updated_at = NOW() WHERE id = $1")
        .bind(position_id)
        .bind(price)
        .execute(pool)
        .await?;

    Ok(())
}

/// Arm a stop loss and create or revive its synthetic watch order in one
/// transaction, so the armed trigger and its ledger record never diverge.
pub async fn arm_stop_loss(
    pool: &PgPool,
    position: &Position,
    synthetic_order_id: &str,
    price: Decimal,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE positions SET stop_loss_price = $2, updated_at = NOW() WHERE id = $1")
        .bind(position.id)
        .bind(price)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, market_id, token_id, polymarket_order_id, side,
            outcome, order_type, size, price, size_filled, status,
            market_question, position_id, placed_at
        )
        VALUES ($1, $2, $3, $4, $5, 'SELL', $6, 'STOP_LOSS', $7, $8, 0, 'LIVE', $9, $10, $11)
        ON CONFLICT (user_id, polymarket_order_id) DO UPDATE
        SET price = EXCLUDED.price,
            size = EXCLUDED.size,
            size_filled = 0,
            status = 'LIVE',
            market_question = EXCLUDED.market_question,
            placed_at = EXCLUDED.placed_at,
            updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(position.user_id)
    .bind(&position.market_id)
    .bind(&position.token_id)
    .bind(synthetic_order_id)
    .bind(&position.outcome)
    .bind(position.size)
    .bind(price)
    .bind(&position.title)
    .bind(position.id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Disarm a position's stop loss.
pub async fn clear_stop_loss(pool: &PgPool, position_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE positions SET stop_loss_price = NULL, updated_at = NOW() WHERE id = $1")
        .bind(position_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Record a freshly placed take-profit order on the position.
pub async fn set_take_profit(
    pool: &PgPool,
    position_id: Uuid,
    price: Decimal,
    tp_order_id: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE positions
        SET take_profit_price = $2, tp_order_id = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(position_id)
    .bind(price)
    .bind(tp_order_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_take_profit(pool: &PgPool, position_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE positions
        SET take_profit_price = NULL, tp_order_id = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(position_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clear a triggered stop loss and settle its synthetic watch order in one
/// transaction, so a trigger is never half-recorded.
pub async fn finalize_stop_loss_execution(
    pool: &PgPool,
    position_id: Uuid,
    user_id: Uuid,
    synthetic_order_id: &str,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE positions SET stop_loss_price = NULL, updated_at = NOW() WHERE id = $1")
        .bind(position_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE orders
        SET status = 'MATCHED', size_filled = size, updated_at = NOW()
        WHERE user_id = $1
          AND polymarket_order_id = $2
          AND status = 'LIVE'
        "#,
    )
    .bind(user_id)
    .bind(synthetic_order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Token → market title pairs for a user's known positions, used to backfill
/// order display metadata without extra API calls.
pub async fn get_token_titles(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT token_id, title FROM positions WHERE user_id = $1 AND title IS NOT NULL",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
