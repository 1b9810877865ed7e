use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PriceSnapshot;

/// Append one price observation. Snapshots are never updated or deleted.
pub async fn insert_snapshot(
    pool: &PgPool,
    token_id: &str,
    price: Decimal,
) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO price_snapshots (id, token_id, price) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(token_id)
        .bind(price)
        .execute(pool)
        .await?;

    Ok(())
}

/// Most recent snapshots for a token, newest first.
pub async fn get_recent(
    pool: &PgPool,
    token_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<PriceSnapshot>> {
    let snapshots = sqlx::query_as::<_, PriceSnapshot>(
        r#"
        SELECT * FROM price_snapshots
        WHERE token_id = $1
        ORDER BY captured_at DESC
        LIMIT $2
        "#,
    )
    .bind(token_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(snapshots)
}
