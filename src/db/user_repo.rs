use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// All registered users, oldest first. Used by the sync sweeps.
pub async fn list_users(pool: &PgPool) -> anyhow::Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;

    Ok(users)
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Look up or register a user by wallet address.
pub async fn get_or_create(pool: &PgPool, wallet_address: &str) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, wallet_address)
        VALUES ($1, $2)
        ON CONFLICT (wallet_address) DO UPDATE SET updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(wallet_address)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Store gateway credentials for a user. `None` leaves a column unchanged.
pub async fn update_credentials(
    pool: &PgPool,
    user_id: Uuid,
    proxy_wallet: Option<&str>,
    private_key: Option<&str>,
    api_key: Option<&str>,
    api_secret: Option<&str>,
    passphrase: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET proxy_wallet = COALESCE($2, proxy_wallet),
            private_key = COALESCE($3, private_key),
            api_key = COALESCE($4, api_key),
            api_secret = COALESCE($5, api_secret),
            passphrase = COALESCE($6, passphrase),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(proxy_wallet)
    .bind(private_key)
    .bind(api_key)
    .bind(api_secret)
    .bind(passphrase)
    .execute(pool)
    .await?;

    Ok(())
}
