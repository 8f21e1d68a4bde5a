//! User repository for database operations

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{models::User, DbPool};

/// Player account storage, keyed by lowercase wallet address
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the account on first sign-in, otherwise refresh `last_login_at`
    async fn upsert_wallet_user(&self, wallet_address: &str) -> Result<User>;

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>>;

    async fn check_health(&self) -> Result<()>;
}

/// PostgreSQL-backed [`UserStore`]
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn upsert_wallet_user(&self, wallet_address: &str) -> Result<User> {
        let id = uuid::Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, wallet_address, last_login_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (wallet_address) DO UPDATE
            SET last_login_at = NOW(), updated_at = NOW()
            RETURNING id, wallet_address, username, avatar_url, created_at, updated_at, last_login_at
            "#,
        )
        .bind(&id)
        .bind(wallet_address.to_lowercase())
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert wallet user")?;

        Ok(user)
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, wallet_address, username, avatar_url, created_at, updated_at, last_login_at
            FROM users
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet_address.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find user by wallet address")?;

        Ok(user)
    }

    async fn check_health(&self) -> Result<()> {
        shared::db::check_health(&self.pool)
            .await
            .context("Database health check failed")
    }
}
