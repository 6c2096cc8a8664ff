//! User repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use jotter_core::{Error, Result, User, UserRepository};

use crate::map_unique_violation;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, avatar, provider, is_verified, created_at, updated_at";

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::user_not_found(id))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, avatar, provider, is_verified,
                                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.avatar)
        .bind(&user.provider)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "user with this email already exists"))?;
        Ok(())
    }
}
