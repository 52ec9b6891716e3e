//! Authentication token queries

use crate::error::{Result, StorageError};
use crate::users;
use accounts_core::types::{Token, User, UserId};
use sqlx::{Row, SqlitePool};

/// Return the user's token, creating it with `candidate_key` when absent
///
/// The insert is a no-op if the user already owns a token, so concurrent
/// logins converge on a single key.
pub async fn get_or_create(pool: &SqlitePool, user_id: UserId, candidate_key: &str) -> Result<Token> {
    sqlx::query(
        "INSERT INTO auth_tokens (key, user_id, created)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(candidate_key)
    .bind(user_id.get())
    .bind(chrono::Utc::now().timestamp())
    .execute(pool)
    .await?;

    get_for_user(pool, user_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Token", user_id.to_string()))
}

/// Get the token owned by a user
pub async fn get_for_user(pool: &SqlitePool, user_id: UserId) -> Result<Option<Token>> {
    let row = sqlx::query("SELECT key, user_id, created FROM auth_tokens WHERE user_id = ?")
        .bind(user_id.get())
        .fetch_optional(pool)
        .await?;

    row.map(|row| -> Result<Token> {
        let created = row.try_get::<i64, _>("created")?;
        Ok(Token {
            key: row.try_get("key")?,
            user_id: UserId::new(row.try_get("user_id")?),
            created: chrono::DateTime::from_timestamp(created, 0)
                .ok_or_else(|| StorageError::Query(format!("Invalid timestamp: {created}")))?,
        })
    })
    .transpose()
}

/// Resolve a token key to the owning user
pub async fn get_user(pool: &SqlitePool, key: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT u.id, u.email, u.password, u.name, u.is_active, u.is_staff, u.is_superuser, u.date_joined
         FROM users u
         INNER JOIN auth_tokens t ON t.user_id = u.id
         WHERE t.key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(users::from_row).transpose()
}
