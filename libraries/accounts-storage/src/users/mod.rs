//! User account queries

use crate::error::{Result, StorageError};
use accounts_core::types::{NewUser, User, UserChanges, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str =
    "id, email, password, name, is_active, is_staff, is_superuser, date_joined";

/// Map a `users` row to the domain type
pub(crate) fn from_row(row: &SqliteRow) -> Result<User> {
    let date_joined = row.try_get::<i64, _>("date_joined")?;

    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        date_joined: chrono::DateTime::from_timestamp(date_joined, 0)
            .ok_or_else(|| StorageError::Query(format!("Invalid timestamp: {date_joined}")))?,
    })
}

/// Insert a new account
///
/// Fails with `StorageError::Duplicate` when the email is already taken.
pub async fn create(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        "INSERT INTO users (email, password, name, is_active, is_staff, is_superuser, date_joined)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(now)
    .execute(pool)
    .await?;

    let id = UserId::new(result.last_insert_rowid());
    get_by_id(pool, id)
        .await?
        .ok_or_else(|| StorageError::not_found("User", id.to_string()))
}

/// Get a user by ID
pub async fn get_by_id(pool: &SqlitePool, id: UserId) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get a user by exact email
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get all users ordered by ID
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

/// Update profile fields, leaving unset ones untouched
pub async fn update(pool: &SqlitePool, id: UserId, changes: &UserChanges) -> Result<User> {
    if !changes.is_empty() {
        let result = sqlx::query(
            "UPDATE users
             SET email = COALESCE(?, email),
                 name = COALESCE(?, name)
             WHERE id = ?",
        )
        .bind(changes.email.as_deref())
        .bind(changes.name.as_deref())
        .bind(id.get())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", id.to_string()));
        }
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| StorageError::not_found("User", id.to_string()))
}

/// Replace a user's password hash
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `id` - User ID
/// * `password_hash` - Already-hashed password
pub async fn set_password_hash(pool: &SqlitePool, id: UserId, password_hash: &str) -> Result<()> {
    let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id.get())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id.to_string()));
    }

    Ok(())
}
