/// `SQLite`-backed account store
use crate::{create_pool, run_migrations, tokens, users, StorageError};
use accounts_core::{
    error::Result,
    store::UserStore,
    types::{NewUser, Token, User, UserChanges, UserId},
};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Account database over a `SQLite` pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url` and apply migrations
    ///
    /// # Errors
    /// Returns an error if the connection fails or migrations fail
    pub async fn connect(database_url: &str) -> std::result::Result<Self, StorageError> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Create database from an existing, migrated pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for Database {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        Ok(users::create(&self.pool, user).await?)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(users::get_by_id(&self.pool, id).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(users::get_by_email(&self.pool, email).await?)
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        Ok(users::get_all(&self.pool).await?)
    }

    async fn update_user(&self, id: UserId, changes: &UserChanges) -> Result<User> {
        Ok(users::update(&self.pool, id, changes).await?)
    }

    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        Ok(users::set_password_hash(&self.pool, id, password_hash).await?)
    }

    async fn get_or_create_token(&self, user_id: UserId, candidate_key: &str) -> Result<Token> {
        Ok(tokens::get_or_create(&self.pool, user_id, candidate_key).await?)
    }

    async fn get_user_by_token(&self, key: &str) -> Result<Option<User>> {
        Ok(tokens::get_user(&self.pool, key).await?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
