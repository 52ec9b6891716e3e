//! Storage trait for accounts and tokens

use crate::error::Result;
use crate::types::{NewUser, Token, User, UserChanges, UserId};
use async_trait::async_trait;

/// Persistent store of user accounts and their authentication tokens
///
/// Implementations must enforce email uniqueness and the one-token-per-user
/// relation themselves; callers rely on `AccountError::Duplicate` for the
/// former and on `get_or_create_token` being atomic for the latter.
#[async_trait]
pub trait UserStore: Send + Sync {
    // ========================================================================
    // Users
    // ========================================================================

    /// Insert a new account
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Get a user by exact email match
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get all users, oldest first
    async fn get_all_users(&self) -> Result<Vec<User>>;

    /// Apply profile changes and return the updated record
    async fn update_user(&self, id: UserId, changes: &UserChanges) -> Result<User>;

    /// Replace the stored password hash
    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()>;

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Return the user's token, inserting one with `candidate_key` if absent
    async fn get_or_create_token(&self, user_id: UserId, candidate_key: &str) -> Result<Token>;

    /// Resolve a token key to its owner
    async fn get_user_by_token(&self, key: &str) -> Result<Option<User>>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> Result<()>;
}
