//! Account manager: creation, credential checks, and token issuance.
//!
//! Every bcrypt hash or verify runs on the blocking pool.

use crate::{
    error::{Result, ServerError},
    services::{auth::MAX_PASSWORD_BYTES, AuthService},
};
use accounts_core::{email, AccountError, NewUser, Token, User, UserChanges, UserStore};
use std::sync::Arc;

/// Optional fields for a new account
#[derive(Debug, Clone, Default)]
pub struct UserExtras {
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Clone)]
pub struct AccountManager {
    store: Arc<dyn UserStore>,
    auth: AuthService,
}

impl AccountManager {
    pub fn new(store: Arc<dyn UserStore>, auth: AuthService) -> Self {
        Self { store, auth }
    }

    /// Create a normal, active account
    ///
    /// The email's domain is lowercased. A `None` password leaves the account
    /// without a usable password.
    pub async fn create_user(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        extras: UserExtras,
    ) -> Result<User> {
        let email = match email {
            Some(email) if !email.is_empty() => email::normalize(email),
            _ => {
                return Err(AccountError::invalid_input("Users must have an email address").into())
            }
        };

        let password_hash = match password {
            Some(password) => self.hash(password).await?,
            None => self.auth.unusable_password(),
        };

        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                name: extras.name,
                is_active: true,
                is_staff: extras.is_staff,
                is_superuser: extras.is_superuser,
            })
            .await?;

        tracing::info!(user_id = %user.id, superuser = user.is_superuser, "Created user");
        Ok(user)
    }

    /// Create an account with staff and superuser flags set
    pub async fn create_superuser(&self, email: Option<&str>, password: Option<&str>) -> Result<User> {
        self.create_user(
            email,
            password,
            UserExtras {
                is_staff: true,
                is_superuser: true,
                ..Default::default()
            },
        )
        .await
    }

    /// Compare `password` with the user's stored hash
    pub async fn check_password(&self, user: &User, password: &str) -> Result<bool> {
        let auth = self.auth.clone();
        let password = password.to_string();
        let hash = user.password_hash.clone();

        run_blocking(move || auth.verify_password(&password, &hash)).await
    }

    /// Re-hash and store a new password, leaving other columns untouched
    pub async fn set_password(&self, user: &User, password: &str) -> Result<()> {
        let password_hash = self.hash(password).await?;
        self.store.set_password_hash(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Look up an active user by email and verify the password
    ///
    /// Returns `None` for unknown emails, wrong passwords, and inactive
    /// accounts alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        // No stored hash can match a password bcrypt would have refused
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(None);
        }

        let Some(user) = self.find_by_email(email).await? else {
            // Unknown emails still pay for one hash
            self.hash(password).await?;
            return Ok(None);
        };

        if !self.check_password(&user, password).await? || !user.is_active {
            tracing::warn!(user_id = %user.id, "Authentication failed");
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Get the user's token, issuing one on first use
    pub async fn obtain_token(&self, user: &User) -> Result<Token> {
        let candidate = self.auth.generate_token_key();
        let token = self.store.get_or_create_token(user.id, &candidate).await?;

        if token.key == candidate {
            tracing::info!(user_id = %user.id, "Issued new token");
        }

        Ok(token)
    }

    /// Resolve a presented token key to its owner
    pub async fn user_for_token(&self, key: &str) -> Result<Option<User>> {
        Ok(self.store.get_user_by_token(key).await?)
    }

    /// Find a user by email, normalizing the domain first
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .store
            .get_user_by_email(&email::normalize(email))
            .await?)
    }

    /// Apply profile changes; a changed email is normalized like on creation
    pub async fn update_user(&self, user: &User, mut changes: UserChanges) -> Result<User> {
        changes.email = changes.email.map(|e| email::normalize(&e));
        Ok(self.store.update_user(user.id, &changes).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.get_all_users().await?)
    }

    /// Whether the account store answers queries
    pub async fn store_is_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Account store unreachable: {}", e);
                false
            }
        }
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let auth = self.auth.clone();
        let password = password.to_string();

        run_blocking(move || auth.hash_password(&password)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("Blocking task failed: {}", e)))?
}
