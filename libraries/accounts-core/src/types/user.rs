/// User domain types
use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking a stored hash that can never match a password
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// User account
///
/// The email is the account's only identifier; there is no username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Email address, domain part lowercased
    pub email: String,

    /// One-way password hash. Never serialized out.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name (may be empty)
    pub name: String,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Whether the account has staff access
    pub is_staff: bool,

    /// Whether the account has every permission
    pub is_superuser: bool,

    /// Account creation timestamp
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether the stored hash is a real password hash
    pub fn has_usable_password(&self) -> bool {
        !self.password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
    }
}

/// Fields for inserting a new account
///
/// The email is expected to be normalized and the password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Normalized email address
    pub email: String,
    /// Password hash, or an unusable marker
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// Staff flag
    pub is_staff: bool,
    /// Superuser flag
    pub is_superuser: bool,
}

/// Partial update of profile fields
///
/// `None` leaves the column unchanged. Passwords are not part of this path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// New email address
    pub email: Option<String>,
    /// New display name
    pub name: Option<String>,
}

impl UserChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none()
    }
}
