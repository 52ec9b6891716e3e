/// Authentication token type
use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque bearer token, one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The secret key presented by clients
    pub key: String,

    /// Owner of the token
    pub user_id: UserId,

    /// When the token was first issued
    pub created: DateTime<Utc>,
}
