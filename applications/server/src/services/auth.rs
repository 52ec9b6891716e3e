/// Authentication service - password hashing and token keys
use crate::error::{Result, ServerError};
use accounts_core::{types::UNUSABLE_PASSWORD_PREFIX, AccountError};
use rand::{distributions::Alphanumeric, Rng, RngCore};

/// Random bytes in a token key (hex-encoded to twice this length)
const TOKEN_KEY_BYTES: usize = 20;

/// bcrypt ignores everything past this many bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Random characters following the unusable-password marker
const UNUSABLE_SUFFIX_LENGTH: usize = 40;

#[derive(Debug, Clone)]
pub struct AuthService {
    hash_cost: u32,
}

impl AuthService {
    pub fn new(hash_cost: u32) -> Self {
        Self { hash_cost }
    }

    /// Hash a password using bcrypt (salted)
    ///
    /// Passwords longer than `MAX_PASSWORD_BYTES` are rejected rather than
    /// truncated.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AccountError::invalid_input(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            ))
            .into());
        }
        bcrypt::hash(password, self.hash_cost).map_err(ServerError::from)
    }

    /// Verify a password against a hash
    ///
    /// Unusable hashes never match, and neither does a password too long to
    /// have been hashed. bcrypt's comparison is constant-time.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        if hash.starts_with(UNUSABLE_PASSWORD_PREFIX) || password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(password, hash).map_err(ServerError::from)
    }

    /// A stored value that no password verifies against
    pub fn unusable_password(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(UNUSABLE_SUFFIX_LENGTH)
            .map(char::from)
            .collect();
        format!("{}{}", UNUSABLE_PASSWORD_PREFIX, suffix)
    }

    /// Generate a fresh opaque token key (40 lowercase hex characters)
    pub fn generate_token_key(&self) -> String {
        let mut bytes = [0u8; TOKEN_KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
