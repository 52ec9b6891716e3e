/// Server services
pub mod accounts;
pub mod auth;

pub use accounts::{AccountManager, UserExtras};
pub use auth::AuthService;
