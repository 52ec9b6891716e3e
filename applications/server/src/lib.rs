//! Accounts Server Library
//!
//! User registration, token authentication, and profile management over HTTP.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError, ValidationErrors};
pub use services::{AccountManager, AuthService, UserExtras};
pub use state::AppState;
