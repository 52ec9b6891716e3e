//! Accounts Core
//!
//! Storage-agnostic domain types, traits, and error handling for the
//! accounts backend.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `NewUser`, `UserChanges`, `Token`
//! - **Email handling**: domain normalization and address validation
//! - **Core Traits**: `UserStore`, implemented by the storage crate
//! - **Error Handling**: Unified `AccountError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use accounts_core::email;
//!
//! assert_eq!(email::normalize("Alice@Example.COM"), "Alice@example.com");
//! assert!(email::is_valid("alice@example.com"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod email;
pub mod error;
pub mod store;
pub mod types;

pub use error::{AccountError, Result};
pub use store::UserStore;
pub use types::{NewUser, Token, User, UserChanges, UserId};
