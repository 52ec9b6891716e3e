/// Shared application state
use crate::services::AccountManager;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountManager>,
}

impl AppState {
    pub fn new(accounts: Arc<AccountManager>) -> Self {
        Self { accounts }
    }
}
