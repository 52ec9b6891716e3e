/// Common test utilities and fixtures
use accounts_server::{api, services::AccountManager, services::AuthService, state::AppState};
use accounts_storage::Database;
use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;

/// Cheapest bcrypt cost, to keep tests fast
pub const TEST_HASH_COST: u32 = 4;

/// Create a fresh file-backed database with migrations applied
///
/// The returned `TempDir` owns the database file and must outlive the test.
pub async fn create_test_database() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to create test database");

    (db, temp_dir)
}

/// Create an account manager over a fresh database
pub async fn create_test_accounts() -> (Arc<AccountManager>, TempDir) {
    let (db, temp_dir) = create_test_database().await;
    (accounts_over(db), temp_dir)
}

/// Wrap an existing database in an account manager
pub fn accounts_over(db: Database) -> Arc<AccountManager> {
    Arc::new(AccountManager::new(
        Arc::new(db),
        AuthService::new(TEST_HASH_COST),
    ))
}

/// Create the full application router with its account manager
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AccountManager>, TempDir) {
    let (accounts, temp_dir) = create_test_accounts().await;
    let app = api::router(AppState::new(Arc::clone(&accounts)));
    (app, accounts, temp_dir)
}

/// Test user credentials
#[allow(dead_code)]
pub mod fixtures {
    pub const TEST_EMAIL: &str = "test@gmail.com";
    pub const TEST_PASSWORD: &str = "testpass123";
    pub const TEST_NAME: &str = "Test";

    pub const ADMIN_EMAIL: &str = "admin@gmail.com";
    pub const ADMIN_PASSWORD: &str = "123456";
}
