// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tapfolio::config::Config;
use tapfolio::db::FirestoreDb;
use tapfolio::routes::create_router;
use tapfolio::services::{CardService, IdentityService};
use tapfolio::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create the service pair against the given database.
#[allow(dead_code)]
pub fn test_services(db: &FirestoreDb) -> (IdentityService, CardService) {
    (IdentityService::new(db.clone()), CardService::new(db.clone()))
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let (identity_service, card_service) = test_services(&db);

    let state = Arc::new(AppState {
        config,
        db,
        identity_service,
        card_service,
    });

    (create_router(state.clone()), state)
}

/// Create a test session JWT signed with the given key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    tapfolio::middleware::auth::create_session_jwt(user_id, signing_key)
        .expect("Failed to create test JWT")
}

/// Generate a unique user ID for test isolation.
#[allow(dead_code)]
pub fn unique_user_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}
