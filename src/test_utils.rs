#[cfg(test)]
pub mod test_utils {
    use crate::auth::JwtService;
    use crate::handlers::auth::AuthResponse;
    use crate::router::create_router;
    use crate::schemas::{ApiResponse, AppState};
    use axum::Router;
    use axum::http::{HeaderValue, StatusCode, header};
    use axum_test::{TestRequest, TestServer};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use serde_json::json;
    use service::PasswordHasher;
    use std::time::Duration;

    /// Minimum bcrypt cost, keeps hashing fast under test
    pub const TEST_HASH_COST: u32 = 4;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        AppState::new(
            db,
            PasswordHasher::new(TEST_HASH_COST),
            JwtService::new("test-secret", 3600),
            Duration::from_secs(30),
        )
    }

    /// Route logs to the test harness. The level follows RUST_LOG, WARN otherwise.
    fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        // Another test may already have installed the subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        init_test_tracing();
        create_router(setup_test_app_state().await)
    }

    /// Test server plus a handle on its database for direct assertions
    pub async fn setup_test_server() -> (TestServer, DatabaseConnection) {
        init_test_tracing();
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let server = TestServer::new(create_router(state)).expect("Failed to start test server");
        (server, db)
    }

    /// Attaches `Authorization: Bearer <token>` to a test request
    pub trait WithBearer {
        fn bearer(self, token: &str) -> Self;
    }

    impl WithBearer for TestRequest {
        fn bearer(self, token: &str) -> Self {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value");
            self.add_header(header::AUTHORIZATION, value)
        }
    }

    /// Register through the API and return the issued token and user
    pub async fn register_user(server: &TestServer, email: &str, password: &str) -> AuthResponse {
        let response = server
            .post("/auth/register")
            .json(&json!({ "email": email, "password": password, "username": email.split('@').next() }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<AuthResponse> = response.json();
        body.data
    }
}
