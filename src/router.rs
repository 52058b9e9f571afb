use crate::handlers::{
    accounts::{
        create_account, delete_account, get_account, get_accounts, get_my_accounts,
        get_total_balance, update_account, update_account_balance,
    },
    auth::{login, register},
    health::health_check,
    users::{create_user, delete_user, get_profile, get_user, get_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        // User routes
        .route("/users", post(create_user).get(get_users))
        .route("/users/profile", get(get_profile))
        .route(
            "/users/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        // Account routes
        .route("/accounts", post(create_account).get(get_accounts))
        .route("/accounts/my-accounts", get(get_my_accounts))
        .route("/accounts/total-balance", get(get_total_balance))
        .route(
            "/accounts/:account_id",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/:account_id/balance", patch(update_account_balance))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
