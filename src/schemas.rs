use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::{AccountService, PasswordHasher, UserService, store::DatabaseStore};
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::auth::JwtService;
use crate::handlers::{
    accounts::{
        AccountOwner, AccountResponse, CreateAccountRequest, TotalBalanceResponse,
        UpdateAccountRequest, UpdateBalanceRequest,
    },
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    users::{CreateUserRequest, UpdateUserRequest, UserResponse},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub users: UserService,
    pub accounts: AccountService,
    pub jwt: JwtService,
    /// Applied by the router's timeout layer
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        hasher: PasswordHasher,
        jwt: JwtService,
        request_timeout: Duration,
    ) -> Self {
        let store = Arc::new(DatabaseStore::new(db.clone()));
        Self {
            db,
            users: UserService::new(store.clone(), hasher),
            accounts: AccountService::new(store),
            jwt,
            request_timeout,
        }
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Field-level validation messages
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_profile,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_my_accounts,
        crate::handlers::accounts::get_total_balance,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::update_account_balance,
        crate::handlers::accounts::delete_account,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            CreateAccountRequest,
            UpdateAccountRequest,
            UpdateBalanceRequest,
            AccountResponse,
            AccountOwner,
            TotalBalanceResponse,
            ApiResponse<UserResponse>,
            ApiResponse<AccountResponse>,
            ApiResponse<TotalBalanceResponse>,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User management endpoints"),
        (name = "accounts", description = "Account bookkeeping endpoints"),
    ),
    info(
        title = "Moneybook API",
        description = "User and account bookkeeping API with soft delete and bearer authentication",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
