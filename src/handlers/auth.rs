use crate::error::{ApiError, ApiJson};
use crate::handlers::users::UserResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::user;
use serde::{Deserialize, Serialize};
use service::NewUser;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for self-registration
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub fullname: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Issued bearer token together with the authenticated user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

fn auth_response(state: &AppState, user: user::Model) -> Result<AuthResponse, ApiError> {
    Ok(AuthResponse {
        access_token: state.jwt.issue(&user)?,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expires_in_secs(),
        user: UserResponse::from(user),
    })
}

/// Register a new user and return a token
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    request.validate()?;

    let user = state
        .users
        .create(NewUser {
            username: request.username,
            fullname: request.fullname,
            email: Some(request.email),
            password: request.password,
            created_by: None,
        })
        .await?;

    info!("Registered user {}", user.id);
    let response = ApiResponse::ok(auth_response(&state, user)?, "User registered successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request.validate()?;

    let Some(user) = state.users.find_by_email(&request.email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    };

    if !state
        .users
        .validate_password(&request.password, &user.password)
        .await
    {
        warn!("Login attempt with wrong password for user {}", user.id);
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    if !user.is_active {
        warn!("Login attempt for inactive user {}", user.id);
        return Err(ApiError::Unauthorized("User account is inactive".to_string()));
    }

    info!("User {} logged in", user.id);
    Ok(Json(ApiResponse::ok(auth_response(&state, user)?, "Login successful")))
}
