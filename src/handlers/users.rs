use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::user;
use serde::{Deserialize, Serialize};
use service::{NewUser, UserPatch};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a new user
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub fullname: Option<String>,
    /// Login email, unique among live users
    #[validate(email)]
    pub email: String,
    /// Plaintext password, at least 6 characters
    #[validate(length(min = 6))]
    pub password: String,
}

/// Request body for updating a user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub fullname: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// User response model. The password hash and deleted flag are never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            fullname: model.fullname,
            email: model.email,
            is_active: model.is_active,
            is_valid: model.is_valid,
            created_at: model.created_at,
            created_by: model.created_by,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");
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

    info!("User created successfully with ID: {}", user.id);
    let response = ApiResponse::ok(UserResponse::from(user), "User created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    _caller: CurrentUser,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    trace!("Entering get_users function");

    let users = state.users.find_all().await?;
    let user_count = users.len();
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    info!("Successfully retrieved {} users", user_count);
    Ok(Json(ApiResponse::ok(data, "Users retrieved successfully")))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.users.find_one(caller.id).await?;
    debug!("Retrieved profile for user {}", user.id);
    Ok(Json(ApiResponse::ok(
        UserResponse::from(user),
        "User profile retrieved successfully",
    )))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    ApiPath(user_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    _caller: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let user = state.users.find_one(user_id).await?;
    info!("Successfully retrieved user with ID: {}", user.id);
    Ok(Json(ApiResponse::ok(
        UserResponse::from(user),
        "User retrieved successfully",
    )))
}

/// Update a user
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user(
    ApiPath(user_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);
    request.validate()?;

    let patch = UserPatch {
        username: request.username,
        fullname: request.fullname,
        email: request.email,
        updated_by: caller.actor(),
    };
    debug!("Applying user patch: {:?}", patch);

    let user = state.users.update(user_id, patch).await?;
    info!("User with ID {} updated successfully", user_id);
    Ok(Json(ApiResponse::ok(
        UserResponse::from(user),
        "User updated successfully",
    )))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    ApiPath(user_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    state.users.remove(user_id).await?;
    info!("User with ID {} deleted by {}", user_id, caller.id);
    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "User deleted successfully",
    )))
}
