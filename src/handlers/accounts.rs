use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiJson, ApiPath, ValidQuery};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{account, user};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{AccountPatch, NewAccount, store::AccountWithOwner};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a new account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Owner user ID, defaults to the caller
    pub user_id: Option<Uuid>,
    /// Account name, unique per owner
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Free-text classification (e.g. "cash", "bank")
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    /// Opening balance, defaults to 0
    #[validate(range(min = 0.0, max = 9_999_999_999_999.99))]
    pub balance: Option<f64>,
    /// Currency code, defaults to "VND"
    #[validate(length(min = 1, max = 10))]
    pub currency: Option<String>,
}

/// Request body for updating an account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    #[validate(range(min = 0.0, max = 9_999_999_999_999.99))]
    pub balance: Option<f64>,
    #[validate(length(min = 1, max = 10))]
    pub currency: Option<String>,
}

/// Request body for overwriting an account balance
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateBalanceRequest {
    /// New balance. Negative values are stored as given.
    pub balance: f64,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AccountsQuery {
    /// Only return accounts owned by this user
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TotalBalanceQuery {
    /// Only sum accounts in this currency
    #[validate(length(min = 1, max = 10))]
    pub currency: Option<String>,
}

/// Owner summary embedded in account responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountOwner {
    pub id: Uuid,
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
}

impl From<user::Model> for AccountOwner {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            fullname: model.fullname,
            email: model.email,
        }
    }
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<AccountOwner>,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            account_type: model.account_type,
            balance: model.balance,
            currency: model.currency,
            created_at: model.created_at,
            created_by: model.created_by,
            updated_at: model.updated_at,
            updated_by: model.updated_by,
            user: None,
        }
    }
}

impl From<AccountWithOwner> for AccountResponse {
    fn from((account, owner): AccountWithOwner) -> Self {
        Self {
            user: owner.map(AccountOwner::from),
            ..Self::from(account)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalBalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub currency: Option<String>,
}

/// JSON numbers arrive as `f64`; money is kept at two decimal places.
/// Largest magnitude a `decimal(15, 2)` balance column holds
fn max_balance() -> Decimal {
    Decimal::new(999_999_999_999_999, 2)
}

fn to_money(value: f64) -> Result<Decimal, ApiError> {
    let amount = Decimal::try_from(value)
        .map(|d| d.round_dp(2))
        .map_err(|e| {
            warn!("Rejected balance {}: {}", value, e);
            ApiError::BadRequest(format!("Invalid balance: {}", value))
        })?;
    if amount.abs() > max_balance() {
        warn!("Rejected balance {}: out of range", value);
        return Err(ApiError::BadRequest(format!("Balance out of range: {}", value)));
    }
    Ok(amount)
}

fn responses(accounts: Vec<AccountWithOwner>) -> Vec<AccountResponse> {
    accounts.into_iter().map(AccountResponse::from).collect()
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Account with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    trace!("Entering create_account function");
    request.validate()?;

    let balance = request.balance.map(to_money).transpose()?;
    let user_id = request.user_id.unwrap_or(caller.id);
    debug!("Creating account '{}' for owner {}", request.name, user_id);

    let created = state
        .accounts
        .create(NewAccount {
            user_id: Some(user_id),
            name: request.name,
            account_type: request.account_type,
            balance,
            currency: request.currency,
            created_by: Some(caller.id.to_string()),
        })
        .await?;

    info!("Account created successfully with ID: {}", created.0.id);
    let response = ApiResponse::ok(AccountResponse::from(created), "Account created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all accounts
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(AccountsQuery),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    State(state): State<AppState>,
    _caller: CurrentUser,
    ValidQuery(query): ValidQuery<AccountsQuery>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    trace!("Entering get_accounts function");

    let accounts = state.accounts.find_all(query.user_id).await?;
    info!("Successfully retrieved {} accounts", accounts.len());
    Ok(Json(ApiResponse::ok(
        responses(accounts),
        "Accounts retrieved successfully",
    )))
}

/// Get the caller's accounts
#[utoipa::path(
    get,
    path = "/accounts/my-accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_my_accounts(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = state.accounts.find_by_user_id(caller.id).await?;
    debug!("User {} owns {} accounts", caller.id, accounts.len());
    Ok(Json(ApiResponse::ok(
        responses(accounts),
        "User accounts retrieved successfully",
    )))
}

/// Get the caller's total balance
#[utoipa::path(
    get,
    path = "/accounts/total-balance",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(TotalBalanceQuery),
    responses(
        (status = 200, description = "Total balance retrieved successfully", body = ApiResponse<TotalBalanceResponse>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_total_balance(
    State(state): State<AppState>,
    caller: CurrentUser,
    ValidQuery(query): ValidQuery<TotalBalanceQuery>,
) -> Result<Json<ApiResponse<TotalBalanceResponse>>, ApiError> {
    let total_balance = state
        .accounts
        .get_total_balance(caller.id, query.currency.clone())
        .await?;

    info!("Total balance for user {}: {}", caller.id, total_balance);
    Ok(Json(ApiResponse::ok(
        TotalBalanceResponse {
            total_balance,
            currency: query.currency,
        },
        "Total balance retrieved successfully",
    )))
}

/// Get a specific account by ID
#[utoipa::path(
    get,
    path = "/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = Uuid, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    ApiPath(account_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    _caller: CurrentUser,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    trace!("Entering get_account function for account_id: {}", account_id);

    let found = state.accounts.find_one(account_id).await?;
    info!("Successfully retrieved account with ID: {}", account_id);
    Ok(Json(ApiResponse::ok(
        AccountResponse::from(found),
        "Account retrieved successfully",
    )))
}

/// Update an account
#[utoipa::path(
    patch,
    path = "/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = Uuid, Path, description = "Account ID"),
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Account with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_account(
    ApiPath(account_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    trace!("Entering update_account function for account_id: {}", account_id);
    request.validate()?;

    let patch = AccountPatch {
        user_id: request.user_id,
        name: request.name,
        account_type: request.account_type,
        balance: request.balance.map(to_money).transpose()?,
        currency: request.currency,
        updated_by: Some(caller.id.to_string()),
    };

    let updated = state.accounts.update(account_id, patch).await?;
    info!("Account with ID {} updated successfully", account_id);
    Ok(Json(ApiResponse::ok(
        AccountResponse::from(updated),
        "Account updated successfully",
    )))
}

/// Overwrite an account balance
#[utoipa::path(
    patch,
    path = "/accounts/{account_id}/balance",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = Uuid, Path, description = "Account ID"),
    ),
    request_body = UpdateBalanceRequest,
    responses(
        (status = 200, description = "Account balance updated successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_account_balance(
    ApiPath(account_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    caller: CurrentUser,
    ApiJson(request): ApiJson<UpdateBalanceRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let balance = to_money(request.balance)?;

    let updated = state
        .accounts
        .update_balance(account_id, balance, Some(caller.id.to_string()))
        .await?;
    info!("Balance of account {} set to {}", account_id, balance);
    Ok(Json(ApiResponse::ok(
        AccountResponse::from(updated),
        "Account balance updated successfully",
    )))
}

/// Soft-delete an account
#[utoipa::path(
    delete,
    path = "/accounts/{account_id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = Uuid, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    ApiPath(account_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_account function for account_id: {}", account_id);

    state.accounts.remove(account_id).await?;
    info!("Account with ID {} deleted by {}", account_id, caller.id);
    Ok(Json(ApiResponse::ok(
        format!("Account {} deleted", account_id),
        "Account deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_money_keeps_two_places() {
        assert_eq!(to_money(100.5).unwrap(), Decimal::new(10050, 2));
        assert_eq!(to_money(0.1).unwrap(), Decimal::new(10, 2));
        assert_eq!(to_money(-25.255).unwrap().scale(), 2);
    }

    #[test]
    fn test_to_money_rejects_values_beyond_column() {
        assert_eq!(to_money(-9_999_999_999_999.0).unwrap(), Decimal::new(-9_999_999_999_999, 0));
        assert!(matches!(to_money(1e20), Err(ApiError::BadRequest(_))));
        assert!(matches!(to_money(-1e15), Err(ApiError::BadRequest(_))));
        assert!(matches!(to_money(f64::NAN), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_account_response_serializes_camel_case() {
        let now = Utc::now();
        let owner_id = Uuid::new_v4();
        let account = account::Model {
            id: Uuid::new_v4(),
            user_id: Some(owner_id),
            name: "Checking".to_string(),
            account_type: Some("bank".to_string()),
            balance: Decimal::new(12345, 2),
            currency: "VND".to_string(),
            is_deleted: false,
            created_at: now,
            created_by: None,
            updated_at: now,
            updated_by: None,
        };

        let json = serde_json::to_value(AccountResponse::from((account, None))).unwrap();
        assert_eq!(json["userId"], owner_id.to_string());
        assert_eq!(json["type"], "bank");
        assert_eq!(json["balance"].as_f64(), Some(123.45));
        assert!(json.get("isDeleted").is_none());
        assert!(json.get("user").is_none());
    }
}
