//! Bearer token issuing and request authentication.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub`. The [`CurrentUser`]
//! extractor verifies the token and then reloads the user, so a token stops
//! working as soon as its user is soft-deleted or deactivated.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use model::entities::user;
use serde::{Deserialize, Serialize};
use service::ServiceError;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::schemas::AppState;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_in_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_secs,
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }

    pub fn issue(&self, user: &user::Model) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expires_in_secs)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!("Failed to encode JWT for user {}: {}", user.id, e);
            ApiError::Internal(e.to_string())
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        match decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(data) => {
                debug!("Token validated for user: {}", data.claims.sub);
                Ok(data.claims)
            }
            Err(e) => {
                warn!("Rejected bearer token: {}", e);
                Err(ApiError::unauthorized())
            }
        }
    }
}

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl CurrentUser {
    /// Audit label for user mutations: email, falling back to username.
    pub fn actor(&self) -> Option<String> {
        self.email.clone().or_else(|| self.username.clone())
    }
}

impl From<user::Model> for CurrentUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    debug!("Missing or malformed Authorization header: {}", e);
                    ApiError::unauthorized()
                })?;

        let claims = state.jwt.verify(bearer.token())?;

        let user = match state.users.find_one(claims.sub).await {
            Ok(user) => user,
            Err(ServiceError::NotFound(_)) => {
                warn!("Token subject {} no longer exists", claims.sub);
                return Err(ApiError::unauthorized());
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            warn!("Inactive user {} presented a token", user.id);
            return Err(ApiError::unauthorized());
        }

        Ok(CurrentUser::from(user))
    }
}
