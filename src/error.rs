use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{
        FromRequest, FromRequestParts, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
};
use axum_valid::{Valid, ValidRejection};
use serde::de::DeserializeOwned;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};
use validator::{Validate, ValidationErrors};

use crate::schemas::ErrorResponse;

/// Errors surfaced by the HTTP layer. Each variant maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed")]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The message is logged and never returned to the client
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Invalid or missing credentials".to_string())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => ApiError::NotFound(message),
            ServiceError::Conflict(message) => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ApiError::Validation(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidRejection<QueryRejection>> for ApiError {
    fn from(rejection: ValidRejection<QueryRejection>) -> Self {
        match rejection {
            ValidRejection::Valid(errors) => errors.into(),
            ValidRejection::Inner(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match self {
            ApiError::Internal(message) => {
                error!("Internal error while handling request: {}", message);
                ("Internal server error".to_string(), None)
            }
            ApiError::Validation(details) => {
                warn!("Request validation failed: {:?}", details);
                ("Validation failed".to_string(), Some(details))
            }
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejections come back in the `ErrorResponse` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor with envelope-shaped rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string deserialized and checked by `validator` through `axum_valid::Valid`.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(Query(value)) = Valid::<Query<T>>::from_request_parts(parts, state).await?;
        Ok(ValidQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SignupForm {
        #[validate(length(min = 6, message = "too short"))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_service_errors_map_to_status() {
        let not_found: ApiError = ServiceError::user_not_found().into();
        assert_eq!(not_found.status_and_code().0, StatusCode::NOT_FOUND);

        let conflict: ApiError = ServiceError::duplicate_email().into();
        assert_eq!(conflict.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));

        let hashing: ApiError = ServiceError::PasswordHash("boom".to_string()).into();
        assert_eq!(hashing.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_validation_rejection_keeps_details() {
        let form = SignupForm {
            password: "abc".to_string(),
            email: "a@x.com".to_string(),
        };
        let rejection: ValidRejection<QueryRejection> =
            ValidRejection::Valid(form.validate().unwrap_err());
        let err: ApiError = rejection.into();
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
    }

    #[test]
    fn test_validation_details_are_per_field() {
        let form = SignupForm {
            password: "abc".to_string(),
            email: "not-an-email".to_string(),
        };
        let err: ApiError = form.validate().unwrap_err().into();
        let ApiError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert_eq!(details["password"], vec!["too short".to_string()]);
        assert_eq!(details["email"], vec!["email".to_string()]);
    }
}
