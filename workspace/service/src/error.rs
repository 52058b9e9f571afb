use thiserror::Error;

/// Error types for the service layer
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The record does not exist or has been soft-deleted
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule would be violated
    #[error("{0}")]
    Conflict(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from hashing a credential
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl ServiceError {
    pub fn user_not_found() -> Self {
        ServiceError::NotFound("User not found".to_string())
    }

    pub fn account_not_found() -> Self {
        ServiceError::NotFound("Account not found".to_string())
    }

    pub fn duplicate_email() -> Self {
        ServiceError::Conflict("User with this email already exists".to_string())
    }

    pub fn duplicate_account_name() -> Self {
        ServiceError::Conflict("Account with this name already exists for this user".to_string())
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
