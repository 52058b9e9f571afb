use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use model::entities::user;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::password::PasswordHasher;
use crate::store::{UserFilter, UserStore};

/// Input for registering a user. `password` is plaintext and is hashed before storage.
#[derive(Clone, Default)]
pub struct NewUser {
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub created_by: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("created_by", &self.created_by)
            .finish()
    }
}

/// Partial update for a user. Every `Some` field overwrites the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Registers a user, rejecting an email already held by a live user.
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn create(&self, input: NewUser) -> Result<user::Model> {
        if let Some(email) = input.email.as_deref() {
            if self.store.find_one(&UserFilter::by_email(email)).await?.is_some() {
                warn!("User with email {} already exists", email);
                return Err(ServiceError::duplicate_email());
            }
        }

        let hasher = self.hasher;
        let plain = input.password;
        let password = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| ServiceError::PasswordHash(e.to_string()))??;

        let now = Utc::now();
        let model = user::Model {
            id: Uuid::new_v4(),
            username: input.username,
            fullname: input.fullname,
            email: input.email,
            password,
            is_deleted: false,
            is_active: true,
            created_at: now,
            created_by: input.created_by,
            updated_at: now,
            updated_by: None,
            is_valid: true,
        };

        let user = self.store.insert(model).await?;
        info!("User created successfully with ID: {}", user.id);
        Ok(user)
    }

    /// All live users, newest first.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<user::Model>> {
        let users = self.store.find_many(&UserFilter::default()).await?;
        debug!("Found {} live users", users.len());
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: Uuid) -> Result<user::Model> {
        match self.store.find_one(&UserFilter::by_id(id)).await? {
            Some(user) => Ok(user),
            None => {
                warn!("User with ID {} not found", id);
                Err(ServiceError::user_not_found())
            }
        }
    }

    /// Credential lookup for the login flow; absence is not an error.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        self.store.find_one(&UserFilter::by_email(email)).await
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Result<user::Model> {
        let mut user = self.find_one(id).await?;

        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(fullname) = patch.fullname {
            user.fullname = Some(fullname);
        }
        if let Some(email) = patch.email {
            user.email = Some(email);
        }
        if let Some(updated_by) = patch.updated_by {
            user.updated_by = Some(updated_by);
        }
        user.updated_at = Utc::now();

        let user = self.store.update(user).await?;
        info!("User with ID {} updated successfully", id);
        Ok(user)
    }

    /// Soft delete. Removing an already removed user fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut user = self.find_one(id).await?;
        user.is_deleted = true;
        user.updated_at = Utc::now();
        self.store.update(user).await?;
        info!("User with ID {} marked as deleted", id);
        Ok(())
    }

    /// Compares a plaintext candidate with a stored hash. Never fails.
    #[instrument(skip_all)]
    pub async fn validate_password(&self, plain: &str, hash: &str) -> bool {
        let hasher = self.hasher;
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .unwrap_or(false)
    }
}
