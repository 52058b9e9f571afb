//! Storage access used by the services.
//!
//! The services only talk to the [`UserStore`] and [`AccountStore`] traits. Every
//! lookup through these traits excludes soft-deleted rows, so callers never see a
//! record whose deleted flag is set. Writes take whole models; the store does not
//! assign timestamps or identifiers.
//!
//! [`DatabaseStore`] is the relational implementation used by the server and
//! [`MemoryStore`] is an in-process fake with the same uniqueness rules.

use async_trait::async_trait;
use model::entities::{account, user};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;

pub mod database;
pub mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

/// An account together with its owner, when the owner row exists.
pub type AccountWithOwner = (account::Model, Option<user::Model>);

/// Criteria for selecting live users. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub email: Option<String>,
}

impl UserFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub(crate) fn matches(&self, model: &user::Model) -> bool {
        !model.is_deleted
            && self.id.is_none_or(|id| model.id == id)
            && self
                .email
                .as_deref()
                .is_none_or(|email| model.email.as_deref() == Some(email))
    }
}

/// Criteria for selecting live accounts. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub currency: Option<String>,
}

impl AccountFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn owned_by(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    pub(crate) fn matches(&self, model: &account::Model) -> bool {
        !model.is_deleted
            && self.id.is_none_or(|id| model.id == id)
            && self.user_id.is_none_or(|user_id| model.user_id == Some(user_id))
            && self.name.as_deref().is_none_or(|name| model.name == name)
            && self
                .currency
                .as_deref()
                .is_none_or(|currency| model.currency == currency)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<user::Model>>;

    /// Matching users, newest first.
    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<user::Model>>;

    /// Fails with `Conflict` when another live user has the same email.
    async fn insert(&self, model: user::Model) -> Result<user::Model>;

    /// Overwrites the row with the model's primary key, deleted or not.
    async fn update(&self, model: user::Model) -> Result<user::Model>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<AccountWithOwner>>;

    /// Matching accounts with their owners, newest first.
    async fn find_many(&self, filter: &AccountFilter) -> Result<Vec<AccountWithOwner>>;

    /// Fails with `Conflict` when the owner already has a live account of that name.
    async fn insert(&self, model: account::Model) -> Result<account::Model>;

    /// Overwrites the row with the model's primary key, deleted or not.
    async fn update(&self, model: account::Model) -> Result<account::Model>;

    /// Sum of `balance` over the matching accounts, zero when none match.
    async fn sum_balance(&self, filter: &AccountFilter) -> Result<Decimal>;
}
