use async_trait::async_trait;
use model::entities::{account, user};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{AccountFilter, AccountStore, AccountWithOwner, UserFilter, UserStore};
use crate::error::{Result, ServiceError};

/// In-process store with the same filtering and uniqueness rules as the
/// database schema. Intended for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<user::Model>>,
    accounts: RwLock<Vec<account::Model>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored user, including soft-deleted ones.
    pub async fn raw_users(&self) -> Vec<user::Model> {
        self.users.read().await.clone()
    }

    /// Every stored account, including soft-deleted ones.
    pub async fn raw_accounts(&self) -> Vec<account::Model> {
        self.accounts.read().await.clone()
    }
}

fn email_taken(users: &[user::Model], candidate: &user::Model) -> bool {
    if candidate.is_deleted {
        return false;
    }
    let Some(email) = candidate.email.as_deref() else {
        return false;
    };
    users
        .iter()
        .any(|u| u.id != candidate.id && !u.is_deleted && u.email.as_deref() == Some(email))
}

fn name_taken(accounts: &[account::Model], candidate: &account::Model) -> bool {
    if candidate.is_deleted || candidate.user_id.is_none() {
        return false;
    }
    accounts.iter().any(|a| {
        a.id != candidate.id
            && !a.is_deleted
            && a.user_id == candidate.user_id
            && a.name == candidate.name
    })
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<user::Model>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| filter.matches(u)).cloned())
    }

    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<user::Model>> {
        let users = self.users.read().await;
        let mut found: Vec<_> = users.iter().filter(|u| filter.matches(u)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert(&self, model: user::Model) -> Result<user::Model> {
        let mut users = self.users.write().await;
        if email_taken(&users, &model) {
            return Err(ServiceError::duplicate_email());
        }
        users.push(model.clone());
        Ok(model)
    }

    async fn update(&self, model: user::Model) -> Result<user::Model> {
        let mut users = self.users.write().await;
        if email_taken(&users, &model) {
            return Err(ServiceError::duplicate_email());
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == model.id)
            .ok_or_else(ServiceError::user_not_found)?;
        *slot = model.clone();
        Ok(model)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<AccountWithOwner>> {
        Ok(AccountStore::find_many(self, filter).await?.into_iter().next())
    }

    async fn find_many(&self, filter: &AccountFilter) -> Result<Vec<AccountWithOwner>> {
        let accounts = self.accounts.read().await;
        let users = self.users.read().await;
        let mut found: Vec<AccountWithOwner> = accounts
            .iter()
            .filter(|a| filter.matches(a))
            .map(|a| {
                let owner = a
                    .user_id
                    .and_then(|owner_id| users.iter().find(|u| u.id == owner_id).cloned());
                (a.clone(), owner)
            })
            .collect();
        found.sort_by(|(a, _), (b, _)| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert(&self, model: account::Model) -> Result<account::Model> {
        let mut accounts = self.accounts.write().await;
        if name_taken(&accounts, &model) {
            return Err(ServiceError::duplicate_account_name());
        }
        accounts.push(model.clone());
        Ok(model)
    }

    async fn update(&self, model: account::Model) -> Result<account::Model> {
        let mut accounts = self.accounts.write().await;
        if name_taken(&accounts, &model) {
            return Err(ServiceError::duplicate_account_name());
        }
        let slot = accounts
            .iter_mut()
            .find(|a| a.id == model.id)
            .ok_or_else(ServiceError::account_not_found)?;
        *slot = model.clone();
        Ok(model)
    }

    async fn sum_balance(&self, filter: &AccountFilter) -> Result<Decimal> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .filter(|a| filter.matches(a))
            .map(|a| a.balance)
            .sum())
    }
}
