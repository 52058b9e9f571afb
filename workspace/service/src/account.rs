use std::sync::Arc;

use chrono::Utc;
use model::entities::account::{self, DEFAULT_CURRENCY};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::store::{AccountFilter, AccountStore, AccountWithOwner};

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub account_type: Option<String>,
    /// Defaults to zero.
    pub balance: Option<Decimal>,
    /// Defaults to [`DEFAULT_CURRENCY`].
    pub currency: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub balance: Option<Decimal>,
    pub currency: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    async fn ensure_name_free(&self, user_id: Uuid, name: &str, except: Option<Uuid>) -> Result<()> {
        let clash = self
            .store
            .find_one(&AccountFilter::owned_by(user_id).with_name(name))
            .await?;
        match clash {
            Some((existing, _)) if Some(existing.id) != except => {
                warn!("Account named {} already exists for user {}", name, user_id);
                Err(ServiceError::duplicate_account_name())
            }
            _ => Ok(()),
        }
    }

    /// Creates an account. The name check applies only when an owner is given.
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewAccount) -> Result<AccountWithOwner> {
        if let Some(user_id) = input.user_id {
            self.ensure_name_free(user_id, &input.name, None).await?;
        }

        let now = Utc::now();
        let model = account::Model {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name,
            account_type: input.account_type,
            balance: input.balance.unwrap_or(Decimal::ZERO),
            currency: input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            is_deleted: false,
            created_at: now,
            created_by: input.created_by,
            updated_at: now,
            updated_by: None,
        };

        let account = self.store.insert(model).await?;
        info!("Account created successfully with ID: {}", account.id);
        self.find_one(account.id).await
    }

    /// Live accounts with owners, newest first, optionally limited to one owner.
    #[instrument(skip(self))]
    pub async fn find_all(&self, user_id: Option<Uuid>) -> Result<Vec<AccountWithOwner>> {
        let filter = AccountFilter {
            user_id,
            ..Default::default()
        };
        let accounts = self.store.find_many(&filter).await?;
        debug!("Found {} live accounts", accounts.len());
        Ok(accounts)
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: Uuid) -> Result<AccountWithOwner> {
        match self.store.find_one(&AccountFilter::by_id(id)).await? {
            Some(found) => Ok(found),
            None => {
                warn!("Account with ID {} not found", id);
                Err(ServiceError::account_not_found())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<AccountWithOwner>> {
        self.find_all(Some(user_id)).await
    }

    /// Merges the patch. A rename is checked against the owner the account
    /// will have after the update.
    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, patch: AccountPatch) -> Result<AccountWithOwner> {
        let (mut account, _) = self.find_one(id).await?;

        if let Some(name) = patch.name.as_deref() {
            if name != account.name {
                if let Some(owner) = patch.user_id.or(account.user_id) {
                    self.ensure_name_free(owner, name, Some(id)).await?;
                }
            }
        }

        if let Some(user_id) = patch.user_id {
            account.user_id = Some(user_id);
        }
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(account_type) = patch.account_type {
            account.account_type = Some(account_type);
        }
        if let Some(balance) = patch.balance {
            account.balance = balance;
        }
        if let Some(currency) = patch.currency {
            account.currency = currency;
        }
        if let Some(updated_by) = patch.updated_by {
            account.updated_by = Some(updated_by);
        }
        account.updated_at = Utc::now();

        self.store.update(account).await?;
        info!("Account with ID {} updated successfully", id);
        self.find_one(id).await
    }

    /// Soft delete. Removing an already removed account fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let (mut account, _) = self.find_one(id).await?;
        account.is_deleted = true;
        account.updated_at = Utc::now();
        self.store.update(account).await?;
        info!("Account with ID {} marked as deleted", id);
        Ok(())
    }

    /// Overwrites the balance with `balance`. No bounds are enforced.
    #[instrument(skip(self))]
    pub async fn update_balance(
        &self,
        id: Uuid,
        balance: Decimal,
        updated_by: Option<String>,
    ) -> Result<AccountWithOwner> {
        let (mut account, _) = self.find_one(id).await?;
        let previous = account.balance;
        account.balance = balance;
        if let Some(updated_by) = updated_by {
            account.updated_by = Some(updated_by);
        }
        account.updated_at = Utc::now();

        self.store.update(account).await?;
        info!("Account {} balance changed from {} to {}", id, previous, balance);
        self.find_one(id).await
    }

    /// Sum of live balances for one owner, optionally in a single currency.
    #[instrument(skip(self))]
    pub async fn get_total_balance(&self, user_id: Uuid, currency: Option<String>) -> Result<Decimal> {
        let filter = AccountFilter::owned_by(user_id).with_currency(currency);
        let total = self.store.sum_balance(&filter).await?;
        debug!("Total balance for user {}: {}", user_id, total);
        Ok(total)
    }
}
