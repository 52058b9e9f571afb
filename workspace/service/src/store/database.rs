use async_trait::async_trait;
use model::entities::{account, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use tracing::{debug, instrument, trace, warn};

use super::{AccountFilter, AccountStore, AccountWithOwner, UserFilter, UserStore};
use crate::error::{Result, ServiceError};

/// Relational store backed by a SeaORM connection.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn user_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all().add(user::Column::IsDeleted.eq(false));
    if let Some(id) = filter.id {
        condition = condition.add(user::Column::Id.eq(id));
    }
    if let Some(email) = &filter.email {
        condition = condition.add(user::Column::Email.eq(email.as_str()));
    }
    condition
}

fn account_condition(filter: &AccountFilter) -> Condition {
    let mut condition = Condition::all().add(account::Column::IsDeleted.eq(false));
    if let Some(id) = filter.id {
        condition = condition.add(account::Column::Id.eq(id));
    }
    if let Some(user_id) = filter.user_id {
        condition = condition.add(account::Column::UserId.eq(user_id));
    }
    if let Some(name) = &filter.name {
        condition = condition.add(account::Column::Name.eq(name.as_str()));
    }
    if let Some(currency) = &filter.currency {
        condition = condition.add(account::Column::Currency.eq(currency.as_str()));
    }
    condition
}

/// Unique index violations become `Conflict`; a missing row on update becomes `NotFound`.
/// The only foreign key is `account.user_id`, so a violation means the owner is missing.
fn map_write_err(
    err: DbErr,
    on_conflict: fn() -> ServiceError,
    on_missing: fn() -> ServiceError,
) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("Unique constraint violated: {}", detail);
            return on_conflict();
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            warn!("Foreign key constraint violated: {}", detail);
            return ServiceError::user_not_found();
        }
        _ => {}
    }
    match err {
        DbErr::RecordNotUpdated => on_missing(),
        other => ServiceError::Database(other),
    }
}

#[async_trait]
impl UserStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<user::Model>> {
        trace!("Querying single user");
        let found = user::Entity::find()
            .filter(user_condition(filter))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<user::Model>> {
        let users = user::Entity::find()
            .filter(user_condition(filter))
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Retrieved {} users from database", users.len());
        Ok(users)
    }

    #[instrument(skip(self, model), fields(user_id = %model.id))]
    async fn insert(&self, model: user::Model) -> Result<user::Model> {
        user::ActiveModel::from(model)
            .reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, ServiceError::duplicate_email, ServiceError::user_not_found))
    }

    #[instrument(skip(self, model), fields(user_id = %model.id))]
    async fn update(&self, model: user::Model) -> Result<user::Model> {
        user::ActiveModel::from(model)
            .reset_all()
            .update(&self.db)
            .await
            .map_err(|e| map_write_err(e, ServiceError::duplicate_email, ServiceError::user_not_found))
    }
}

#[async_trait]
impl AccountStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<AccountWithOwner>> {
        trace!("Querying single account with owner");
        let found = account::Entity::find()
            .find_also_related(user::Entity)
            .filter(account_condition(filter))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn find_many(&self, filter: &AccountFilter) -> Result<Vec<AccountWithOwner>> {
        let accounts = account::Entity::find()
            .find_also_related(user::Entity)
            .filter(account_condition(filter))
            .order_by_desc(account::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Retrieved {} accounts from database", accounts.len());
        Ok(accounts)
    }

    #[instrument(skip(self, model), fields(account_id = %model.id))]
    async fn insert(&self, model: account::Model) -> Result<account::Model> {
        account::ActiveModel::from(model)
            .reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| {
                map_write_err(e, ServiceError::duplicate_account_name, ServiceError::account_not_found)
            })
    }

    #[instrument(skip(self, model), fields(account_id = %model.id))]
    async fn update(&self, model: account::Model) -> Result<account::Model> {
        account::ActiveModel::from(model)
            .reset_all()
            .update(&self.db)
            .await
            .map_err(|e| {
                map_write_err(e, ServiceError::duplicate_account_name, ServiceError::account_not_found)
            })
    }

    #[instrument(skip(self))]
    async fn sum_balance(&self, filter: &AccountFilter) -> Result<Decimal> {
        let total: Option<Option<Decimal>> = account::Entity::find()
            .select_only()
            .column_as(account::Column::Balance.sum(), "total")
            .filter(account_condition(filter))
            .into_tuple()
            .one(&self.db)
            .await?;

        // SUM over no rows is NULL. SQLite also hands decimals back as floats,
        // so the result is brought back to the column's two decimal places.
        let total = total.flatten().unwrap_or(Decimal::ZERO).round_dp(2);
        debug!("Aggregated balance: {}", total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use uuid::Uuid;

    async fn setup_store() -> DatabaseStore {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        DatabaseStore::new(db)
    }

    fn user_model(email: &str) -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            username: Some("tester".to_string()),
            fullname: None,
            email: Some(email.to_string()),
            password: "hash".to_string(),
            is_deleted: false,
            is_active: true,
            created_at: now,
            created_by: None,
            updated_at: now,
            updated_by: None,
            is_valid: true,
        }
    }

    fn account_model(name: &str, user_id: Option<Uuid>, balance: Decimal, currency: &str) -> account::Model {
        let now = Utc::now();
        account::Model {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            account_type: None,
            balance,
            currency: currency.to_string(),
            is_deleted: false,
            created_at: now,
            created_by: None,
            updated_at: now,
            updated_by: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_live_email_maps_to_conflict() {
        let store = setup_store().await;
        UserStore::insert(&store, user_model("a@x.com")).await.unwrap();

        let err = UserStore::insert(&store, user_model("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_owner_maps_to_not_found() {
        let store = setup_store().await;
        let err = AccountStore::insert(
            &store,
            account_model("Orphan", Some(Uuid::new_v4()), Decimal::ZERO, "VND"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "User not found"));
    }

    #[tokio::test]
    async fn test_soft_deleted_users_are_filtered() {
        let store = setup_store().await;
        let mut user = UserStore::insert(&store, user_model("gone@x.com")).await.unwrap();
        user.is_deleted = true;
        UserStore::update(&store, user.clone()).await.unwrap();

        let by_id = UserStore::find_one(&store, &UserFilter::by_id(user.id)).await.unwrap();
        assert!(by_id.is_none());
        let all = UserStore::find_many(&store, &UserFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_account_lookup_joins_owner() {
        let store = setup_store().await;
        let owner = UserStore::insert(&store, user_model("owner@x.com")).await.unwrap();
        let account = AccountStore::insert(
            &store,
            account_model("Checking", Some(owner.id), Decimal::new(1050, 2), "VND"),
        )
        .await
        .unwrap();

        let (found, found_owner) = AccountStore::find_one(&store, &AccountFilter::by_id(account.id))
            .await
            .unwrap()
            .expect("account should exist");
        assert_eq!(found.name, "Checking");
        assert_eq!(found.balance, Decimal::new(1050, 2));
        assert_eq!(found_owner.map(|u| u.id), Some(owner.id));
    }

    #[tokio::test]
    async fn test_sum_balance_skips_deleted_and_other_currencies() {
        let store = setup_store().await;
        let owner = UserStore::insert(&store, user_model("sum@x.com")).await.unwrap();

        for (name, cents, currency) in [("A", 10050, "VND"), ("B", 20025, "VND"), ("C", 500, "USD")] {
            AccountStore::insert(
                &store,
                account_model(name, Some(owner.id), Decimal::new(cents, 2), currency),
            )
            .await
            .unwrap();
        }
        let mut dropped = AccountStore::insert(
            &store,
            account_model("D", Some(owner.id), Decimal::new(99900, 2), "VND"),
        )
        .await
        .unwrap();
        dropped.is_deleted = true;
        AccountStore::update(&store, dropped).await.unwrap();

        let all = AccountStore::sum_balance(&store, &AccountFilter::owned_by(owner.id)).await.unwrap();
        assert_eq!(all, Decimal::new(30575, 2));

        let vnd = AccountStore::sum_balance(
            &store,
            &AccountFilter::owned_by(owner.id).with_currency(Some("VND".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(vnd, Decimal::new(30075, 2));

        let nobody = AccountStore::sum_balance(&store, &AccountFilter::owned_by(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(nobody, Decimal::ZERO);
    }
}
