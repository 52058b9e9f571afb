use super::user;
use sea_orm::entity::prelude::*;

/// Currency assigned to an account when the caller does not name one.
pub const DEFAULT_CURRENCY: &str = "VND";

/// A named financial account, optionally owned by a user.
///
/// `user_id` is a weak reference: deleting the owner does not cascade, and an
/// account without an owner is a system account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Unique per owner among accounts that are not soft-deleted.
    pub name: String,
    /// Free-text classification such as "bank" or "cash".
    #[sea_orm(column_name = "type")]
    pub account_type: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance: Decimal,
    pub currency: String,
    #[sea_orm(default_value = "false")]
    pub is_deleted: bool,
    pub created_at: DateTimeUtc,
    pub created_by: Option<String>,
    pub updated_at: DateTimeUtc,
    pub updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An account belongs to at most one owner.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
