use sea_orm::entity::prelude::*;

/// A person who can log in and own accounts.
///
/// `password` only ever holds a bcrypt hash. Rows are never physically removed;
/// `is_deleted` marks a soft delete and every read path filters on it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: Option<String>,
    pub fullname: Option<String>,
    /// Unique among users that are not soft-deleted.
    pub email: Option<String>,
    pub password: String,
    #[sea_orm(default_value = "false")]
    pub is_deleted: bool,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub created_by: Option<String>,
    pub updated_at: DateTimeUtc,
    pub updated_by: Option<String>,
    #[sea_orm(default_value = "true")]
    pub is_valid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // A user can own multiple accounts.
    #[sea_orm(has_many = "super::account::Entity")]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
