use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user table
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_null(User::Username))
                    .col(string_null(User::Fullname))
                    .col(string_null(User::Email))
                    .col(string(User::Password))
                    .col(boolean(User::IsDeleted).default(false))
                    .col(boolean(User::IsActive).default(true))
                    .col(timestamp_with_time_zone(User::CreatedAt).default(Expr::current_timestamp()))
                    .col(string_null(User::CreatedBy))
                    .col(timestamp_with_time_zone(User::UpdatedAt).default(Expr::current_timestamp()))
                    .col(string_null(User::UpdatedBy))
                    .col(boolean(User::IsValid).default(true))
                    .to_owned(),
            )
            .await?;

        // Create account table
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(uuid_null(Account::UserId))
                    .col(string(Account::Name))
                    .col(string_null(Account::Type))
                    .col(decimal_len(Account::Balance, 15, 2).default(0))
                    .col(string(Account::Currency).default("VND"))
                    .col(boolean(Account::IsDeleted).default(false))
                    .col(timestamp_with_time_zone(Account::CreatedAt).default(Expr::current_timestamp()))
                    .col(string_null(Account::CreatedBy))
                    .col(timestamp_with_time_zone(Account::UpdatedAt).default(Expr::current_timestamp()))
                    .col(string_null(Account::UpdatedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_user")
                            .from(Account::Table, Account::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_user_id")
                    .table(Account::Table)
                    .col(Account::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Username,
    Fullname,
    Email,
    Password,
    IsDeleted,
    IsActive,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
    IsValid,
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    UserId,
    Name,
    Type,
    Balance,
    Currency,
    IsDeleted,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}
