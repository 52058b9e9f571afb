use sea_orm_migration::prelude::*;

/// Uniqueness of user emails and of account names per owner only holds for rows
/// that are not soft-deleted, so both constraints are partial indexes. The
/// index builder cannot express a `WHERE` clause, hence the raw statements.
/// The syntax is shared by SQLite and PostgreSQL.
#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_LIVE_EMAIL_INDEX: &str =
    r#"CREATE UNIQUE INDEX IF NOT EXISTS "uq_user_email_live" ON "user" ("email") WHERE NOT "is_deleted""#;

const CREATE_LIVE_ACCOUNT_NAME_INDEX: &str = r#"CREATE UNIQUE INDEX IF NOT EXISTS "uq_account_name_user_live" ON "account" ("name", "user_id") WHERE NOT "is_deleted""#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CREATE_LIVE_EMAIL_INDEX).await?;
        db.execute_unprepared(CREATE_LIVE_ACCOUNT_NAME_INDEX).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(r#"DROP INDEX IF EXISTS "uq_account_name_user_live""#)
            .await?;
        db.execute_unprepared(r#"DROP INDEX IF EXISTS "uq_user_email_live""#)
            .await?;
        Ok(())
    }
}
