pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_user_and_account;
mod m20240601_000002_add_live_unique_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_user_and_account::Migration),
            Box::new(m20240601_000002_add_live_unique_indexes::Migration),
        ]
    }
}
