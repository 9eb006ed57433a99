pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261001_000001_accounts_and_content;
mod m20261001_000002_friends_and_courses;
mod m20261001_000003_reset_nonce;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_accounts_and_content::Migration),
            Box::new(m20261001_000002_friends_and_courses::Migration),
            Box::new(m20261001_000003_reset_nonce::Migration),
        ]
    }
}
