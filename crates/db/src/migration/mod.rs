//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20261019_000001_reference;
mod m20261019_000002_identity;
mod m20261019_000003_workflow;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_reference::Migration),
            Box::new(m20261019_000002_identity::Migration),
            Box::new(m20261019_000003_workflow::Migration),
        ]
    }
}
