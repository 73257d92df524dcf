//! Reference data: directorates, organizations, documents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(REFERENCE_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS documents CASCADE;
             DROP TABLE IF EXISTS organizations CASCADE;
             DROP TABLE IF EXISTS directorates CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const REFERENCE_SQL: &str = r"
CREATE TABLE directorates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE,
    directorate_id UUID REFERENCES directorates(id) ON DELETE SET NULL,
    organization_head VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_organizations_directorate ON organizations(directorate_id);

CREATE TABLE documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    report_type VARCHAR(255) NOT NULL,
    directorate_id UUID NOT NULL REFERENCES directorates(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_documents_type_per_directorate UNIQUE (directorate_id, report_type)
);
";
