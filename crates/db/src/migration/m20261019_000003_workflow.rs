//! Report workflow: master transactions and notifications.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WORKFLOW_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS notifications CASCADE;
             DROP TABLE IF EXISTS master_transactions CASCADE;
             DROP TYPE IF EXISTS report_status;",
        )
        .await?;
        Ok(())
    }
}

const WORKFLOW_SQL: &str = r"
CREATE TYPE report_status AS ENUM (
    'UPLOADED',
    'ASSIGNED',
    'FINDINGS_SUBMITTED',
    'APPROVED',
    'REJECTED'
);

CREATE TABLE master_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_name VARCHAR(255) NOT NULL,
    storage_path VARCHAR(1024) NOT NULL,
    report_status report_status NOT NULL DEFAULT 'UPLOADED',
    remarks TEXT,
    fiscal_year VARCHAR(20) NOT NULL,
    report_category VARCHAR(100) NOT NULL,
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE RESTRICT,
    uploaded_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
    submitted_by_auditor UUID REFERENCES users(id) ON DELETE SET NULL,
    decided_by UUID REFERENCES users(id) ON DELETE SET NULL,
    version INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_master_transactions_org ON master_transactions(organization_id, created_at DESC);
CREATE INDEX idx_master_transactions_status ON master_transactions(report_status);
CREATE INDEX idx_master_transactions_assignee ON master_transactions(assigned_to) WHERE assigned_to IS NOT NULL;
CREATE INDEX idx_master_transactions_report_type ON master_transactions(document_id, fiscal_year);

CREATE TABLE notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    entity_type VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    is_read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_notifications_user ON notifications(user_id, created_at DESC);
";
