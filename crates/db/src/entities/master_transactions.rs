//! `SeaORM` Entity for master_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReportStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "master_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Original filename of the uploaded report.
    pub document_name: String,
    pub storage_path: String,
    pub report_status: ReportStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub fiscal_year: String,
    pub report_category: String,
    pub organization_id: Uuid,
    pub document_id: Uuid,
    pub uploaded_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub submitted_by_auditor: Option<Uuid>,
    pub decided_by: Option<Uuid>,
    /// Optimistic concurrency counter, bumped on every transition.
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_delete = "Cascade"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::documents::Entity",
        from = "Column::DocumentId",
        to = "super::documents::Column::Id",
        on_delete = "Restrict"
    )]
    Documents,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UploadedBy",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Uploader,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedTo",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Assignee,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmittedByAuditor",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Auditor,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DecidedBy",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Decider,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
