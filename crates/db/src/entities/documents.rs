//! `SeaORM` Entity for documents table (report types).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_type: String,
    pub directorate_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::directorates::Entity",
        from = "Column::DirectorateId",
        to = "super::directorates::Column::Id",
        on_delete = "Cascade"
    )]
    Directorates,
    #[sea_orm(has_many = "super::master_transactions::Entity")]
    MasterTransactions,
}

impl Related<super::directorates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Directorates.def()
    }
}

impl Related<super::master_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MasterTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
