//! `SeaORM` Entity for organizations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub directorate_id: Option<Uuid>,
    /// Username of the organization head.
    pub organization_head: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::directorates::Entity",
        from = "Column::DirectorateId",
        to = "super::directorates::Column::Id",
        on_delete = "SetNull"
    )]
    Directorates,
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
    #[sea_orm(has_many = "super::master_transactions::Entity")]
    MasterTransactions,
}

impl Related<super::directorates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Directorates.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::master_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MasterTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
