//! `SeaORM` Entity for role_privileges join table.
//!
//! `is_active` lets a privilege be switched off for a role without
//! removing the link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "role_privileges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub privilege_id: Uuid,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_delete = "Cascade"
    )]
    Roles,
    #[sea_orm(
        belongs_to = "super::privileges::Entity",
        from = "Column::PrivilegeId",
        to = "super::privileges::Column::Id",
        on_delete = "Cascade"
    )]
    Privileges,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl Related<super::privileges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Privileges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
