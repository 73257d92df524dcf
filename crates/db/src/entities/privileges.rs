//! `SeaORM` Entity for privileges table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "privileges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_privileges::Entity")]
    RolePrivileges,
    #[sea_orm(has_many = "super::user_privilege_assignments::Entity")]
    UserPrivilegeAssignments,
}

impl Related<super::role_privileges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePrivileges.def()
    }
}

impl Related<super::user_privilege_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPrivilegeAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
