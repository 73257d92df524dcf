//! `SeaORM` entity definitions.

pub mod directorates;
pub mod documents;
pub mod master_transactions;
pub mod notifications;
pub mod organizations;
pub mod privileges;
pub mod role_privileges;
pub mod roles;
pub mod sea_orm_active_enums;
pub mod user_privilege_assignments;
pub mod user_roles;
pub mod users;
