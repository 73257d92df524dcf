//! Role and privilege catalog: seeding, role-privilege links, and
//! per-user role and privilege grants.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use armas_core::access::SeedPlan;
use armas_shared::{AppError, AppResult};

use super::db_error;
use crate::entities::{
    privileges, role_privileges, roles, user_privilege_assignments, user_roles, users,
};

/// Rows inserted by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Privileges inserted.
    pub privileges_created: usize,
    /// Roles inserted.
    pub roles_created: usize,
}

/// A role with its linked privileges and their active flags.
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPrivileges {
    /// The role.
    pub role: roles::Model,
    /// Linked privileges as `(privilege, is_active)`.
    pub privileges: Vec<(privileges::Model, bool)>,
}

/// Catalog repository.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts missing default privileges and roles.
    ///
    /// Roles that already exist keep their current privilege links. Running
    /// this twice inserts nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn seed_defaults(&self) -> Result<SeedReport, DbErr> {
        let txn = self.db.begin().await?;

        let existing_privileges: Vec<privileges::Model> =
            privileges::Entity::find().all(&txn).await?;
        let existing_roles: Vec<String> = roles::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.description)
            .collect();

        let plan = SeedPlan::compute(
            &existing_privileges
                .iter()
                .map(|p| p.description.clone())
                .collect::<Vec<_>>(),
            &existing_roles,
        );

        if plan.is_empty() {
            txn.commit().await?;
            return Ok(SeedReport::default());
        }

        let now = Utc::now().into();
        let mut privilege_ids: HashMap<String, Uuid> = existing_privileges
            .into_iter()
            .map(|p| (p.description, p.id))
            .collect();

        for description in &plan.privileges {
            let inserted = privileges::ActiveModel {
                id: Set(Uuid::new_v4()),
                description: Set((*description).to_string()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            privilege_ids.insert(inserted.description, inserted.id);
        }

        for (role, defaults) in &plan.roles {
            let inserted = roles::ActiveModel {
                id: Set(Uuid::new_v4()),
                description: Set(role.as_str().to_string()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            for description in defaults {
                if let Some(privilege_id) = privilege_ids.get(*description) {
                    role_privileges::ActiveModel {
                        role_id: Set(inserted.id),
                        privilege_id: Set(*privilege_id),
                        is_active: Set(true),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;

        let report = SeedReport {
            privileges_created: plan.privileges.len(),
            roles_created: plan.roles.len(),
        };
        tracing::info!(
            privileges = report.privileges_created,
            roles = report.roles_created,
            "catalog seeded"
        );
        Ok(report)
    }

    /// Lists privileges ordered by description.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_privileges(&self) -> Result<Vec<privileges::Model>, DbErr> {
        privileges::Entity::find()
            .order_by_asc(privileges::Column::Description)
            .all(&self.db)
            .await
    }

    /// Lists roles with their linked privileges.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_roles(&self) -> Result<Vec<RoleWithPrivileges>, DbErr> {
        let all_roles = roles::Entity::find()
            .order_by_asc(roles::Column::Description)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(all_roles.len());
        for role in all_roles {
            let privileges = self.linked_privileges(role.id).await?;
            result.push(RoleWithPrivileges { role, privileges });
        }
        Ok(result)
    }

    /// Finds a role by its description.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_role_by_description(
        &self,
        description: &str,
    ) -> Result<Option<roles::Model>, DbErr> {
        roles::Entity::find()
            .filter(roles::Column::Description.eq(description))
            .one(&self.db)
            .await
    }

    /// Returns the privileges linked to a role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown role.
    pub async fn role_privileges(&self, role_id: Uuid) -> AppResult<RoleWithPrivileges> {
        let role = roles::Entity::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Role", role_id))?;

        let privileges = self.linked_privileges(role_id).await.map_err(db_error)?;
        Ok(RoleWithPrivileges { role, privileges })
    }

    /// Creates a custom role.
    ///
    /// # Errors
    ///
    /// * `Validation` for a blank description
    /// * `Conflict` if the description already exists
    pub async fn create_role(&self, description: &str) -> AppResult<roles::Model> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("role description is required".into()));
        }

        if self
            .find_role_by_description(description)
            .await
            .map_err(db_error)?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "role '{description}' already exists"
            )));
        }

        let role = roles::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(description.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::info!(role_id = %role.id, description = %role.description, "role created");
        Ok(role)
    }

    /// Replaces a role's privilege set.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown role or privilege id.
    pub async fn assign_privileges_to_role(
        &self,
        role_id: Uuid,
        privilege_ids: &[Uuid],
    ) -> AppResult<RoleWithPrivileges> {
        let privilege_ids = dedup(privilege_ids);
        let txn = self.db.begin().await.map_err(db_error)?;

        roles::Entity::find_by_id(role_id)
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Role", role_id))?;

        let found = privileges::Entity::find()
            .filter(privileges::Column::Id.is_in(privilege_ids.iter().copied()))
            .count(&txn)
            .await
            .map_err(db_error)?;
        if usize::try_from(found).unwrap_or(usize::MAX) != privilege_ids.len() {
            return Err(AppError::NotFound("one or more privileges not found".into()));
        }

        role_privileges::Entity::delete_many()
            .filter(role_privileges::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await
            .map_err(db_error)?;

        for privilege_id in &privilege_ids {
            role_privileges::ActiveModel {
                role_id: Set(role_id),
                privilege_id: Set(*privilege_id),
                is_active: Set(true),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;

        tracing::info!(%role_id, count = privilege_ids.len(), "role privileges replaced");
        self.role_privileges(role_id).await
    }

    /// Switches a role-privilege link on or off without removing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the role is not linked to the privilege.
    pub async fn set_role_privilege_active(
        &self,
        role_id: Uuid,
        privilege_id: Uuid,
        active: bool,
    ) -> AppResult<()> {
        let link = role_privileges::Entity::find_by_id((role_id, privilege_id))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Role {role_id} is not linked to privilege {privilege_id}"
                ))
            })?;

        let mut active_model: role_privileges::ActiveModel = link.into();
        active_model.is_active = Set(active);
        active_model.update(&self.db).await.map_err(db_error)?;

        tracing::info!(%role_id, %privilege_id, active, "role privilege toggled");
        Ok(())
    }

    /// Adds roles to a user. Roles already held are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or role id.
    pub async fn assign_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> AppResult<()> {
        let role_ids = dedup(role_ids);
        let txn = self.db.begin().await.map_err(db_error)?;

        ensure_user(&txn, user_id).await?;

        let found = roles::Entity::find()
            .filter(roles::Column::Id.is_in(role_ids.iter().copied()))
            .count(&txn)
            .await
            .map_err(db_error)?;
        if usize::try_from(found).unwrap_or(usize::MAX) != role_ids.len() {
            return Err(AppError::NotFound("one or more roles not found".into()));
        }

        let held: Vec<Uuid> = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|link| link.role_id)
            .collect();

        for role_id in role_ids.into_iter().filter(|id| !held.contains(id)) {
            user_roles::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(role_id),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;
        tracing::info!(%user_id, "user roles assigned");
        Ok(())
    }

    /// Removes a role from a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or role id.
    pub async fn unassign_user_role(&self, user_id: Uuid, role_id: Uuid) -> AppResult<()> {
        ensure_user(&self.db, user_id).await?;
        roles::Entity::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::not_found("Role", role_id))?;

        user_roles::Entity::delete_by_id((user_id, role_id))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(%user_id, %role_id, "user role removed");
        Ok(())
    }

    /// Grants privileges directly to a user. Existing grants are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user or privilege id.
    pub async fn assign_user_privileges(
        &self,
        user_id: Uuid,
        privilege_ids: &[Uuid],
    ) -> AppResult<()> {
        let privilege_ids = dedup(privilege_ids);
        let txn = self.db.begin().await.map_err(db_error)?;

        ensure_user(&txn, user_id).await?;

        let found = privileges::Entity::find()
            .filter(privileges::Column::Id.is_in(privilege_ids.iter().copied()))
            .count(&txn)
            .await
            .map_err(db_error)?;
        if usize::try_from(found).unwrap_or(usize::MAX) != privilege_ids.len() {
            return Err(AppError::NotFound("one or more privileges not found".into()));
        }

        let held: Vec<Uuid> = user_privilege_assignments::Entity::find()
            .filter(user_privilege_assignments::Column::UserId.eq(user_id))
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|grant| grant.privilege_id)
            .collect();

        let now = Utc::now().into();
        for privilege_id in privilege_ids.into_iter().filter(|id| !held.contains(id)) {
            user_privilege_assignments::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                privilege_id: Set(privilege_id),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;
        tracing::info!(%user_id, "user privileges granted");
        Ok(())
    }

    /// Revokes a direct privilege grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not hold the grant.
    pub async fn unassign_user_privilege(&self, user_id: Uuid, privilege_id: Uuid) -> AppResult<()> {
        let result = user_privilege_assignments::Entity::delete_many()
            .filter(user_privilege_assignments::Column::UserId.eq(user_id))
            .filter(user_privilege_assignments::Column::PrivilegeId.eq(privilege_id))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "User {user_id} has no direct grant of privilege {privilege_id}"
            )));
        }

        tracing::info!(%user_id, %privilege_id, "user privilege revoked");
        Ok(())
    }

    async fn linked_privileges(&self, role_id: Uuid) -> Result<Vec<(privileges::Model, bool)>, DbErr> {
        let links = role_privileges::Entity::find()
            .filter(role_privileges::Column::RoleId.eq(role_id))
            .find_also_related(privileges::Entity)
            .all(&self.db)
            .await?;

        let mut linked: Vec<(privileges::Model, bool)> = links
            .into_iter()
            .filter_map(|(link, privilege)| privilege.map(|p| (p, link.is_active)))
            .collect();
        linked.sort_by(|a, b| a.0.description.cmp(&b.0.description));
        Ok(linked)
    }
}

async fn ensure_user<C>(conn: &C, user_id: Uuid) -> AppResult<()>
where
    C: sea_orm::ConnectionTrait,
{
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::not_found("User", user_id))?;
    Ok(())
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
