//! Loads the persisted facts behind a user's authorities.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use armas_core::access::{AuthoritySet, AuthoritySources, RoleGrant, RoleName, resolve_authorities};

use crate::entities::{
    organizations, privileges, role_privileges, roles, user_privilege_assignments, user_roles,
    users,
};

/// Authority repository.
#[derive(Debug, Clone)]
pub struct AuthorityRepository {
    db: DatabaseConnection,
}

impl AuthorityRepository {
    /// Creates a new authority repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gathers roles, privileges, and organization headship for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn sources_for(&self, user: &users::Model) -> Result<AuthoritySources, DbErr> {
        let held_roles = self.roles_of(user.id).await?;

        let mut grants = Vec::with_capacity(held_roles.len());
        for role in held_roles {
            let privileges = role_privileges::Entity::find()
                .filter(role_privileges::Column::RoleId.eq(role.id))
                .find_also_related(privileges::Entity)
                .all(&self.db)
                .await?
                .into_iter()
                .filter_map(|(link, privilege)| {
                    privilege.map(|p| (p.description, link.is_active))
                })
                .collect();
            grants.push(RoleGrant {
                role: role.description,
                privileges,
            });
        }

        let user_privileges = user_privilege_assignments::Entity::find()
            .filter(user_privilege_assignments::Column::UserId.eq(user.id))
            .find_also_related(privileges::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(_, privilege)| privilege.map(|p| p.description))
            .collect();

        let organization_head = match user.organization_id {
            Some(org_id) => organizations::Entity::find_by_id(org_id)
                .one(&self.db)
                .await?
                .and_then(|org| org.organization_head),
            None => None,
        };

        Ok(AuthoritySources {
            username: user.username.clone(),
            roles: grants,
            user_privileges,
            organization_head,
        })
    }

    /// Resolves the effective authorities of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn resolve(
        &self,
        user: &users::Model,
        include_user_privileges: bool,
    ) -> Result<AuthoritySet, DbErr> {
        let sources = self.sources_for(user).await?;
        Ok(resolve_authorities(&sources, include_user_privileges))
    }

    /// Resolves authorities by user id. `None` if the user does not exist
    /// or is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn resolve_by_id(
        &self,
        user_id: Uuid,
        include_user_privileges: bool,
    ) -> Result<Option<AuthoritySet>, DbErr> {
        let Some(user) = users::Entity::find_by_id(user_id).one(&self.db).await? else {
            return Ok(None);
        };
        if !user.enabled {
            return Ok(None);
        }
        self.resolve(&user, include_user_privileges).await.map(Some)
    }

    /// Roles held by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<roles::Model>, DbErr> {
        Ok(user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .find_also_related(roles::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(_, role)| role)
            .collect())
    }

    /// Built-in roles held by a user. `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn role_names_of(&self, user_id: Uuid) -> Result<Option<Vec<RoleName>>, DbErr> {
        if users::Entity::find_by_id(user_id).one(&self.db).await?.is_none() {
            return Ok(None);
        }
        let names = self
            .roles_of(user_id)
            .await?
            .iter()
            .filter_map(|role| RoleName::parse(&role.description))
            .collect();
        Ok(Some(names))
    }
}
