//! Catalog seeding plan.
//!
//! Computing what to insert is separated from inserting it so the
//! idempotence rules can be checked without a database.

use std::collections::HashSet;

use super::roles::{DEFAULT_PRIVILEGES, RoleName};

/// Rows missing from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedPlan {
    /// Privilege descriptions to insert.
    pub privileges: Vec<&'static str>,
    /// Roles to insert, each with the privileges to link to it.
    pub roles: Vec<(RoleName, Vec<&'static str>)>,
}

impl SeedPlan {
    /// Builds the plan from what is already stored.
    ///
    /// Roles that already exist are left alone, even if their privilege
    /// links differ from the defaults.
    #[must_use]
    pub fn compute(existing_privileges: &[String], existing_roles: &[String]) -> Self {
        let privileges_present: HashSet<&str> =
            existing_privileges.iter().map(String::as_str).collect();
        let roles_present: HashSet<&str> = existing_roles.iter().map(String::as_str).collect();

        let privileges = DEFAULT_PRIVILEGES
            .iter()
            .copied()
            .filter(|p| !privileges_present.contains(p))
            .collect();

        let roles = RoleName::ALL
            .into_iter()
            .filter(|role| !roles_present.contains(role.as_str()))
            .map(|role| (role, role.default_privileges(DEFAULT_PRIVILEGES)))
            .collect();

        Self { privileges, roles }
    }

    /// Returns true if nothing needs inserting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty() && self.roles.is_empty()
    }
}
