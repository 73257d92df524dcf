//! Effective authority resolution.
//!
//! A user's authorities are the union of:
//! - `ROLE_<description>` for every role the user holds
//! - every active privilege attached to those roles
//! - privileges granted directly to the user
//! - `VIEW_ORG_REPORTS` when the user heads their own organization
//!
//! Nothing is ever subtracted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use armas_shared::ROLE_PREFIX;

use super::roles::{RoleName, VIEW_ORG_REPORTS, role_authority};

/// A role held by a user, together with the privileges linked to it.
#[derive(Debug, Clone, Default)]
pub struct RoleGrant {
    /// Role description (e.g. `ARCHIVER`).
    pub role: String,
    /// Linked privileges as `(description, is_active)` pairs.
    pub privileges: Vec<(String, bool)>,
}

impl RoleGrant {
    /// Creates a grant whose privileges are all active.
    pub fn active(role: impl Into<String>, privileges: &[&str]) -> Self {
        Self {
            role: role.into(),
            privileges: privileges.iter().map(|p| ((*p).to_string(), true)).collect(),
        }
    }
}

/// Persisted facts about a user needed to compute their authorities.
#[derive(Debug, Clone, Default)]
pub struct AuthoritySources {
    /// The user's login name.
    pub username: String,
    /// Roles held by the user.
    pub roles: Vec<RoleGrant>,
    /// Privileges granted directly to the user.
    pub user_privileges: Vec<String>,
    /// `organization_head` of the user's own organization, if any.
    pub organization_head: Option<String>,
}

/// Computes the effective authority set.
///
/// `include_user_privileges` is false when per-user overrides are disabled.
#[must_use]
pub fn resolve_authorities(sources: &AuthoritySources, include_user_privileges: bool) -> AuthoritySet {
    let mut set = AuthoritySet::default();

    for grant in &sources.roles {
        set.insert(role_authority(&grant.role));
        for (privilege, active) in &grant.privileges {
            if *active {
                set.insert(privilege.clone());
            }
        }
    }

    if include_user_privileges {
        for privilege in &sources.user_privileges {
            set.insert(privilege.clone());
        }
    }

    if sources
        .organization_head
        .as_deref()
        .is_some_and(|head| head == sources.username)
    {
        set.insert(VIEW_ORG_REPORTS.to_string());
    }

    set
}

/// Deduplicated, ordered set of authority strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthoritySet(BTreeSet<String>);

impl AuthoritySet {
    /// Adds an authority.
    pub fn insert(&mut self, authority: String) -> bool {
        self.0.insert(authority)
    }

    /// Returns true if the set contains the authority verbatim.
    #[must_use]
    pub fn contains(&self, authority: &str) -> bool {
        self.0.contains(authority)
    }

    /// Returns true if the set carries `ROLE_<role>`.
    #[must_use]
    pub fn has_role(&self, role: RoleName) -> bool {
        self.0.contains(&role.authority())
    }

    /// Returns true if the set carries any of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns true if the set carries the privilege.
    #[must_use]
    pub fn has_privilege(&self, privilege: &str) -> bool {
        !privilege.starts_with(ROLE_PREFIX) && self.0.contains(privilege)
    }

    /// Built-in roles present in the set.
    #[must_use]
    pub fn roles(&self) -> Vec<RoleName> {
        self.0
            .iter()
            .filter(|a| a.starts_with(ROLE_PREFIX))
            .filter_map(|a| RoleName::parse(a))
            .collect()
    }

    /// Role descriptions (built-in and custom) with the prefix stripped.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|a| a.strip_prefix(ROLE_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Iterates over the authorities in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of authorities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the set into a vector, for embedding in a token.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl FromIterator<String> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}
