//! Role and privilege model.
//!
//! # Modules
//!
//! - `roles` - Built-in roles and the privilege catalog
//! - `authority` - Effective authority resolution
//! - `catalog` - Idempotent seeding plan

pub mod authority;
pub mod catalog;
pub mod roles;

#[cfg(test)]
mod authority_props;

pub use authority::{AuthoritySet, AuthoritySources, RoleGrant, resolve_authorities};
pub use catalog::SeedPlan;
pub use roles::{DEFAULT_PRIVILEGES, RoleName, VIEW_ORG_REPORTS, role_authority};
