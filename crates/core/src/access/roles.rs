//! Built-in roles and the fixed privilege catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

use armas_shared::ROLE_PREFIX;

/// Privilege granted dynamically to the head of an organization. Never stored.
pub const VIEW_ORG_REPORTS: &str = "VIEW_ORG_REPORTS";

/// Privilege names present in every deployment.
pub const DEFAULT_PRIVILEGES: &[&str] = &[
    "VIEW_REPORTS",
    "VIEW_USERS",
    "VIEW_ORGANIZATIONS",
    "VIEW_DOCUMENTS",
    "UPLOAD_REPORTS",
    "ASSIGN_REPORTS",
    "REVIEW_REPORTS",
    "APPROVE_REPORTS",
    "MANAGE_USERS",
    "MANAGE_ROLES",
    "MANAGE_ORGANIZATIONS",
    "DELETE_REPORTS",
];

/// Built-in roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    /// Full administrative access.
    Admin,
    /// Default role for self-registered accounts.
    User,
    /// Reviews assigned reports and submits findings.
    SeniorAuditor,
    /// Receives uploads and routes them to reviewers.
    Archiver,
    /// Takes the final decision on a report.
    Approver,
}

impl RoleName {
    /// All built-in roles in seeding order.
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::User,
        Self::SeniorAuditor,
        Self::Archiver,
        Self::Approver,
    ];

    /// Returns the role description as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
            Self::SeniorAuditor => "SENIOR_AUDITOR",
            Self::Archiver => "ARCHIVER",
            Self::Approver => "APPROVER",
        }
    }

    /// Parses a stored role description. Accepts an optional `ROLE_` prefix.
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.strip_prefix(ROLE_PREFIX).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
    }

    /// Returns the authority string for this role (`ROLE_<NAME>`).
    #[must_use]
    pub fn authority(&self) -> String {
        role_authority(self.as_str())
    }

    /// Selects the default privileges for this role out of `available`.
    #[must_use]
    pub fn default_privileges<'a>(&self, available: &[&'a str]) -> Vec<&'a str> {
        available
            .iter()
            .copied()
            .filter(|privilege| match self {
                Self::Admin => true,
                Self::User => privilege.starts_with("VIEW_"),
                Self::SeniorAuditor => *privilege == "REVIEW_REPORTS",
                Self::Archiver => *privilege == "ASSIGN_REPORTS",
                Self::Approver => *privilege == "APPROVE_REPORTS",
            })
            .collect()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the authority string for any role description, built-in or custom.
#[must_use]
pub fn role_authority(description: &str) -> String {
    format!("{ROLE_PREFIX}{description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_prefix_and_case() {
        assert_eq!(RoleName::parse("ADMIN"), Some(RoleName::Admin));
        assert_eq!(RoleName::parse("ROLE_ARCHIVER"), Some(RoleName::Archiver));
        assert_eq!(RoleName::parse("senior_auditor"), Some(RoleName::SeniorAuditor));
        assert_eq!(RoleName::parse("AUDITOR"), None);
    }

    #[test]
    fn test_authority_string() {
        assert_eq!(RoleName::Approver.authority(), "ROLE_APPROVER");
        assert_eq!(role_authority("CUSTOM"), "ROLE_CUSTOM");
    }

    #[test]
    fn test_default_privilege_subsets() {
        assert_eq!(
            RoleName::Admin.default_privileges(DEFAULT_PRIVILEGES).len(),
            DEFAULT_PRIVILEGES.len()
        );
        assert_eq!(
            RoleName::User.default_privileges(DEFAULT_PRIVILEGES),
            vec![
                "VIEW_REPORTS",
                "VIEW_USERS",
                "VIEW_ORGANIZATIONS",
                "VIEW_DOCUMENTS"
            ]
        );
        assert_eq!(
            RoleName::SeniorAuditor.default_privileges(DEFAULT_PRIVILEGES),
            vec!["REVIEW_REPORTS"]
        );
        assert_eq!(
            RoleName::Archiver.default_privileges(DEFAULT_PRIVILEGES),
            vec!["ASSIGN_REPORTS"]
        );
        assert_eq!(
            RoleName::Approver.default_privileges(DEFAULT_PRIVILEGES),
            vec!["APPROVE_REPORTS"]
        );
    }

    #[test]
    fn test_org_head_privilege_not_in_catalog() {
        assert!(!DEFAULT_PRIVILEGES.contains(&VIEW_ORG_REPORTS));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for role in RoleName::ALL {
            assert_eq!(RoleName::parse(&role.to_string()), Some(role));
        }
    }
}
