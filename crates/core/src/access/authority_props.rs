//! Property-based tests for authority resolution.

use proptest::prelude::*;

use crate::access::authority::{AuthoritySources, RoleGrant, resolve_authorities};
use crate::access::roles::{VIEW_ORG_REPORTS, role_authority};

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z_]{1,16}"
}

fn arb_grant() -> impl Strategy<Value = RoleGrant> {
    (
        arb_name(),
        prop::collection::vec((arb_name(), any::<bool>()), 0..6),
    )
        .prop_map(|(role, privileges)| RoleGrant { role, privileges })
}

fn arb_sources() -> impl Strategy<Value = AuthoritySources> {
    (
        "[a-z]{1,8}",
        prop::collection::vec(arb_grant(), 0..5),
        prop::collection::vec(arb_name(), 0..5),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(
            |(username, roles, user_privileges, organization_head)| AuthoritySources {
                username,
                roles,
                user_privileges,
                organization_head,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every held role appears as ROLE_<description>.
    #[test]
    fn prop_roles_always_present(sources in arb_sources(), overrides in any::<bool>()) {
        let set = resolve_authorities(&sources, overrides);
        for grant in &sources.roles {
            prop_assert!(set.contains(&role_authority(&grant.role)));
        }
    }

    /// Enabling user overrides never removes an authority.
    #[test]
    fn prop_overrides_only_add(sources in arb_sources()) {
        let without = resolve_authorities(&sources, false);
        let with = resolve_authorities(&sources, true);
        for authority in without.iter() {
            prop_assert!(with.contains(authority));
        }
    }

    /// VIEW_ORG_REPORTS appears exactly when the user heads their organization.
    #[test]
    fn prop_org_reports_iff_head(sources in arb_sources()) {
        let set = resolve_authorities(&sources, true);
        let is_head = sources.organization_head.as_deref() == Some(sources.username.as_str());
        let granted_elsewhere = sources.user_privileges.iter().any(|p| p == VIEW_ORG_REPORTS)
            || sources.roles.iter().any(|g| {
                g.privileges.iter().any(|(p, active)| *active && p == VIEW_ORG_REPORTS)
            });
        if !granted_elsewhere {
            prop_assert_eq!(set.contains(VIEW_ORG_REPORTS), is_head);
        }
    }
}
