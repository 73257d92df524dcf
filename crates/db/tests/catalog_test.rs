//! Integration tests for the role and privilege catalog.

mod common;

use std::collections::BTreeSet;

use armas_core::access::{DEFAULT_PRIVILEGES, RoleName};
use armas_db::CatalogRepository;
use armas_shared::AppError;

use common::{create_user, setup, unique};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_seeding_is_idempotent() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db.clone());

    let again = catalog.seed_defaults().await.expect("seed");
    assert!(again.privileges_created == 0 && again.roles_created == 0);

    let names: BTreeSet<String> = catalog
        .list_privileges()
        .await
        .expect("list")
        .into_iter()
        .map(|p| p.description)
        .collect();
    for privilege in DEFAULT_PRIVILEGES {
        assert!(names.contains(*privilege), "missing {privilege}");
    }

    for role in RoleName::ALL {
        assert!(
            catalog
                .find_role_by_description(role.as_str())
                .await
                .expect("query")
                .is_some(),
            "missing role {role}"
        );
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_role_rejects_duplicates() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db);
    let name = unique("REVIEWER");

    catalog.create_role(&name).await.expect("create");
    let err = catalog.create_role(&name).await.expect_err("duplicate");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = catalog.create_role("   ").await.expect_err("blank");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_assign_privileges_replaces_set() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db);
    let role = catalog.create_role(&unique("CUSTOM")).await.expect("create");

    let all = catalog.list_privileges().await.expect("list");
    let first: Vec<_> = all.iter().take(3).map(|p| p.id).collect();
    let second: Vec<_> = all.iter().skip(3).take(2).map(|p| p.id).collect();

    let linked = catalog
        .assign_privileges_to_role(role.id, &first)
        .await
        .expect("assign");
    assert_eq!(linked.privileges.len(), 3);

    let linked = catalog
        .assign_privileges_to_role(role.id, &second)
        .await
        .expect("replace");
    let ids: BTreeSet<_> = linked.privileges.iter().map(|(p, _)| p.id).collect();
    assert_eq!(ids, second.iter().copied().collect());
    assert!(linked.privileges.iter().all(|(_, active)| *active));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_assign_unknown_privilege_is_not_found() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db);
    let role = catalog.create_role(&unique("CUSTOM")).await.expect("create");

    let err = catalog
        .assign_privileges_to_role(role.id, &[uuid::Uuid::new_v4()])
        .await
        .expect_err("unknown privilege");
    assert!(matches!(err, AppError::NotFound(_)));

    let unchanged = catalog.role_privileges(role.id).await.expect("load");
    assert!(unchanged.privileges.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_toggle_role_privilege() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db);
    let role = catalog.create_role(&unique("CUSTOM")).await.expect("create");
    let privilege = catalog.list_privileges().await.expect("list")[0].clone();

    catalog
        .assign_privileges_to_role(role.id, &[privilege.id])
        .await
        .expect("assign");
    catalog
        .set_role_privilege_active(role.id, privilege.id, false)
        .await
        .expect("toggle off");

    let linked = catalog.role_privileges(role.id).await.expect("load");
    assert_eq!(linked.privileges.len(), 1);
    assert!(!linked.privileges[0].1);

    let other = catalog.create_role(&unique("OTHER")).await.expect("create");
    let err = catalog
        .set_role_privilege_active(other.id, privilege.id, true)
        .await
        .expect_err("not linked");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_role_assignment() {
    let db = setup().await;
    let catalog = CatalogRepository::new(db.clone());
    let user = create_user(&db, "grace", &[RoleName::User], None).await;
    let archiver = catalog
        .find_role_by_description(RoleName::Archiver.as_str())
        .await
        .expect("query")
        .expect("seeded");

    catalog
        .assign_user_roles(user.id, &[archiver.id, archiver.id])
        .await
        .expect("assign");
    catalog
        .assign_user_roles(user.id, &[archiver.id])
        .await
        .expect("assign again");
    catalog
        .unassign_user_role(user.id, archiver.id)
        .await
        .expect("unassign");

    let err = catalog
        .assign_user_roles(uuid::Uuid::new_v4(), &[archiver.id])
        .await
        .expect_err("unknown user");
    assert!(matches!(err, AppError::NotFound(_)));
}
