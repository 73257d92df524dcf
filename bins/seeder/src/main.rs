//! Database seeder for ARMAS development and testing.
//!
//! Ensures the default role/privilege catalog and an administrator account.
//!
//! Usage: cargo run --bin seeder
//!
//! The administrator is taken from `ARMAS_SEED_ADMIN_USERNAME` (default
//! `administrator`) and `ARMAS_SEED_ADMIN_PASSWORD`. Without a password the
//! account is not created.

use std::env;

use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use armas_core::access::RoleName;
use armas_core::auth::{hash_password, validate_new_password};
use armas_db::repositories::NewUser;
use armas_db::{CatalogRepository, UserRepository, connect};
use armas_shared::AppConfig;

const DEFAULT_ADMIN_USERNAME: &str = "administrator";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .init();

    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => AppConfig::load()?.database.url,
    };

    info!("Connecting to database...");
    let db = connect(&database_url).await?;

    let report = CatalogRepository::new(db.clone()).seed_defaults().await?;
    info!(
        privileges_created = report.privileges_created,
        roles_created = report.roles_created,
        "Seeded role catalog"
    );

    seed_admin(&db).await?;

    info!("Seeding complete");
    Ok(())
}

/// Creates the administrator account unless it already exists.
async fn seed_admin(db: &DatabaseConnection) -> anyhow::Result<()> {
    let username =
        env::var("ARMAS_SEED_ADMIN_USERNAME").unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.into());
    let Ok(password) = env::var("ARMAS_SEED_ADMIN_PASSWORD") else {
        warn!("ARMAS_SEED_ADMIN_PASSWORD not set, skipping administrator account");
        return Ok(());
    };
    validate_new_password(&password)?;

    let users = UserRepository::new(db.clone());
    if users.username_exists(&username).await? {
        info!(%username, "Administrator already exists, skipping");
        return Ok(());
    }

    let Some(admin_role) = CatalogRepository::new(db.clone())
        .find_role_by_description(RoleName::Admin.as_str())
        .await?
    else {
        anyhow::bail!("{} role missing after seeding", RoleName::Admin.as_str());
    };

    let user = users
        .create(
            NewUser {
                username: username.clone(),
                password_hash: hash_password(&password)?,
                full_name: Some("Administrator".to_string()),
                email: None,
                organization_id: None,
                directorate_id: None,
            },
            &[admin_role.id],
        )
        .await?;

    info!(%username, user_id = %user.id, "Created administrator");
    Ok(())
}
