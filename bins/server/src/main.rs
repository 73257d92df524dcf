//! ARMAS API Server
//!
//! Main entry point for the audit report workflow service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use armas_api::{AppState, create_router};
use armas_core::storage::{StorageConfig, StorageService};
use armas_db::migration::{Migrator, MigratorTrait};
use armas_db::{CatalogRepository, connect_with_pool};
use armas_shared::config::LoggingConfig;
use armas_shared::{AppConfig, JwtConfig, JwtService};

const DEFAULT_LOG_FILTER: &str = "armas=debug,armas_api=debug,armas_db=debug,tower_http=debug";

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    // Connect to database
    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let seeded = CatalogRepository::new(db.clone()).seed_defaults().await?;
    info!(
        privileges_created = seeded.privileges_created,
        roles_created = seeded.roles_created,
        "Default catalog ensured"
    );

    let storage = StorageService::from_config(StorageConfig::from(&config.storage))?;
    info!(root = %config.storage.root, max_file_size = config.storage.max_file_size, "Report archive configured");

    anyhow::ensure!(
        config.jwt.access_token_expiry_secs > 0,
        "jwt.access_token_expiry_secs must be positive"
    );
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_secs: i64::try_from(config.jwt.access_token_expiry_secs)?,
    });

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
        features: config.features,
        refresh_authorities: config.jwt.refresh_authorities_per_request,
    };
    info!(
        user_privilege_overrides = state.features.user_privilege_overrides,
        role_privilege_toggle = state.features.role_privilege_toggle,
        refresh_authorities = state.refresh_authorities,
        "Authorization features"
    );

    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
