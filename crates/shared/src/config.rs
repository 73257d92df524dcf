//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Report document storage.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Optional authorization features.
    #[serde(default)]
    pub features: FeatureFlags,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Re-resolve authorities from the database on every request instead of
    /// trusting the snapshot embedded in the token.
    #[serde(default)]
    pub refresh_authorities_per_request: bool,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Storage configuration for uploaded report documents.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root directory for stored documents.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_storage_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    25 * 1024 * 1024
}

/// Authorization features that can be switched per deployment.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureFlags {
    /// Allow privileges to be granted directly to users.
    #[serde(default = "default_true")]
    pub user_privilege_overrides: bool,
    /// Allow role privileges to be switched off without removing them.
    #[serde(default = "default_true")]
    pub role_privilege_toggle: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            user_privilege_overrides: true,
            role_privilege_toggle: true,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ARMAS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(source: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/armas"

            [jwt]
            secret = "s3cret"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert_eq!(config.jwt.access_token_expiry_secs, 3600);
        assert!(!config.jwt.refresh_authorities_per_request);
        assert_eq!(config.storage.root, "./uploads");
        assert!(config.features.user_privilege_overrides);
        assert!(config.features.role_privilege_toggle);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_features_can_be_disabled() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/armas"

            [jwt]
            secret = "s3cret"
            refresh_authorities_per_request = true

            [features]
            user_privilege_overrides = false
            "#,
        );

        assert!(!config.features.user_privilege_overrides);
        assert!(config.features.role_privilege_toggle);
        assert!(config.jwt.refresh_authorities_per_request);
    }

    #[test]
    fn test_load_reads_prefixed_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("config-test")),
                ("ARMAS__DATABASE__URL", Some("postgres://env-host/armas")),
                ("ARMAS__JWT__SECRET", Some("from-env")),
                ("ARMAS__FEATURES__ROLE_PRIVILEGE_TOGGLE", Some("false")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://env-host/armas");
                assert_eq!(config.jwt.secret, "from-env");
                assert!(!config.features.role_privilege_toggle);
                assert!(config.features.user_privilege_overrides);
            },
        );
    }
}
