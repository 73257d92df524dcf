//! Storage configuration types.

use std::path::PathBuf;

use armas_shared::config::StorageSettings;

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory of the report archive.
    pub root: PathBuf,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max file size: 25MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}

impl From<&StorageSettings> for StorageConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(&settings.root).with_max_file_size(settings.max_file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new("./uploads");
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.root, PathBuf::from("./uploads"));
    }

    #[test]
    fn test_from_settings() {
        let settings = StorageSettings {
            root: "/srv/armas".into(),
            max_file_size: 1024,
        };
        let config = StorageConfig::from(&settings);
        assert_eq!(config.root, PathBuf::from("/srv/armas"));
        assert_eq!(config.max_file_size, 1024);
    }
}
