//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{Operator, services};
use uuid::Uuid;

use super::config::StorageConfig;
use super::error::StorageError;

/// Storage service for uploaded report files.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let root = config
            .root
            .to_str()
            .ok_or_else(|| StorageError::configuration("invalid path"))?;

        let operator = Operator::new(services::Fs::default().root(root))
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self { operator, config })
    }

    /// Rejects files larger than the configured limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::FileTooLarge` when `size` exceeds the limit.
    pub fn validate_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        Ok(())
    }

    /// Generate storage key for a report file.
    ///
    /// Format: `{organization_id}/{transaction_id}/{sanitized_filename}`
    #[must_use]
    pub fn storage_key(organization_id: Uuid, transaction_id: Uuid, filename: &str) -> String {
        format!(
            "{organization_id}/{transaction_id}/{}",
            sanitize_filename(filename)
        )
    }

    /// Writes a file under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size check or the write fails.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.validate_size(data.len() as u64)?;
        self.operator.write(key, data).await?;
        Ok(())
    }

    /// Reads a stored file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_vec())
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Maximum accepted file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
/// A name that sanitizes to nothing but dots becomes `file`.
fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        sanitized
    }
}
