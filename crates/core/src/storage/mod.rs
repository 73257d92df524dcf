//! Report archive backed by Apache OpenDAL.
//!
//! Uploaded report files are written to a local filesystem operator under
//! keys of the form `{organization_id}/{transaction_id}/{filename}`.

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::StorageService;
