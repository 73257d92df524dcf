//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod authority;
pub mod catalog;
pub mod document;
pub mod notification;
pub mod organization;
pub mod user;
pub mod workflow;

pub use authority::AuthorityRepository;
pub use catalog::{CatalogRepository, RoleWithPrivileges, SeedReport};
pub use document::DocumentRepository;
pub use notification::NotificationRepository;
pub use organization::OrganizationRepository;
pub use user::{NewUser, UserRepository};
pub use workflow::{SentReport, WorkflowRepository};

use sea_orm::{DbErr, SqlErr};

use armas_shared::AppError;

/// Maps a database error into the application taxonomy.
///
/// Unique violations become `Conflict`; everything else is a database error.
pub(crate) fn db_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => AppError::Validation(detail),
        _ => AppError::Database(err.to_string()),
    }
}
