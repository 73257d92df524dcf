//! Workflow error types for the report lifecycle.

use thiserror::Error;
use uuid::Uuid;

use armas_shared::AppError;

use crate::workflow::types::ReportStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The report is not in a status that allows the transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ReportStatus,
        /// The attempted target status.
        to: ReportStatus,
    },

    /// A required upload field is absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The uploaded file has no content.
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// The uploaded file exceeds the configured limit.
    #[error("Uploaded file exceeds {limit} bytes")]
    FileTooLarge {
        /// Configured maximum size.
        limit: u64,
    },

    /// The assignment target does not exist.
    #[error("Assignee {0} not found")]
    AssigneeNotFound(Uuid),

    /// The assignment target holds neither reviewer nor approver role.
    #[error("User {0} cannot be assigned reports")]
    InvalidAssignee(Uuid),

    /// The caller lacks the role the transition requires.
    #[error("Role {required} is required for this action")]
    InsufficientRole {
        /// The role the caller needs.
        required: &'static str,
    },

    /// The caller is not the current assignee.
    #[error("Only the current assignee may perform this action")]
    NotCurrentAssignee,

    /// Remarks are required but were not provided.
    #[error("Remarks are required")]
    RemarksRequired,

    /// Transaction not found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(Uuid),

    /// A referenced organization or document does not exist.
    #[error("{entity} {id} not found")]
    ReferenceNotFound {
        /// Kind of the missing entity.
        entity: &'static str,
        /// Missing id.
        id: Uuid,
    },

    /// The row changed between read and write.
    #[error("Transaction {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_)
            | Self::EmptyFile
            | Self::FileTooLarge { .. }
            | Self::InvalidAssignee(_)
            | Self::RemarksRequired => 400,

            Self::InsufficientRole { .. } | Self::NotCurrentAssignee => 403,

            Self::AssigneeNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::ReferenceNotFound { .. } => 404,

            Self::InvalidTransition { .. } | Self::ConcurrentModification(_) => 409,

            Self::Storage(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::AssigneeNotFound(_) => "ASSIGNEE_NOT_FOUND",
            Self::InvalidAssignee(_) => "INVALID_ASSIGNEE",
            Self::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            Self::NotCurrentAssignee => "NOT_CURRENT_ASSIGNEE",
            Self::RemarksRequired => "REMARKS_REQUIRED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::ReferenceNotFound { .. } => "NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            400 => Self::Validation(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => match err {
                WorkflowError::Database(msg) => Self::Database(msg),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: ReportStatus::Approved,
            to: ReportStatus::Assigned,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("APPROVED"));
        assert!(err.to_string().contains("ASSIGNED"));
    }

    #[rstest]
    #[case(WorkflowError::MissingField("fiscal_year"), 400)]
    #[case(WorkflowError::EmptyFile, 400)]
    #[case(WorkflowError::InvalidAssignee(Uuid::nil()), 400)]
    #[case(WorkflowError::RemarksRequired, 400)]
    #[case(WorkflowError::InsufficientRole { required: "ARCHIVER" }, 403)]
    #[case(WorkflowError::NotCurrentAssignee, 403)]
    #[case(WorkflowError::AssigneeNotFound(Uuid::nil()), 404)]
    #[case(WorkflowError::TransactionNotFound(Uuid::nil()), 404)]
    #[case(WorkflowError::ConcurrentModification(Uuid::nil()), 409)]
    #[case(WorkflowError::Storage("disk full".into()), 500)]
    fn test_status_codes(#[case] err: WorkflowError, #[case] expected: u16) {
        assert_eq!(err.status_code(), expected);
    }

    #[rstest]
    #[case(WorkflowError::RemarksRequired, "VALIDATION_ERROR")]
    #[case(WorkflowError::NotCurrentAssignee, "FORBIDDEN")]
    #[case(WorkflowError::TransactionNotFound(Uuid::nil()), "NOT_FOUND")]
    #[case(WorkflowError::ConcurrentModification(Uuid::nil()), "CONFLICT")]
    #[case(WorkflowError::Database("gone".into()), "DATABASE_ERROR")]
    #[case(WorkflowError::Storage("disk full".into()), "INTERNAL_ERROR")]
    fn test_into_app_error(#[case] err: WorkflowError, #[case] code: &str) {
        let app: AppError = err.into();
        assert_eq!(app.error_code(), code);
    }
}
