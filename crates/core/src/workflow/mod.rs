//! Report workflow management.
//!
//! This module implements the report lifecycle state machine, the
//! visibility rules for reading reports, and notification drafting.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ReportStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `notification` - Notifications emitted by transitions

pub mod error;
pub mod notification;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use notification::{MASTER_TRANSACTION_ENTITY, NotificationDraft};
pub use service::{ASSIGNABLE_ROLES, SENT_REPORT_ROLES, STAFF_ROLES, WorkflowService};
pub use types::{Actor, ReportState, ReportStatus, UploadRequest, ValidatedUpload, WorkflowAction};
