//! Workflow domain types for the report lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::access::AuthoritySet;

/// Report status in the review workflow.
///
/// The valid transitions are:
/// - Uploaded → Assigned (assign)
/// - Assigned → FindingsSubmitted (submit findings)
/// - FindingsSubmitted → Approved | Rejected (decide)
/// - Assigned → Approved | Rejected (decide, assigned approver only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Report file received, awaiting routing.
    Uploaded,
    /// Routed to a reviewer or approver.
    Assigned,
    /// Reviewer has recorded findings.
    FindingsSubmitted,
    /// Accepted (terminal).
    Approved,
    /// Refused (terminal).
    Rejected,
}

impl ReportStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Uploaded,
        Self::Assigned,
        Self::FindingsSubmitted,
        Self::Approved,
        Self::Rejected,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Assigned => "ASSIGNED",
            Self::FindingsSubmitted => "FINDINGS_SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }

    /// Parses a comma-separated status filter such as `ASSIGNED,APPROVED`.
    ///
    /// Returns the first unrecognised token on failure.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self::parse(token).ok_or_else(|| token.to_string()))
            .collect()
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The persisted facts a transition decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct ReportState {
    /// Current status.
    pub status: ReportStatus,
    /// Current assignee, if any.
    pub assigned_to: Option<Uuid>,
}

/// The authenticated user driving a transition.
#[derive(Debug, Clone)]
pub struct Actor {
    /// User id from the token.
    pub user_id: Uuid,
    /// Effective authorities.
    pub authorities: AuthoritySet,
}

/// A validated state transition with its audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Route an uploaded report.
    Assign {
        /// The user the report is routed to.
        assigned_to: Uuid,
        /// The archiver performing the routing.
        assigned_by: Uuid,
    },
    /// Record reviewer findings.
    SubmitFindings {
        /// The reviewer.
        submitted_by: Uuid,
        /// Findings text.
        remarks: String,
        /// When the findings were recorded.
        submitted_at: DateTime<Utc>,
    },
    /// Accept the report.
    Approve {
        /// The approver.
        decided_by: Uuid,
        /// Optional approver notes.
        remarks: Option<String>,
        /// When the decision was made.
        decided_at: DateTime<Utc>,
    },
    /// Refuse the report.
    Reject {
        /// The approver.
        decided_by: Uuid,
        /// Rejection reason.
        remarks: String,
        /// When the decision was made.
        decided_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ReportStatus {
        match self {
            Self::Assign { .. } => ReportStatus::Assigned,
            Self::SubmitFindings { .. } => ReportStatus::FindingsSubmitted,
            Self::Approve { .. } => ReportStatus::Approved,
            Self::Reject { .. } => ReportStatus::Rejected,
        }
    }

    /// Remarks to store with the transition, if it carries any.
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        match self {
            Self::Assign { .. } => None,
            Self::SubmitFindings { remarks, .. } | Self::Reject { remarks, .. } => Some(remarks),
            Self::Approve { remarks, .. } => remarks.as_deref(),
        }
    }

    /// Short verb used in logs and notifications.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Assign { .. } => "assigned",
            Self::SubmitFindings { .. } => "findings submitted",
            Self::Approve { .. } => "approved",
            Self::Reject { .. } => "rejected",
        }
    }
}

/// Fields required to accept a new upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Owning organization.
    pub organization_id: Option<Uuid>,
    /// Report type.
    pub document_id: Option<Uuid>,
    /// Free-form category label.
    pub report_category: Option<String>,
    /// Fiscal year label, e.g. `2024/25`.
    pub fiscal_year: Option<String>,
    /// Optional uploader remarks.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// An upload whose required fields have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Report type.
    pub document_id: Uuid,
    /// Category label, trimmed.
    pub report_category: String,
    /// Fiscal year label, trimmed.
    pub fiscal_year: String,
    /// Uploader remarks, if non-blank.
    pub remarks: Option<String>,
    /// Original filename.
    pub document_name: String,
}
