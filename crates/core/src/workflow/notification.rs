//! Notification drafting for workflow transitions.

use serde::Serialize;
use uuid::Uuid;

use crate::workflow::types::WorkflowAction;

/// Entity type recorded on workflow notifications.
pub const MASTER_TRANSACTION_ENTITY: &str = "MASTER_TRANSACTION";

/// A notification ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDraft {
    /// Recipient.
    pub user_id: Uuid,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Kind of the referenced entity.
    pub entity_type: &'static str,
    /// Referenced entity.
    pub entity_id: Uuid,
}

impl NotificationDraft {
    /// Drafts the notification for a completed transition.
    ///
    /// Assignments go to the assignee; everything else goes to the uploader.
    #[must_use]
    pub fn for_action(
        action: &WorkflowAction,
        transaction_id: Uuid,
        document_name: &str,
        uploaded_by: Uuid,
    ) -> Self {
        let (user_id, title, message) = match action {
            WorkflowAction::Assign { assigned_to, .. } => (
                *assigned_to,
                "Report assigned",
                format!("Report '{document_name}' has been assigned to you for review."),
            ),
            WorkflowAction::SubmitFindings { .. } => (
                uploaded_by,
                "Findings submitted",
                format!("Audit findings were submitted for your report '{document_name}'."),
            ),
            WorkflowAction::Approve { .. } => (
                uploaded_by,
                "Report approved",
                format!("Your report '{document_name}' was approved."),
            ),
            WorkflowAction::Reject { remarks, .. } => (
                uploaded_by,
                "Report rejected",
                format!("Your report '{document_name}' was rejected: {remarks}"),
            ),
        };

        Self {
            user_id,
            title: title.to_string(),
            message,
            entity_type: MASTER_TRANSACTION_ENTITY,
            entity_id: transaction_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_assign_notifies_assignee() {
        let assignee = Uuid::new_v4();
        let uploader = Uuid::new_v4();
        let txn = Uuid::new_v4();
        let action = WorkflowAction::Assign {
            assigned_to: assignee,
            assigned_by: Uuid::new_v4(),
        };

        let draft = NotificationDraft::for_action(&action, txn, "q1.pdf", uploader);

        assert_eq!(draft.user_id, assignee);
        assert_eq!(draft.entity_id, txn);
        assert_eq!(draft.entity_type, MASTER_TRANSACTION_ENTITY);
        assert!(draft.message.contains("q1.pdf"));
    }

    #[test]
    fn test_decisions_notify_uploader() {
        let uploader = Uuid::new_v4();
        let reject = WorkflowAction::Reject {
            decided_by: Uuid::new_v4(),
            remarks: "missing signatures".into(),
            decided_at: Utc::now(),
        };

        let draft = NotificationDraft::for_action(&reject, Uuid::new_v4(), "q1.pdf", uploader);

        assert_eq!(draft.user_id, uploader);
        assert_eq!(draft.title, "Report rejected");
        assert!(draft.message.ends_with("missing signatures"));
    }
}
