//! Workflow service for report state transitions.
//!
//! Every check that does not need the database lives here: role gates,
//! assignee checks, status preconditions and required fields. Callers load
//! the current row, ask the service for a `WorkflowAction`, and persist it.

use chrono::Utc;
use uuid::Uuid;

use crate::access::{RoleName, VIEW_ORG_REPORTS};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    Actor, ReportState, ReportStatus, UploadRequest, ValidatedUpload, WorkflowAction,
};

/// Roles allowed to browse reports across organizations.
pub const STAFF_ROLES: &[RoleName] = &[
    RoleName::Admin,
    RoleName::Archiver,
    RoleName::SeniorAuditor,
    RoleName::Approver,
];

/// Roles allowed to read the sent-reports projection.
pub const SENT_REPORT_ROLES: &[RoleName] = &[
    RoleName::Archiver,
    RoleName::SeniorAuditor,
    RoleName::Approver,
];

/// Roles a report may be assigned to.
pub const ASSIGNABLE_ROLES: &[RoleName] = &[RoleName::SeniorAuditor, RoleName::Approver];

/// Stateless service for report workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Checks an upload before anything is written.
    ///
    /// # Errors
    ///
    /// * `MissingField` for absent or blank metadata or filename
    /// * `EmptyFile` for a zero-length file
    /// * `FileTooLarge` when `size` exceeds `max_size`
    pub fn validate_upload(
        request: &UploadRequest,
        filename: Option<&str>,
        size: u64,
        max_size: u64,
    ) -> Result<ValidatedUpload, WorkflowError> {
        let organization_id = request
            .organization_id
            .ok_or(WorkflowError::MissingField("organization_id"))?;
        let document_id = request
            .document_id
            .ok_or(WorkflowError::MissingField("document_id"))?;
        let report_category = non_blank(request.report_category.as_deref())
            .ok_or(WorkflowError::MissingField("report_category"))?;
        let fiscal_year = non_blank(request.fiscal_year.as_deref())
            .ok_or(WorkflowError::MissingField("fiscal_year"))?;
        let document_name =
            non_blank(filename).ok_or(WorkflowError::MissingField("file"))?;

        if size == 0 {
            return Err(WorkflowError::EmptyFile);
        }
        if size > max_size {
            return Err(WorkflowError::FileTooLarge { limit: max_size });
        }

        Ok(ValidatedUpload {
            organization_id,
            document_id,
            report_category,
            fiscal_year,
            remarks: non_blank(request.remarks.as_deref()),
            document_name,
        })
    }

    /// Routes an unassigned report to a reviewer or approver.
    ///
    /// A report is unassigned when it is `Uploaded`, or `Assigned` after its
    /// assignee's account was deleted. `assignee_roles` is `None` when the
    /// target user does not exist.
    ///
    /// # Errors
    ///
    /// * `InsufficientRole` unless the actor is an archiver
    /// * `AssigneeNotFound` for an unknown target
    /// * `InvalidAssignee` if the target is neither reviewer nor approver
    /// * `InvalidTransition` unless the report is unassigned
    pub fn assign(
        report: &ReportState,
        actor: &Actor,
        assignee_id: Uuid,
        assignee_roles: Option<&[RoleName]>,
    ) -> Result<WorkflowAction, WorkflowError> {
        require_role(actor, RoleName::Archiver)?;

        let roles = assignee_roles.ok_or(WorkflowError::AssigneeNotFound(assignee_id))?;
        if !roles.iter().any(|role| ASSIGNABLE_ROLES.contains(role)) {
            return Err(WorkflowError::InvalidAssignee(assignee_id));
        }

        if report.assigned_to.is_some() {
            return Err(WorkflowError::InvalidTransition {
                from: report.status,
                to: ReportStatus::Assigned,
            });
        }
        require_transition(report.status, ReportStatus::Assigned)?;

        Ok(WorkflowAction::Assign {
            assigned_to: assignee_id,
            assigned_by: actor.user_id,
        })
    }

    /// Records reviewer findings on an assigned report.
    ///
    /// # Errors
    ///
    /// * `InsufficientRole` unless the actor is a senior auditor
    /// * `NotCurrentAssignee` unless the report is assigned to the actor
    /// * `InvalidTransition` unless the report is `Assigned`
    /// * `RemarksRequired` for blank remarks
    pub fn submit_findings(
        report: &ReportState,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<WorkflowAction, WorkflowError> {
        require_role(actor, RoleName::SeniorAuditor)?;

        if report.assigned_to != Some(actor.user_id) {
            return Err(WorkflowError::NotCurrentAssignee);
        }

        require_transition(report.status, ReportStatus::FindingsSubmitted)?;

        let remarks = non_blank(remarks).ok_or(WorkflowError::RemarksRequired)?;

        Ok(WorkflowAction::SubmitFindings {
            submitted_by: actor.user_id,
            remarks,
            submitted_at: Utc::now(),
        })
    }

    /// Approves a report.
    ///
    /// # Errors
    ///
    /// * `InsufficientRole` unless the actor is an approver
    /// * `InvalidTransition` unless the report is decidable by the actor
    pub fn approve(
        report: &ReportState,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<WorkflowAction, WorkflowError> {
        require_role(actor, RoleName::Approver)?;
        require_decidable(report, actor, ReportStatus::Approved)?;

        Ok(WorkflowAction::Approve {
            decided_by: actor.user_id,
            remarks: non_blank(remarks),
            decided_at: Utc::now(),
        })
    }

    /// Rejects a report.
    ///
    /// # Errors
    ///
    /// * `InsufficientRole` unless the actor is an approver
    /// * `InvalidTransition` unless the report is decidable by the actor
    /// * `RemarksRequired` for blank remarks
    pub fn reject(
        report: &ReportState,
        actor: &Actor,
        remarks: Option<&str>,
    ) -> Result<WorkflowAction, WorkflowError> {
        require_role(actor, RoleName::Approver)?;
        require_decidable(report, actor, ReportStatus::Rejected)?;

        let remarks = non_blank(remarks).ok_or(WorkflowError::RemarksRequired)?;

        Ok(WorkflowAction::Reject {
            decided_by: actor.user_id,
            remarks,
            decided_at: Utc::now(),
        })
    }

    /// Checks if a status transition is part of the lifecycle.
    ///
    /// Every guard goes through this table. `Assigned → Assigned` is the
    /// reassignment of a report whose assignee was deleted, and
    /// `Assigned → Approved | Rejected` is a direct decision by an assigned
    /// approver; the per-actor conditions live in `assign`, `approve` and
    /// `reject`.
    #[must_use]
    pub fn is_valid_transition(from: ReportStatus, to: ReportStatus) -> bool {
        matches!(
            (from, to),
            (
                ReportStatus::Uploaded | ReportStatus::Assigned,
                ReportStatus::Assigned
            ) | (ReportStatus::Assigned, ReportStatus::FindingsSubmitted)
                | (
                    ReportStatus::Assigned | ReportStatus::FindingsSubmitted,
                    ReportStatus::Approved | ReportStatus::Rejected
                )
        )
    }

    /// Returns true if the actor may read a single transaction.
    #[must_use]
    pub fn can_view(actor: &Actor, uploaded_by: Uuid, assigned_to: Option<Uuid>) -> bool {
        actor.authorities.has_any_role(STAFF_ROLES)
            || uploaded_by == actor.user_id
            || assigned_to == Some(actor.user_id)
    }

    /// Returns true if the actor may list the reports of `organization_id`.
    ///
    /// `actor_organization` is the organization the actor belongs to.
    #[must_use]
    pub fn can_view_organization(
        actor: &Actor,
        actor_organization: Option<Uuid>,
        organization_id: Uuid,
    ) -> bool {
        if actor.authorities.has_any_role(STAFF_ROLES) {
            return true;
        }
        actor_organization == Some(organization_id)
            && (actor.authorities.contains(VIEW_ORG_REPORTS)
                || actor.authorities.has_privilege("VIEW_REPORTS"))
    }
}

fn require_role(actor: &Actor, role: RoleName) -> Result<(), WorkflowError> {
    if actor.authorities.has_role(role) {
        Ok(())
    } else {
        Err(WorkflowError::InsufficientRole {
            required: role.as_str(),
        })
    }
}

fn require_transition(current: ReportStatus, target: ReportStatus) -> Result<(), WorkflowError> {
    if WorkflowService::is_valid_transition(current, target) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

fn require_decidable(
    report: &ReportState,
    actor: &Actor,
    target: ReportStatus,
) -> Result<(), WorkflowError> {
    require_transition(report.status, target)?;
    if report.status == ReportStatus::Assigned && report.assigned_to != Some(actor.user_id) {
        return Err(WorkflowError::InvalidTransition {
            from: report.status,
            to: target,
        });
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AuthoritySet;

    fn actor(roles: &[RoleName]) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            authorities: roles.iter().map(RoleName::authority).collect(),
        }
    }

    fn state(status: ReportStatus, assigned_to: Option<Uuid>) -> ReportState {
        ReportState {
            status,
            assigned_to,
        }
    }

    fn upload() -> UploadRequest {
        UploadRequest {
            organization_id: Some(Uuid::new_v4()),
            document_id: Some(Uuid::new_v4()),
            report_category: Some("Annual".into()),
            fiscal_year: Some("2024/25".into()),
            remarks: Some("   ".into()),
        }
    }

    #[test]
    fn test_validate_upload_ok() {
        let validated =
            WorkflowService::validate_upload(&upload(), Some("report.pdf"), 10, 100).unwrap();
        assert_eq!(validated.document_name, "report.pdf");
        assert_eq!(validated.fiscal_year, "2024/25");
        assert_eq!(validated.remarks, None);
    }

    #[test]
    fn test_validate_upload_missing_fields() {
        let mut request = upload();
        request.fiscal_year = Some(" ".into());
        assert!(matches!(
            WorkflowService::validate_upload(&request, Some("a.pdf"), 1, 100),
            Err(WorkflowError::MissingField("fiscal_year"))
        ));

        let mut request = upload();
        request.document_id = None;
        assert!(matches!(
            WorkflowService::validate_upload(&request, Some("a.pdf"), 1, 100),
            Err(WorkflowError::MissingField("document_id"))
        ));

        assert!(matches!(
            WorkflowService::validate_upload(&upload(), None, 1, 100),
            Err(WorkflowError::MissingField("file"))
        ));
    }

    #[test]
    fn test_validate_upload_file_size() {
        assert!(matches!(
            WorkflowService::validate_upload(&upload(), Some("a.pdf"), 0, 100),
            Err(WorkflowError::EmptyFile)
        ));
        assert!(matches!(
            WorkflowService::validate_upload(&upload(), Some("a.pdf"), 101, 100),
            Err(WorkflowError::FileTooLarge { limit: 100 })
        ));
    }

    #[test]
    fn test_archiver_assigns_uploaded_report() {
        let dan = actor(&[RoleName::Archiver]);
        let carol = Uuid::new_v4();

        let action = WorkflowService::assign(
            &state(ReportStatus::Uploaded, None),
            &dan,
            carol,
            Some(&[RoleName::SeniorAuditor]),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Assigned);
        assert!(matches!(action, WorkflowAction::Assign { assigned_to, .. } if assigned_to == carol));
    }

    #[test]
    fn test_second_assign_conflicts() {
        let dan = actor(&[RoleName::Archiver]);
        let result = WorkflowService::assign(
            &state(ReportStatus::Assigned, Some(Uuid::new_v4())),
            &dan,
            Uuid::new_v4(),
            Some(&[RoleName::Approver]),
        );
        assert_eq!(result.unwrap_err().status_code(), 409);
    }

    #[test]
    fn test_orphaned_assignment_can_be_reassigned() {
        let dan = actor(&[RoleName::Archiver]);
        let frank = Uuid::new_v4();
        let orphaned = state(ReportStatus::Assigned, None);

        let action = WorkflowService::assign(
            &orphaned,
            &dan,
            frank,
            Some(&[RoleName::SeniorAuditor]),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Assigned);
        assert!(matches!(action, WorkflowAction::Assign { assigned_to, .. } if assigned_to == frank));
    }

    #[test]
    fn test_orphaned_assignment_only_moves_by_reassignment() {
        let carol = actor(&[RoleName::SeniorAuditor]);
        let erin = actor(&[RoleName::Approver]);
        let orphaned = state(ReportStatus::Assigned, None);

        assert!(matches!(
            WorkflowService::submit_findings(&orphaned, &carol, Some("done")),
            Err(WorkflowError::NotCurrentAssignee)
        ));
        assert!(matches!(
            WorkflowService::approve(&orphaned, &erin, None),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_non_archiver_cannot_assign() {
        let erin = actor(&[RoleName::Approver, RoleName::Admin]);
        let result = WorkflowService::assign(
            &state(ReportStatus::Uploaded, None),
            &erin,
            Uuid::new_v4(),
            Some(&[RoleName::SeniorAuditor]),
        );
        assert!(matches!(result, Err(WorkflowError::InsufficientRole { .. })));
    }

    #[test]
    fn test_assign_target_checks() {
        let dan = actor(&[RoleName::Archiver]);
        let report = state(ReportStatus::Uploaded, None);
        let target = Uuid::new_v4();

        assert!(matches!(
            WorkflowService::assign(&report, &dan, target, None),
            Err(WorkflowError::AssigneeNotFound(id)) if id == target
        ));
        assert!(matches!(
            WorkflowService::assign(&report, &dan, target, Some(&[RoleName::User])),
            Err(WorkflowError::InvalidAssignee(_))
        ));
    }

    #[test]
    fn test_submit_findings_by_assignee() {
        let carol = actor(&[RoleName::SeniorAuditor]);
        let action = WorkflowService::submit_findings(
            &state(ReportStatus::Assigned, Some(carol.user_id)),
            &carol,
            Some("Two material findings"),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::FindingsSubmitted);
        assert_eq!(action.remarks(), Some("Two material findings"));
    }

    #[test]
    fn test_submit_findings_by_other_auditor_forbidden() {
        let carol = actor(&[RoleName::SeniorAuditor]);
        let result = WorkflowService::submit_findings(
            &state(ReportStatus::Assigned, Some(Uuid::new_v4())),
            &carol,
            Some("findings"),
        );
        assert!(matches!(result, Err(WorkflowError::NotCurrentAssignee)));
    }

    #[test]
    fn test_submit_findings_requires_remarks() {
        let carol = actor(&[RoleName::SeniorAuditor]);
        let result = WorkflowService::submit_findings(
            &state(ReportStatus::Assigned, Some(carol.user_id)),
            &carol,
            Some("  "),
        );
        assert!(matches!(result, Err(WorkflowError::RemarksRequired)));
    }

    #[test]
    fn test_approve_after_findings() {
        let erin = actor(&[RoleName::Approver]);
        let action = WorkflowService::approve(
            &state(ReportStatus::FindingsSubmitted, Some(Uuid::new_v4())),
            &erin,
            None,
        )
        .unwrap();
        assert_eq!(action.new_status(), ReportStatus::Approved);
    }

    #[test]
    fn test_assigned_approver_decides_directly() {
        let erin = actor(&[RoleName::Approver]);
        let report = state(ReportStatus::Assigned, Some(erin.user_id));

        assert!(WorkflowService::approve(&report, &erin, None).is_ok());

        let other = actor(&[RoleName::Approver]);
        assert!(matches!(
            WorkflowService::approve(&report, &other, None),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reject_requires_remarks() {
        let erin = actor(&[RoleName::Approver]);
        let report = state(ReportStatus::FindingsSubmitted, None);

        assert!(matches!(
            WorkflowService::reject(&report, &erin, None),
            Err(WorkflowError::RemarksRequired)
        ));
        let action = WorkflowService::reject(&report, &erin, Some("incomplete")).unwrap();
        assert_eq!(action.new_status(), ReportStatus::Rejected);
    }

    #[test]
    fn test_terminal_reports_cannot_be_decided_again() {
        let erin = actor(&[RoleName::Approver]);
        for status in [ReportStatus::Approved, ReportStatus::Rejected] {
            let report = state(status, Some(erin.user_id));
            assert!(matches!(
                WorkflowService::approve(&report, &erin, None),
                Err(WorkflowError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(WorkflowService::is_valid_transition(
            ReportStatus::Uploaded,
            ReportStatus::Assigned
        ));
        assert!(WorkflowService::is_valid_transition(
            ReportStatus::Assigned,
            ReportStatus::Rejected
        ));
        assert!(WorkflowService::is_valid_transition(
            ReportStatus::Assigned,
            ReportStatus::Assigned
        ));
        assert!(!WorkflowService::is_valid_transition(
            ReportStatus::Uploaded,
            ReportStatus::Approved
        ));
        assert!(!WorkflowService::is_valid_transition(
            ReportStatus::FindingsSubmitted,
            ReportStatus::Assigned
        ));
        assert!(!WorkflowService::is_valid_transition(
            ReportStatus::Approved,
            ReportStatus::Rejected
        ));
    }

    #[test]
    fn test_visibility_rules() {
        let uploader = actor(&[RoleName::User]);
        let stranger = actor(&[RoleName::User]);
        let archiver = actor(&[RoleName::Archiver]);

        assert!(WorkflowService::can_view(&uploader, uploader.user_id, None));
        assert!(!WorkflowService::can_view(&stranger, uploader.user_id, None));
        assert!(WorkflowService::can_view(&archiver, uploader.user_id, None));
    }

    #[test]
    fn test_organization_visibility() {
        let org = Uuid::new_v4();
        let mut head = actor(&[RoleName::User]);
        head.authorities = ["ROLE_USER", VIEW_ORG_REPORTS].into_iter().collect::<AuthoritySet>();
        let plain = actor(&[RoleName::User]);

        assert!(WorkflowService::can_view_organization(&head, Some(org), org));
        assert!(!WorkflowService::can_view_organization(&head, Some(Uuid::new_v4()), org));
        assert!(!WorkflowService::can_view_organization(&plain, Some(org), org));
        assert!(WorkflowService::can_view_organization(
            &actor(&[RoleName::Approver]),
            None,
            org
        ));
    }
}
