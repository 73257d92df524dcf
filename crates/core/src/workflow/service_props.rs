//! Property-based tests for WorkflowService.

use proptest::prelude::*;
use uuid::Uuid;

use crate::access::{AuthoritySet, RoleName};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{Actor, ReportState, ReportStatus};

fn arb_status() -> impl Strategy<Value = ReportStatus> {
    prop_oneof![
        Just(ReportStatus::Uploaded),
        Just(ReportStatus::Assigned),
        Just(ReportStatus::FindingsSubmitted),
        Just(ReportStatus::Approved),
        Just(ReportStatus::Rejected),
    ]
}

fn arb_role() -> impl Strategy<Value = RoleName> {
    prop_oneof![
        Just(RoleName::Admin),
        Just(RoleName::User),
        Just(RoleName::SeniorAuditor),
        Just(RoleName::Archiver),
        Just(RoleName::Approver),
    ]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_actor() -> impl Strategy<Value = Actor> {
    (arb_uuid(), prop::collection::vec(arb_role(), 0..4)).prop_map(|(user_id, roles)| Actor {
        user_id,
        authorities: roles.iter().map(RoleName::authority).collect::<AuthoritySet>(),
    })
}

fn arb_state() -> impl Strategy<Value = ReportState> {
    (arb_status(), prop::option::of(arb_uuid())).prop_map(|(status, assigned_to)| ReportState {
        status,
        assigned_to,
    })
}

fn arb_remarks() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z ]{0,40}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Only archivers ever produce an assignment.
    #[test]
    fn prop_only_archiver_assigns(
        state in arb_state(),
        actor in arb_actor(),
        target in arb_uuid(),
    ) {
        let result = WorkflowService::assign(&state, &actor, target, Some(&[RoleName::SeniorAuditor]));
        if !actor.authorities.has_role(RoleName::Archiver) {
            let is_insufficient_role = matches!(result, Err(WorkflowError::InsufficientRole { .. }));
            prop_assert!(is_insufficient_role);
        } else if state.assigned_to.is_none()
            && matches!(state.status, ReportStatus::Uploaded | ReportStatus::Assigned)
        {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err().status_code(), 409);
        }
    }

    /// Every successful action follows a listed transition.
    #[test]
    fn prop_actions_follow_lifecycle(
        state in arb_state(),
        actor in arb_actor(),
        remarks in arb_remarks(),
        target in arb_uuid(),
    ) {
        let remarks = remarks.as_deref();
        let attempts = [
            WorkflowService::assign(&state, &actor, target, Some(&[RoleName::Approver])),
            WorkflowService::submit_findings(&state, &actor, remarks),
            WorkflowService::approve(&state, &actor, remarks),
            WorkflowService::reject(&state, &actor, remarks),
        ];
        for action in attempts.into_iter().flatten() {
            prop_assert!(WorkflowService::is_valid_transition(state.status, action.new_status()));
        }
    }

    /// Every open report can be moved on by someone.
    #[test]
    fn prop_open_reports_never_stall(
        status in prop_oneof![
            Just(ReportStatus::Uploaded),
            Just(ReportStatus::Assigned),
            Just(ReportStatus::FindingsSubmitted),
        ],
        assigned_to in prop::option::of(arb_uuid()),
    ) {
        prop_assume!(status != ReportStatus::Uploaded || assigned_to.is_none());
        let state = ReportState { status, assigned_to };
        let holder = assigned_to.unwrap_or_else(Uuid::new_v4);
        let archiver = Actor {
            user_id: Uuid::new_v4(),
            authorities: [RoleName::Archiver.authority()].into_iter().collect(),
        };
        let auditor = Actor {
            user_id: holder,
            authorities: [RoleName::SeniorAuditor.authority()].into_iter().collect(),
        };
        let approver = Actor {
            user_id: holder,
            authorities: [RoleName::Approver.authority()].into_iter().collect(),
        };

        let movable = WorkflowService::assign(&state, &archiver, Uuid::new_v4(), Some(&[RoleName::Approver])).is_ok()
            || WorkflowService::submit_findings(&state, &auditor, Some("findings")).is_ok()
            || WorkflowService::approve(&state, &approver, None).is_ok();
        prop_assert!(movable);
    }

    /// Terminal reports accept no transition.
    #[test]
    fn prop_terminal_is_final(
        actor in arb_actor(),
        terminal in prop_oneof![Just(ReportStatus::Approved), Just(ReportStatus::Rejected)],
        assigned_to in prop::option::of(arb_uuid()),
    ) {
        let state = ReportState { status: terminal, assigned_to };
        prop_assert!(WorkflowService::assign(&state, &actor, Uuid::nil(), Some(&[RoleName::Approver])).is_err());
        prop_assert!(WorkflowService::submit_findings(&state, &actor, Some("x")).is_err());
        prop_assert!(WorkflowService::approve(&state, &actor, Some("x")).is_err());
        prop_assert!(WorkflowService::reject(&state, &actor, Some("x")).is_err());
    }

    /// A senior auditor who is not the assignee is always refused.
    #[test]
    fn prop_non_assignee_cannot_submit(
        status in arb_status(),
        assignee in arb_uuid(),
        actor_id in arb_uuid(),
    ) {
        prop_assume!(assignee != actor_id);
        let actor = Actor {
            user_id: actor_id,
            authorities: [RoleName::SeniorAuditor.authority()].into_iter().collect(),
        };
        let state = ReportState { status, assigned_to: Some(assignee) };
        let is_not_assignee = matches!(
            WorkflowService::submit_findings(&state, &actor, Some("findings")),
            Err(WorkflowError::NotCurrentAssignee)
        );
        prop_assert!(is_not_assignee);
    }
}
