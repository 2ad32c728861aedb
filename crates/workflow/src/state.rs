//! Ticket status checks against a governing workflow.
//!
//! All functions here are pure over `(status, ordered status list)`.
//! Membership is case-sensitive and no status is ever coerced: a move whose
//! current status is unknown to the destination fails instead of silently
//! resetting the ticket.

use crate::{StatusLabel, WorkflowError};

/// Outcome of a status-change check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// Requested status equals the current one; nothing to write.
    Unchanged,
    Changed {
        from: StatusLabel,
        to: StatusLabel,
    },
}

impl StatusChange {
    pub fn is_noop(&self) -> bool {
        matches!(self, StatusChange::Unchanged)
    }
}

/// Resolve the status of a ticket being created.
///
/// With an explicit `requested` status it must be a member of `statuses`;
/// without one the ticket starts in the first status of the workflow.
pub fn resolve_create_status(
    statuses: &[StatusLabel],
    requested: Option<&str>,
) -> Result<StatusLabel, WorkflowError> {
    match requested {
        Some(status) => find(statuses, status).cloned().ok_or_else(|| {
            WorkflowError::InvalidStatus {
                status: status.to_string(),
                allowed: statuses.to_vec(),
            }
        }),
        None => statuses
            .first()
            .cloned()
            .ok_or_else(|| WorkflowError::validation("workflow defines no statuses")),
    }
}

/// Check an explicit status change. Re-applying the current status is
/// accepted as a no-op.
pub fn validate_status_change(
    statuses: &[StatusLabel],
    current: &StatusLabel,
    requested: &str,
) -> Result<StatusChange, WorkflowError> {
    let to = find(statuses, requested)
        .cloned()
        .ok_or_else(|| WorkflowError::InvalidStatus {
            status: requested.to_string(),
            allowed: statuses.to_vec(),
        })?;

    if &to == current {
        return Ok(StatusChange::Unchanged);
    }
    Ok(StatusChange::Changed {
        from: current.clone(),
        to,
    })
}

/// Check that a ticket in `current` may move under `destination`.
///
/// Only the current status matters; the source workflow is irrelevant.
pub fn validate_move(current: &StatusLabel, destination: &[StatusLabel]) -> Result<(), WorkflowError> {
    if destination.contains(current) {
        Ok(())
    } else {
        Err(WorkflowError::IncompatibleStatus {
            status: current.clone(),
            allowed: destination.to_vec(),
        })
    }
}

fn find<'a>(statuses: &'a [StatusLabel], status: &str) -> Option<&'a StatusLabel> {
    statuses.iter().find(|s| *s == status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_statuses;
    use proptest::prelude::*;

    fn labels(raw: &[&str]) -> Vec<StatusLabel> {
        validate_statuses(raw).unwrap()
    }

    fn label(raw: &str) -> StatusLabel {
        StatusLabel::parse(raw).unwrap()
    }

    const DELIVERY: [&str; 4] = ["BACKLOG", "IN_DEV", "TESTING", "DEPLOYED"];

    #[test]
    fn omitted_status_resolves_to_first_entry() {
        let status = resolve_create_status(&labels(&DELIVERY), None).unwrap();
        assert_eq!(status.as_str(), "BACKLOG");
    }

    #[test]
    fn unknown_status_is_rejected_with_allowed_list() {
        let err = resolve_create_status(&labels(&DELIVERY), Some("TODO")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStatus { .. }));
        assert!(
            err.to_string()
                .contains("BACKLOG, IN_DEV, TESTING, DEPLOYED")
        );
    }

    #[test]
    fn membership_is_case_sensitive() {
        let err = resolve_create_status(&labels(&["TODO", "DONE"]), Some("todo")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStatus { ref status, .. } if status == "todo"));
    }

    #[test]
    fn reapplying_current_status_is_a_noop() {
        let change =
            validate_status_change(&labels(&DELIVERY), &label("IN_DEV"), "IN_DEV").unwrap();
        assert!(change.is_noop());
    }

    #[test]
    fn status_change_reports_transition() {
        let change =
            validate_status_change(&labels(&DELIVERY), &label("IN_DEV"), "TESTING").unwrap();
        assert_eq!(
            change,
            StatusChange::Changed {
                from: label("IN_DEV"),
                to: label("TESTING"),
            }
        );
    }

    #[test]
    fn move_requires_current_status_in_destination() {
        let dst = labels(&["TODO", "DONE"]);
        let err = validate_move(&label("CODE_REVIEW"), &dst).unwrap_err();
        match err {
            WorkflowError::IncompatibleStatus { status, allowed } => {
                assert_eq!(status.as_str(), "CODE_REVIEW");
                assert_eq!(allowed, dst);
            }
            other => panic!("expected IncompatibleStatus, got {other:?}"),
        }
        assert!(validate_move(&label("TODO"), &dst).is_ok());
    }

    fn label_strategy() -> impl Strategy<Value = String> {
        "[A-Z][A-Z0-9_]{0,8}"
    }

    fn workflow_strategy() -> impl Strategy<Value = Vec<StatusLabel>> {
        prop::collection::hash_set(label_strategy(), 1..8).prop_map(|set| {
            let raw: Vec<String> = set.into_iter().collect();
            validate_statuses(&raw).unwrap()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: without an explicit status, a ticket starts in the first status.
        #[test]
        fn default_status_is_first_entry(statuses in workflow_strategy()) {
            let resolved = resolve_create_status(&statuses, None).unwrap();
            prop_assert_eq!(&resolved, &statuses[0]);
        }

        /// Property: a lower-cased label is never accepted against upper-case statuses.
        #[test]
        fn lower_case_never_matches(statuses in workflow_strategy(), idx in 0usize..8) {
            let target = statuses[idx % statuses.len()].as_str().to_lowercase();
            prop_assume!(target.chars().any(|c| c.is_ascii_lowercase()));
            prop_assert!(resolve_create_status(&statuses, Some(&target)).is_err());
        }

        /// Property: moves depend only on the current status and the destination,
        /// whatever else the two workflows share.
        #[test]
        fn move_checks_only_current_status(
            source in workflow_strategy(),
            destination in workflow_strategy(),
            idx in 0usize..8,
        ) {
            let current = &source[idx % source.len()];
            let result = validate_move(current, &destination);
            prop_assert_eq!(result.is_ok(), destination.contains(current));
        }
    }
}
