use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// ComplaintStatus
///
/// The lifecycle state of a complaint. The set of legal moves between states
/// is fixed by `allowed_transitions`; every mutation path in the application
/// (admin status endpoint, assignment, validation outcomes) must pass through
/// `can_transition` before writing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "complaint_status", rename_all = "snake_case")]
#[ts(export)]
pub enum ComplaintStatus {
    #[default]
    Submitted,
    UnderReview,
    Assigned,
    InProgress,
    Resolved,
    Validated,
    Rejected,
    Reopened,
}

/// All statuses, in lifecycle order. Used by table-driven tests and by the
/// admin dashboard filter chips.
pub const ALL_STATUSES: [ComplaintStatus; 8] = [
    ComplaintStatus::Submitted,
    ComplaintStatus::UnderReview,
    ComplaintStatus::Assigned,
    ComplaintStatus::InProgress,
    ComplaintStatus::Resolved,
    ComplaintStatus::Validated,
    ComplaintStatus::Rejected,
    ComplaintStatus::Reopened,
];

/// allowed_transitions
///
/// The fixed transition table. `Rejected` is terminal; every non-terminal
/// state can be rejected.
pub fn allowed_transitions(from: ComplaintStatus) -> &'static [ComplaintStatus] {
    use ComplaintStatus::*;
    match from {
        Submitted => &[UnderReview, Rejected],
        UnderReview => &[Assigned, Rejected],
        Assigned => &[InProgress, Rejected],
        InProgress => &[Resolved, Rejected],
        Resolved => &[Validated, Reopened, Rejected],
        Reopened => &[UnderReview, Rejected],
        Validated => &[Rejected],
        Rejected => &[],
    }
}

/// can_transition
///
/// True when `to` is a legal next state for a complaint currently in `from`.
pub fn can_transition(from: ComplaintStatus, to: ComplaintStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

impl ComplaintStatus {
    /// True once the complaint no longer describes a live problem. Closed
    /// complaints are skipped by the duplicate scan and accept no validations.
    pub fn is_closed(self) -> bool {
        matches!(self, ComplaintStatus::Rejected | ComplaintStatus::Validated)
    }

    /// The wire/database spelling, also used in user-facing messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::UnderReview => "under_review",
            ComplaintStatus::Assigned => "assigned",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Validated => "validated",
            ComplaintStatus::Rejected => "rejected",
            ComplaintStatus::Reopened => "reopened",
        }
    }
}
