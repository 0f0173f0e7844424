//! Status transitions.
//!
//! ```text
//! ASSIGNED     --start work (assignee)-->        IN_PROGRESS
//! IN_PROGRESS  --complete + notes (assignee)-->  COMPLETED
//! COMPLETED    --approve (approver)-->           APPROVED
//! non-terminal --reject / cancel (approver)-->   REJECTED | CANCELLED
//! ```
//!
//! There are no backward transitions.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{CafEvent, CafStatus, CorrectiveActionForm, EventKind};

use super::{Actor, WorkflowError};

/// A legal edge in the status graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    StartWork,
    Complete,
    Approve,
    Reject,
    Cancel,
}

impl Edge {
    /// The edge connecting two statuses, if there is one.
    pub fn between(from: CafStatus, to: CafStatus) -> Option<Self> {
        use CafStatus::{Approved, Assigned, Cancelled, Completed, InProgress, Rejected};

        match (from, to) {
            (Assigned, InProgress) => Some(Self::StartWork),
            (InProgress, Completed) => Some(Self::Complete),
            (Completed, Approved) => Some(Self::Approve),
            (from, Rejected) if !from.is_terminal() => Some(Self::Reject),
            (from, Cancelled) if !from.is_terminal() => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// An accepted status transition, ready to apply and persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: CafStatus,
    pub to: CafStatus,
    pub actor: Uuid,
    pub at: Timestamp,

    /// Trimmed, non-empty notes. Required when completing.
    pub notes: Option<String>,
}

impl StatusChange {
    /// Applies the change to an in-memory CAF, stamping the fields its target status owns.
    pub fn apply(&self, caf: &mut CorrectiveActionForm) {
        caf.status = self.to;
        caf.updated_at = self.at;
        match self.to {
            CafStatus::Completed => {
                caf.completed_at = Some(self.at);
                caf.completion_notes.clone_from(&self.notes);
            }
            CafStatus::Approved => {
                caf.approved_at = Some(self.at);
                caf.approved_by = Some(self.actor);
            }
            _ => {}
        }
    }

    /// The history entry recording this change.
    pub fn event(&self, caf_id: Uuid) -> CafEvent {
        CafEvent {
            caf_id,
            actor: self.actor,
            recorded_at: self.at,
            kind: EventKind::StatusChanged {
                from: self.from,
                to: self.to,
                notes: self.notes.clone(),
            },
        }
    }
}

/// Decide whether `actor` may move `caf` to status `to`.
///
/// Returns the change to persist, or the reason it is refused.
/// Never clamps to a different target.
pub fn change_status(
    caf: &CorrectiveActionForm,
    to: CafStatus,
    actor: &Actor,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<StatusChange, WorkflowError> {
    if !actor.in_scope(caf.organization_id) {
        return Err(WorkflowError::OutOfScope(caf.organization_id));
    }

    let edge = Edge::between(caf.status, to).ok_or(WorkflowError::Unreachable {
        from: caf.status,
        to,
    })?;

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);

    match edge {
        Edge::StartWork => {
            if !actor.is_assignee(caf) {
                return Err(WorkflowError::NotAssignee("start work"));
            }
        }
        Edge::Complete => {
            if !actor.is_assignee(caf) {
                return Err(WorkflowError::NotAssignee("complete the CAF"));
            }
            if notes.is_none() {
                return Err(WorkflowError::NotesRequired);
            }
        }
        Edge::Approve => {
            if !actor.may_approve() {
                return Err(WorkflowError::MissingCapability("approve CAFs"));
            }
            if !caf.has_completion_signature() {
                return Err(WorkflowError::CompletionSignatureMissing);
            }
        }
        Edge::Reject | Edge::Cancel => {
            if !actor.may_approve() {
                return Err(WorkflowError::MissingCapability("close CAFs"));
            }
        }
    }

    Ok(StatusChange {
        from: caf.status,
        to,
        actor: actor.staff_id,
        at: now,
        notes,
    })
}
