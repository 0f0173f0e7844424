//! Output formatting for CLI display.

use uuid::Uuid;

use crate::model::{CafEvent, CorrectiveActionForm, EventKind, Staff};
use crate::workflow::Permissions;

/// The first eight characters of an id, as printed in listings.
pub(super) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(super) fn format_caf_line(caf: &CorrectiveActionForm) -> String {
    format!(
        "{}  {}  [{}] [{}]  {}",
        short_id(caf.id),
        caf.caf_number,
        caf.status,
        caf.priority.as_str(),
        caf.title
    )
}

pub(super) fn format_staff_line(staff: &Staff) -> String {
    let mut flags = Vec::new();
    if staff.can_sign_cafs {
        flags.push("sign");
    }
    if staff.can_approve_cafs {
        flags.push("approve");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" ({})", flags.join(", "))
    };
    format!(
        "{}  [{}]  {}{flags}",
        short_id(staff.id),
        staff.user_type.as_str(),
        staff.name
    )
}

/// Format a history entry for human-readable display.
pub(super) fn format_event(event: &CafEvent) -> String {
    let what = match &event.kind {
        EventKind::Created { assigned_staff_id } => {
            format!("created, assigned to {}", short_id(*assigned_staff_id))
        }
        EventKind::StatusChanged { from, to, notes } => match notes {
            Some(notes) => format!("{from} → {to}: {notes}"),
            None => format!("{from} → {to}"),
        },
        EventKind::Signed { signature_type, .. } => {
            format!("signed ({})", signature_type.as_str())
        }
        EventKind::MaintenanceLinked {
            maintenance_issue_id,
        } => format!(
            "linked maintenance work order {}",
            short_id(*maintenance_issue_id)
        ),
    };
    format!(
        "{}  {}  {what}",
        event.recorded_at.strftime("%Y-%m-%d %H:%M:%S"),
        short_id(event.actor)
    )
}

/// The actions a set of permissions allows, or `none`.
pub(super) fn format_permissions(permissions: &Permissions) -> String {
    let allowed: Vec<&str> = [
        (permissions.can_start_work, "start"),
        (permissions.can_complete, "complete"),
        (permissions.can_sign, "sign"),
        (permissions.can_approve, "approve"),
        (permissions.can_close, "reject, cancel"),
        (permissions.can_link_maintenance, "maintenance"),
    ]
    .into_iter()
    .filter_map(|(allowed, name)| allowed.then_some(name))
    .collect();

    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    }
}
