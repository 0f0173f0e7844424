//! Maintenance linkage: turning an equipment CAF into a work order.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{CorrectiveActionForm, MaintenanceIssue, MaintenanceRequest};

use super::{Actor, WorkflowError};

/// Build the work order for `caf`, filling unset request fields from the CAF.
///
/// One work order per CAF: refused once `maintenance_issue_id` is set.
pub fn plan_work_order(
    caf: &CorrectiveActionForm,
    actor: &Actor,
    request: &MaintenanceRequest,
    now: Timestamp,
) -> Result<MaintenanceIssue, WorkflowError> {
    if !actor.in_scope(caf.organization_id) {
        return Err(WorkflowError::OutOfScope(caf.organization_id));
    }
    if caf.status.is_terminal() {
        return Err(WorkflowError::Closed(caf.status));
    }
    if !caf.is_equipment_related() {
        return Err(WorkflowError::NotEquipmentRelated);
    }
    if let Some(existing) = caf.maintenance_issue_id {
        return Err(WorkflowError::AlreadyLinked(existing));
    }
    let equipment_id = request
        .equipment_id
        .or(caf.equipment_id)
        .ok_or(WorkflowError::NoEquipment)?;

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map_or_else(|| default_description(caf), String::from);

    Ok(MaintenanceIssue {
        id: Uuid::new_v4(),
        caf_id: caf.id,
        organization_id: caf.organization_id,
        equipment_id,
        priority: request.priority.unwrap_or(caf.priority),
        description,
        violation_codes: caf.violation_codes.clone(),
        due_date: request.due_date.or(caf.due_date),
        assigned_staff_id: request.assigned_staff_id.unwrap_or(caf.assigned_staff_id),
        created_by: actor.staff_id,
        created_at: now,
    })
}

fn default_description(caf: &CorrectiveActionForm) -> String {
    match &caf.violation_summary {
        Some(summary) => format!("{}: {} ({summary})", caf.caf_number, caf.title),
        None => format!("{}: {}", caf.caf_number, caf.title),
    }
}
