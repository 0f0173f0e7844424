//! Maintenance work orders spawned from equipment-related CAFs.

use std::collections::BTreeSet;

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Priority;

/// A maintenance work order, linked 1:1 back to the CAF that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceIssue {
    pub id: Uuid,
    pub caf_id: Uuid,
    pub organization_id: Uuid,
    pub equipment_id: Uuid,
    pub priority: Priority,
    pub description: String,
    pub violation_codes: BTreeSet<String>,
    pub due_date: Option<Date>,
    pub assigned_staff_id: Uuid,
    pub created_by: Uuid,
    pub created_at: Timestamp,
}

/// Overrides for a new work order. Unset fields fall back to the CAF's values.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceRequest {
    pub equipment_id: Option<Uuid>,
    pub priority: Option<Priority>,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub assigned_staff_id: Option<Uuid>,
}
