//! Maintenance work order storage.
//!
//! Creating a work order and linking it back onto its CAF happen in one
//! transaction, so a work order never exists without its link.

use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::model::{CafEvent, CafStatus, CorrectiveActionForm, MaintenanceIssue};

use super::{
    Result, Storage, StorageError, caf::load_caf_in, history, parse_label, parse_optional_date,
    parse_timestamp, parse_uuid,
};

impl Storage {
    /// Inserts a work order and links it onto its CAF, returning the updated CAF.
    ///
    /// Fails without writing anything if the CAF already has a work order or
    /// was rejected or cancelled since it was loaded.
    pub fn create_and_link_maintenance(
        &self,
        issue: &MaintenanceIssue,
        event: &CafEvent,
    ) -> Result<CorrectiveActionForm> {
        let tx = self.conn.unchecked_transaction()?;

        let rows = tx.execute(
            "UPDATE caf SET maintenance_issue_id = ?1, updated_at = ?2
             WHERE id = ?3 AND maintenance_issue_id IS NULL AND status NOT IN (?4, ?5)",
            params![
                issue.id.to_string(),
                issue.created_at.to_string(),
                issue.caf_id.to_string(),
                CafStatus::Rejected.as_str(),
                CafStatus::Cancelled.as_str(),
            ],
        )?;
        if rows == 0 {
            let caf = load_caf_in(&tx, issue.caf_id)?;
            return Err(match caf.maintenance_issue_id {
                Some(existing) => StorageError::MaintenanceAlreadyLinked {
                    caf: caf.id,
                    issue: existing,
                },
                None => StorageError::CafClosed {
                    caf: caf.id,
                    status: caf.status,
                },
            });
        }

        tx.execute(
            "INSERT INTO maintenance_issue
                 (id, caf_id, organization_id, equipment_id, priority, description,
                  violation_codes, due_date, assigned_staff_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                issue.id.to_string(),
                issue.caf_id.to_string(),
                issue.organization_id.to_string(),
                issue.equipment_id.to_string(),
                issue.priority.as_str(),
                &issue.description,
                serde_json::to_string(&issue.violation_codes)?,
                issue.due_date.map(|d| d.to_string()),
                issue.assigned_staff_id.to_string(),
                issue.created_by.to_string(),
                issue.created_at.to_string(),
            ],
        )?;
        history::insert_event(&tx, event)?;

        let caf = load_caf_in(&tx, issue.caf_id)?;
        tx.commit()?;
        Ok(caf)
    }

    /// Loads the work order linked to a CAF, if any.
    pub fn load_maintenance_for(&self, caf_id: Uuid) -> Result<Option<MaintenanceIssue>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, caf_id, organization_id, equipment_id, priority, description,
                        violation_codes, due_date, assigned_staff_id, created_by, created_at
                 FROM maintenance_issue WHERE caf_id = ?1",
                [caf_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            caf_id,
            organization_id,
            equipment_id,
            priority,
            description,
            violation_codes,
            due_date,
            assigned_staff_id,
            created_by,
            created_at,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(MaintenanceIssue {
            id: parse_uuid(&id, "maintenance issue id")?,
            caf_id: parse_uuid(&caf_id, "caf_id")?,
            organization_id: parse_uuid(&organization_id, "organization_id")?,
            equipment_id: parse_uuid(&equipment_id, "equipment_id")?,
            priority: parse_label(&priority)?,
            description,
            violation_codes: serde_json::from_str(&violation_codes)
                .map_err(|e| StorageError::Corrupt(format!("invalid violation_codes: {e}")))?,
            due_date: parse_optional_date(due_date, "due_date")?,
            assigned_staff_id: parse_uuid(&assigned_staff_id, "assigned_staff_id")?,
            created_by: parse_uuid(&created_by, "created_by")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
        }))
    }
}
