//! CAF storage: create, load, list, and commit workflow changes.
//!
//! Every write runs in one transaction and returns the CAF as stored
//! afterwards, read back inside that transaction.

use std::collections::BTreeSet;

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{
    CafEvent, CafStatus, CorrectiveActionForm, EventKind, IncidentRef, NewCaf, Signature,
    SignatureType, format_caf_number,
};

use super::{
    Result, Storage, StorageError, history, parse_label, parse_optional_date,
    parse_optional_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid, signature,
};

const CAF_COLUMNS: &str = "id, caf_number, organization_id, incident_kind, incident_id, \
     violation_type, violation_codes, violation_summary, category, priority, title, description, \
     status, assigned_staff_id, assigned_by, created_by, equipment_id, created_at, updated_at, \
     due_date, completed_at, completion_notes, approved_at, approved_by, maintenance_issue_id";

/// A workflow change to persist atomically.
#[derive(Debug)]
pub struct StatusWrite<'a> {
    /// The CAF with the change already applied in memory.
    pub caf: &'a CorrectiveActionForm,

    /// The status the stored row must still have. Guards against a concurrent change.
    pub expected_status: CafStatus,

    /// Signatures to append, in order.
    pub signatures: &'a [Signature],

    /// History entries to append, in order.
    pub events: &'a [CafEvent],
}

impl Storage {
    /// Creates a CAF in status ASSIGNED, numbering it within its organization.
    pub fn create_caf(
        &self,
        new: &NewCaf,
        created_by: Uuid,
        now: Timestamp,
    ) -> Result<CorrectiveActionForm> {
        let tx = self.conn.unchecked_transaction()?;

        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM caf WHERE organization_id = ?1",
            [new.organization_id.to_string()],
            |row| row.get(0),
        )?;
        let sequence = u32::try_from(count + 1)
            .map_err(|e| StorageError::Corrupt(format!("CAF sequence overflow: {e}")))?;

        let id = Uuid::new_v4();
        tx.execute(
            &format!(
                "INSERT INTO caf ({CAF_COLUMNS}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                  ?18, ?19, ?20, NULL, NULL, NULL, NULL, NULL)"
            ),
            params![
                id.to_string(),
                format_caf_number(sequence),
                new.organization_id.to_string(),
                new.incident.kind.as_str(),
                new.incident.id.to_string(),
                new.violation_type.as_str(),
                serde_json::to_string(&new.violation_codes)?,
                &new.violation_summary,
                new.category.as_str(),
                new.priority.as_str(),
                &new.title,
                &new.description,
                CafStatus::Assigned.as_str(),
                new.assigned_staff_id.to_string(),
                created_by.to_string(),
                created_by.to_string(),
                new.equipment_id.map(|e| e.to_string()),
                now.to_string(),
                now.to_string(),
                new.due_date.map(|d| d.to_string()),
            ],
        )?;

        history::insert_event(
            &tx,
            &CafEvent {
                caf_id: id,
                actor: created_by,
                recorded_at: now,
                kind: EventKind::Created {
                    assigned_staff_id: new.assigned_staff_id,
                },
            },
        )?;

        let caf = load_caf_in(&tx, id)?;
        tx.commit()?;
        Ok(caf)
    }

    /// Loads a CAF with its signatures.
    pub fn load_caf(&self, id: Uuid) -> Result<CorrectiveActionForm> {
        load_caf_in(&self.conn, id)
    }

    /// Finds CAFs carrying a display number. Numbers are unique per organization only.
    pub fn find_cafs_by_number(&self, caf_number: &str) -> Result<Vec<CorrectiveActionForm>> {
        self.query_cafs(
            &format!("SELECT {CAF_COLUMNS} FROM caf WHERE caf_number = ?1 ORDER BY rowid"),
            [caf_number],
        )
    }

    /// Lists CAFs, optionally filtered by organization and status, in creation order.
    pub fn list_cafs(
        &self,
        organization_id: Option<Uuid>,
        status: Option<CafStatus>,
    ) -> Result<Vec<CorrectiveActionForm>> {
        self.query_cafs(
            &format!(
                "SELECT {CAF_COLUMNS} FROM caf
                 WHERE (?1 IS NULL OR organization_id = ?1)
                   AND (?2 IS NULL OR status = ?2)
                 ORDER BY rowid"
            ),
            [
                organization_id.map(|o| o.to_string()),
                status.map(|s| s.as_str().to_string()),
            ],
        )
    }

    /// Persists a workflow change: status and its stamps, new signatures, history.
    ///
    /// Fails with [`StorageError::StaleStatus`] and writes nothing if the stored
    /// status is no longer `expected_status`, and with [`StorageError::AlreadySigned`]
    /// if a completion signer already signed in a concurrent session.
    pub fn commit_status(&self, write: &StatusWrite<'_>) -> Result<CorrectiveActionForm> {
        let caf = write.caf;
        let tx = self.conn.unchecked_transaction()?;

        let rows = tx.execute(
            "UPDATE caf
             SET status = ?1, updated_at = ?2, completed_at = ?3, completion_notes = ?4,
                 approved_at = ?5, approved_by = ?6
             WHERE id = ?7 AND status = ?8",
            params![
                caf.status.as_str(),
                caf.updated_at.to_string(),
                caf.completed_at.map(|t| t.to_string()),
                &caf.completion_notes,
                caf.approved_at.map(|t| t.to_string()),
                caf.approved_by.map(|a| a.to_string()),
                caf.id.to_string(),
                write.expected_status.as_str(),
            ],
        )?;
        if rows == 0 {
            let actual = load_caf_in(&tx, caf.id)?.status;
            return Err(StorageError::StaleStatus {
                caf: caf.id,
                expected: write.expected_status,
                actual,
            });
        }

        // The status guard alone does not cover signing, which keeps COMPLETED.
        for s in write.signatures {
            if s.signature_type == SignatureType::Completion
                && signature::has_signed(&tx, caf.id, s.staff_id, SignatureType::Completion)?
            {
                return Err(StorageError::AlreadySigned {
                    caf: caf.id,
                    staff: s.staff_id,
                });
            }
            signature::insert_signature(&tx, caf.id, s)?;
        }
        for event in write.events {
            history::insert_event(&tx, event)?;
        }

        let stored = load_caf_in(&tx, caf.id)?;
        tx.commit()?;
        Ok(stored)
    }

    fn query_cafs(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<CorrectiveActionForm>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, CafRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|row| {
                let signatures = signature::load_signatures(&self.conn, &row.id)?;
                row.into_caf(signatures)
            })
            .collect()
    }
}

/// Loads a CAF through any connection, including an open transaction.
pub(super) fn load_caf_in(conn: &Connection, id: Uuid) -> Result<CorrectiveActionForm> {
    let row = conn
        .query_row(
            &format!("SELECT {CAF_COLUMNS} FROM caf WHERE id = ?1"),
            [id.to_string()],
            CafRow::read,
        )
        .optional()?
        .ok_or_else(|| StorageError::CafNotFound(id.to_string()))?;
    let signatures = signature::load_signatures(conn, &row.id)?;
    row.into_caf(signatures)
}

/// Raw column values of a CAF row, in `CAF_COLUMNS` order.
struct CafRow {
    id: String,
    caf_number: String,
    organization_id: String,
    incident_kind: String,
    incident_id: String,
    violation_type: String,
    violation_codes: String,
    violation_summary: Option<String>,
    category: String,
    priority: String,
    title: String,
    description: Option<String>,
    status: String,
    assigned_staff_id: String,
    assigned_by: String,
    created_by: String,
    equipment_id: Option<String>,
    created_at: String,
    updated_at: String,
    due_date: Option<String>,
    completed_at: Option<String>,
    completion_notes: Option<String>,
    approved_at: Option<String>,
    approved_by: Option<String>,
    maintenance_issue_id: Option<String>,
}

impl CafRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            caf_number: row.get(1)?,
            organization_id: row.get(2)?,
            incident_kind: row.get(3)?,
            incident_id: row.get(4)?,
            violation_type: row.get(5)?,
            violation_codes: row.get(6)?,
            violation_summary: row.get(7)?,
            category: row.get(8)?,
            priority: row.get(9)?,
            title: row.get(10)?,
            description: row.get(11)?,
            status: row.get(12)?,
            assigned_staff_id: row.get(13)?,
            assigned_by: row.get(14)?,
            created_by: row.get(15)?,
            equipment_id: row.get(16)?,
            created_at: row.get(17)?,
            updated_at: row.get(18)?,
            due_date: row.get(19)?,
            completed_at: row.get(20)?,
            completion_notes: row.get(21)?,
            approved_at: row.get(22)?,
            approved_by: row.get(23)?,
            maintenance_issue_id: row.get(24)?,
        })
    }

    fn into_caf(self, signatures: Vec<Signature>) -> Result<CorrectiveActionForm> {
        let violation_codes: BTreeSet<String> = serde_json::from_str(&self.violation_codes)
            .map_err(|e| StorageError::Corrupt(format!("invalid violation_codes: {e}")))?;

        Ok(CorrectiveActionForm {
            id: parse_uuid(&self.id, "CAF id")?,
            caf_number: self.caf_number,
            organization_id: parse_uuid(&self.organization_id, "organization_id")?,
            incident: IncidentRef {
                kind: parse_label(&self.incident_kind)?,
                id: parse_uuid(&self.incident_id, "incident_id")?,
            },
            violation_type: parse_label(&self.violation_type)?,
            violation_codes,
            violation_summary: self.violation_summary,
            category: parse_label(&self.category)?,
            priority: parse_label(&self.priority)?,
            title: self.title,
            description: self.description,
            status: parse_label(&self.status)?,
            assigned_staff_id: parse_uuid(&self.assigned_staff_id, "assigned_staff_id")?,
            assigned_by: parse_uuid(&self.assigned_by, "assigned_by")?,
            created_by: parse_uuid(&self.created_by, "created_by")?,
            equipment_id: parse_optional_uuid(self.equipment_id, "equipment_id")?,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
            due_date: parse_optional_date(self.due_date, "due_date")?,
            completed_at: parse_optional_timestamp(self.completed_at, "completed_at")?,
            completion_notes: self.completion_notes,
            approved_at: parse_optional_timestamp(self.approved_at, "approved_at")?,
            approved_by: parse_optional_uuid(self.approved_by, "approved_by")?,
            maintenance_issue_id: parse_optional_uuid(
                self.maintenance_issue_id,
                "maintenance_issue_id",
            )?,
            signatures,
        })
    }
}
