//! Staff storage: add, load, and list staff members.

use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::Staff;

use super::{Result, Storage, StorageError, parse_label, parse_uuid};

const STAFF_COLUMNS: &str =
    "id, organization_id, name, user_type, can_sign_cafs, can_approve_cafs";

impl Storage {
    /// Adds a staff member.
    pub fn create_staff(&self, staff: &Staff) -> Result<()> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM staff WHERE id = ?1",
                [staff.id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(StorageError::StaffAlreadyExists(staff.id));
        }
        self.conn.execute(
            "INSERT INTO staff (id, organization_id, name, user_type, can_sign_cafs, can_approve_cafs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                staff.id.to_string(),
                staff.organization_id.to_string(),
                &staff.name,
                staff.user_type.as_str(),
                staff.can_sign_cafs,
                staff.can_approve_cafs,
            ],
        )?;
        Ok(())
    }

    /// Loads a single staff member.
    pub fn load_staff(&self, id: Uuid) -> Result<Staff> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
                [id.to_string()],
                StaffRow::read,
            )
            .optional()?
            .ok_or(StorageError::StaffNotFound(id))?;
        row.into_staff()
    }

    /// Lists staff, optionally limited to one organization, sorted by name.
    pub fn list_staff(&self, organization_id: Option<Uuid>) -> Result<Vec<Staff>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff
             WHERE ?1 IS NULL OR organization_id = ?1
             ORDER BY name, id"
        ))?;
        let rows = stmt.query_map([organization_id.map(|o| o.to_string())], StaffRow::read)?;
        rows.map(|row| row?.into_staff()).collect()
    }
}

/// Raw column values of a staff row.
struct StaffRow {
    id: String,
    organization_id: String,
    name: String,
    user_type: String,
    can_sign_cafs: bool,
    can_approve_cafs: bool,
}

impl StaffRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            name: row.get(2)?,
            user_type: row.get(3)?,
            can_sign_cafs: row.get(4)?,
            can_approve_cafs: row.get(5)?,
        })
    }

    fn into_staff(self) -> Result<Staff> {
        Ok(Staff {
            id: parse_uuid(&self.id, "staff id")?,
            organization_id: parse_uuid(&self.organization_id, "organization_id")?,
            name: self.name,
            user_type: parse_label(&self.user_type)?,
            can_sign_cafs: self.can_sign_cafs,
            can_approve_cafs: self.can_approve_cafs,
        })
    }
}
