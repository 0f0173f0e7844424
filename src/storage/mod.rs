//! Local persistence for staff, CAFs, signatures, work orders, and history.
//!
//! Everything lives in a single `SQLite` file:
//!
//! ```text
//! ~/.fleetcaf/fleetcaf.sqlite
//!   staff              # Staff members and capability flags
//!   caf                # One row per corrective action form
//!   signature          # Append-only, ordered per CAF by `seq`
//!   maintenance_issue  # Work orders, at most one per CAF
//!   caf_event          # Append-only history entries (tagged JSON)
//! ```
//!
//! Each concern has its own submodule adding methods to [`Storage`].

mod caf;
mod history;
mod maintenance;
mod signature;
mod staff;

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use jiff::{Timestamp, civil::Date};
use rusqlite::Connection;
use uuid::Uuid;

use crate::model::CafStatus;

pub use caf::StatusWrite;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("CAF not found: {0}")]
    CafNotFound(String),

    #[error("staff member not found: {0}")]
    StaffNotFound(Uuid),

    #[error("staff member already exists: {0}")]
    StaffAlreadyExists(Uuid),

    #[error("CAF {caf} moved to {actual} before this change to {expected} was saved")]
    StaleStatus {
        caf: Uuid,
        expected: CafStatus,
        actual: CafStatus,
    },

    #[error("staff member {staff} has already signed completion of CAF {caf}")]
    AlreadySigned { caf: Uuid, staff: Uuid },

    #[error("CAF {caf} is {status} and takes no work order")]
    CafClosed { caf: Uuid, status: CafStatus },

    #[error("CAF {caf} is already linked to maintenance issue {issue}")]
    MaintenanceAlreadyLinked { caf: Uuid, issue: Uuid },

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS staff (
    id               TEXT PRIMARY KEY,
    organization_id  TEXT NOT NULL,
    name             TEXT NOT NULL,
    user_type        TEXT NOT NULL,
    can_sign_cafs    INTEGER NOT NULL,
    can_approve_cafs INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS caf (
    id                   TEXT PRIMARY KEY,
    caf_number           TEXT NOT NULL,
    organization_id      TEXT NOT NULL,
    incident_kind        TEXT NOT NULL,
    incident_id          TEXT NOT NULL,
    violation_type       TEXT NOT NULL,
    violation_codes      TEXT NOT NULL,
    violation_summary    TEXT,
    category             TEXT NOT NULL,
    priority             TEXT NOT NULL,
    title                TEXT NOT NULL,
    description          TEXT,
    status               TEXT NOT NULL,
    assigned_staff_id    TEXT NOT NULL,
    assigned_by          TEXT NOT NULL,
    created_by           TEXT NOT NULL,
    equipment_id         TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    due_date             TEXT,
    completed_at         TEXT,
    completion_notes     TEXT,
    approved_at          TEXT,
    approved_by          TEXT,
    maintenance_issue_id TEXT,
    UNIQUE (organization_id, caf_number)
);

CREATE TABLE IF NOT EXISTS signature (
    id                TEXT PRIMARY KEY,
    caf_id            TEXT NOT NULL REFERENCES caf (id),
    seq               INTEGER NOT NULL,
    signature_type    TEXT NOT NULL,
    staff_id          TEXT NOT NULL,
    digital_signature TEXT NOT NULL,
    notes             TEXT,
    signed_at         TEXT NOT NULL,
    UNIQUE (caf_id, seq)
);

CREATE UNIQUE INDEX IF NOT EXISTS signature_one_completion
    ON signature (caf_id, staff_id) WHERE signature_type = 'COMPLETION';

CREATE TRIGGER IF NOT EXISTS signature_no_update BEFORE UPDATE ON signature
BEGIN
    SELECT RAISE(ABORT, 'signatures are append-only');
END;

CREATE TRIGGER IF NOT EXISTS signature_no_delete BEFORE DELETE ON signature
BEGIN
    SELECT RAISE(ABORT, 'signatures are append-only');
END;

CREATE TABLE IF NOT EXISTS maintenance_issue (
    id                TEXT PRIMARY KEY,
    caf_id            TEXT NOT NULL UNIQUE REFERENCES caf (id),
    organization_id   TEXT NOT NULL,
    equipment_id      TEXT NOT NULL,
    priority          TEXT NOT NULL,
    description       TEXT NOT NULL,
    violation_codes   TEXT NOT NULL,
    due_date          TEXT,
    assigned_staff_id TEXT NOT NULL,
    created_by        TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS caf_event (
    seq    INTEGER PRIMARY KEY AUTOINCREMENT,
    caf_id TEXT NOT NULL REFERENCES caf (id),
    entry  TEXT NOT NULL
);
";

/// `SQLite`-backed storage.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "opened storage");
        Ok(Self { conn })
    }

    /// Returns the default database path: `~/.fleetcaf/fleetcaf.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fleetcaf").join("fleetcaf.sqlite"))
    }
}

// ── Column codecs ──

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

fn parse_optional_uuid(value: Option<String>, column: &str) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(&v, column)).transpose()
}

fn parse_timestamp(value: &str, column: &str) -> Result<Timestamp> {
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

fn parse_optional_timestamp(value: Option<String>, column: &str) -> Result<Option<Timestamp>> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}

fn parse_optional_date(value: Option<String>, column: &str) -> Result<Option<Date>> {
    value
        .map(|v| {
            v.parse::<Date>()
                .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
        })
        .transpose()
}

/// Parses an enum stored under its label.
fn parse_label<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StorageError::Corrupt(e.to_string()))
}
