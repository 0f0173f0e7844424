//! History storage: append and load CAF events.

use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::model::CafEvent;

use super::{Result, Storage, StorageError, caf::load_caf_in};

impl Storage {
    /// Loads all history entries for a CAF, oldest first.
    pub fn load_history(&self, caf_id: Uuid) -> Result<Vec<CafEvent>> {
        // Distinguish "no history" from "no such CAF".
        load_caf_in(&self.conn, caf_id)?;

        let mut stmt = self
            .conn
            .prepare("SELECT entry FROM caf_event WHERE caf_id = ?1 ORDER BY seq")?;
        let entries = stmt
            .query_map([caf_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        entries
            .iter()
            .map(|entry| {
                serde_json::from_str(entry)
                    .map_err(|e| StorageError::Corrupt(format!("invalid history entry: {e}")))
            })
            .collect()
    }
}

/// Appends a history entry.
pub(super) fn insert_event(conn: &Connection, event: &CafEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO caf_event (caf_id, entry) VALUES (?1, ?2)",
        params![event.caf_id.to_string(), serde_json::to_string(event)?],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::fixtures;
    use crate::model::{CafStatus, EventKind};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("fleetcaf.sqlite")).unwrap();
        (dir, storage)
    }

    #[test]
    fn creation_is_the_first_entry() {
        let (_dir, storage) = test_storage();
        let assignee = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let caf = storage
            .create_caf(
                &fixtures::new_caf(Uuid::new_v4(), assignee),
                creator,
                Timestamp::now(),
            )
            .unwrap();

        let history = storage.load_history(caf.id).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor, creator);
        assert_eq!(
            history[0].kind,
            EventKind::Created {
                assigned_staff_id: assignee
            }
        );
    }

    #[test]
    fn entries_load_in_append_order() {
        let (_dir, storage) = test_storage();
        let caf = storage
            .create_caf(
                &fixtures::new_caf(Uuid::new_v4(), Uuid::new_v4()),
                Uuid::new_v4(),
                Timestamp::now(),
            )
            .unwrap();
        let event = CafEvent {
            caf_id: caf.id,
            actor: caf.assigned_staff_id,
            recorded_at: Timestamp::now(),
            kind: EventKind::StatusChanged {
                from: CafStatus::Assigned,
                to: CafStatus::InProgress,
                notes: None,
            },
        };

        insert_event(&storage.conn, &event).unwrap();

        let history = storage.load_history(caf.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], event);
    }

    #[test]
    fn load_history_nonexistent_caf_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_history(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::CafNotFound(_)));
    }
}
