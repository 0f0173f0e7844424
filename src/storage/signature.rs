//! Signature storage: append and load, never update or delete.
//!
//! Signatures are written only inside CAF transactions, so these are
//! connection-level helpers rather than `Storage` methods.

use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::model::{Signature, SignatureType};

use super::{Result, parse_label, parse_timestamp, parse_uuid};

/// Appends a signature after the CAF's existing ones.
pub(super) fn insert_signature(conn: &Connection, caf_id: Uuid, signature: &Signature) -> Result<()> {
    conn.execute(
        "INSERT INTO signature
             (id, caf_id, seq, signature_type, staff_id, digital_signature, notes, signed_at)
         VALUES
             (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM signature WHERE caf_id = ?2),
              ?3, ?4, ?5, ?6, ?7)",
        params![
            signature.id.to_string(),
            caf_id.to_string(),
            signature.signature_type.as_str(),
            signature.staff_id.to_string(),
            &signature.digital_signature,
            &signature.notes,
            signature.signed_at.to_string(),
        ],
    )?;
    Ok(())
}

/// Whether `staff_id` already holds a signature of `signature_type` on the CAF.
pub(super) fn has_signed(
    conn: &Connection,
    caf_id: Uuid,
    staff_id: Uuid,
    signature_type: SignatureType,
) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM signature
                        WHERE caf_id = ?1 AND staff_id = ?2 AND signature_type = ?3)",
        params![caf_id.to_string(), staff_id.to_string(), signature_type.as_str()],
        |row| row.get(0),
    )?)
}

/// Loads a CAF's signatures in signing order.
pub(super) fn load_signatures(conn: &Connection, caf_id: &str) -> Result<Vec<Signature>> {
    let mut stmt = conn.prepare(
        "SELECT id, signature_type, staff_id, digital_signature, notes, signed_at
         FROM signature WHERE caf_id = ?1 ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([caf_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(
            |(id, signature_type, staff_id, digital_signature, notes, signed_at)| {
                Ok(Signature {
                    id: parse_uuid(&id, "signature id")?,
                    signature_type: parse_label(&signature_type)?,
                    staff_id: parse_uuid(&staff_id, "signature staff_id")?,
                    digital_signature,
                    signed_at: parse_timestamp(&signed_at, "signed_at")?,
                    notes,
                })
            },
        )
        .collect()
}
