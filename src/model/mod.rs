//! Core data model for fleetcaf.
//!
//! Corrective action forms, the signatures recorded against them,
//! the staff who act on them, maintenance work orders they spawn,
//! and the history entries that record every change.

mod caf;
mod maintenance;
mod signature;
mod staff;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use caf::{
    CafCategory, CafStatus, CorrectiveActionForm, IncidentKind, IncidentRef, NewCaf, Priority,
    ViolationType, format_caf_number,
};
pub use maintenance::{MaintenanceIssue, MaintenanceRequest};
pub use signature::{Signature, SignatureType};
pub use staff::{Staff, UserType};

/// A stored or typed label did not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A single entry in a CAF's history.
///
/// History is append-only and records who did what, and when.
/// The kind is a tagged enum so each stored row is self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CafEvent {
    pub caf_id: Uuid,
    pub actor: Uuid,
    pub recorded_at: Timestamp,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventKind {
    /// The CAF was opened and assigned.
    Created { assigned_staff_id: Uuid },

    /// The workflow moved the CAF to a new status.
    StatusChanged {
        from: CafStatus,
        to: CafStatus,
        notes: Option<String>,
    },

    /// A signature was appended.
    Signed {
        signature_type: SignatureType,
        signature_id: Uuid,
    },

    /// A maintenance work order was created and linked.
    MaintenanceLinked { maintenance_issue_id: Uuid },
}
