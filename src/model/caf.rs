//! Corrective action forms: the record a violation turns into.

use std::{collections::BTreeSet, fmt, str::FromStr};

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ParseLabelError, Signature, SignatureType};

/// A corrective action form tied to a violation-bearing incident.
///
/// Owned by one organization. Mutated only through the workflow;
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveActionForm {
    pub id: Uuid,

    /// Display identifier, sequential per organization (`CAF-00012`).
    pub caf_number: String,

    pub organization_id: Uuid,

    /// The accident or roadside inspection this CAF remediates.
    pub incident: IncidentRef,

    pub violation_type: ViolationType,
    pub violation_codes: BTreeSet<String>,
    pub violation_summary: Option<String>,
    pub category: CafCategory,
    pub priority: Priority,

    pub title: String,
    pub description: Option<String>,

    pub status: CafStatus,

    /// Staff member who owns the work.
    pub assigned_staff_id: Uuid,
    pub assigned_by: Uuid,
    pub created_by: Uuid,

    /// Equipment the violation concerns, when known.
    pub equipment_id: Option<Uuid>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub due_date: Option<Date>,

    pub completed_at: Option<Timestamp>,
    pub completion_notes: Option<String>,

    pub approved_at: Option<Timestamp>,
    pub approved_by: Option<Uuid>,

    /// Linked maintenance work order, at most one.
    pub maintenance_issue_id: Option<Uuid>,

    /// Append-only, in signing order.
    pub signatures: Vec<Signature>,
}

impl CorrectiveActionForm {
    /// Whether any COMPLETION signature has been recorded.
    pub fn has_completion_signature(&self) -> bool {
        self.signatures
            .iter()
            .any(|s| s.signature_type == SignatureType::Completion)
    }

    /// Whether the given staff member already recorded a signature of this type.
    pub fn signed_by(&self, staff_id: Uuid, signature_type: SignatureType) -> bool {
        self.signatures
            .iter()
            .any(|s| s.staff_id == staff_id && s.signature_type == signature_type)
    }

    /// Whether this CAF concerns equipment and may spawn a maintenance work order.
    pub fn is_equipment_related(&self) -> bool {
        self.category == CafCategory::EquipmentMaintenance
            || self.violation_type == ViolationType::Equipment
    }
}

/// Where a CAF stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CafStatus {
    Assigned,
    InProgress,
    Completed,
    Approved,
    Rejected,
    Cancelled,
}

impl CafStatus {
    pub const ALL: [Self; 6] = [
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Approved,
        Self::Rejected,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Rejected and cancelled CAFs accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for CafStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CafStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseLabelError::new("CAF status", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ParseLabelError::new("priority", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CafCategory {
    EquipmentMaintenance,
    DriverTraining,
    DriverQualification,
    HoursOfService,
    Documentation,
    Other,
}

impl CafCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EquipmentMaintenance => "EQUIPMENT_MAINTENANCE",
            Self::DriverTraining => "DRIVER_TRAINING",
            Self::DriverQualification => "DRIVER_QUALIFICATION",
            Self::HoursOfService => "HOURS_OF_SERVICE",
            Self::Documentation => "DOCUMENTATION",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for CafCategory {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EQUIPMENT_MAINTENANCE" => Ok(Self::EquipmentMaintenance),
            "DRIVER_TRAINING" => Ok(Self::DriverTraining),
            "DRIVER_QUALIFICATION" => Ok(Self::DriverQualification),
            "HOURS_OF_SERVICE" => Ok(Self::HoursOfService),
            "DOCUMENTATION" => Ok(Self::Documentation),
            "OTHER" => Ok(Self::Other),
            other => Err(ParseLabelError::new("CAF category", other)),
        }
    }
}

/// Who or what the violation was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    Driver,
    Equipment,
    Company,
}

impl ViolationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driver => "DRIVER",
            Self::Equipment => "EQUIPMENT",
            Self::Company => "COMPANY",
        }
    }
}

impl FromStr for ViolationType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRIVER" => Ok(Self::Driver),
            "EQUIPMENT" => Ok(Self::Equipment),
            "COMPANY" => Ok(Self::Company),
            other => Err(ParseLabelError::new("violation type", other)),
        }
    }
}

/// The source incident of a CAF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRef {
    pub kind: IncidentKind,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    Accident,
    /// A RINS record, backed by a DVER.
    RoadsideInspection,
}

impl IncidentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accident => "ACCIDENT",
            Self::RoadsideInspection => "ROADSIDE_INSPECTION",
        }
    }
}

impl FromStr for IncidentKind {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCIDENT" => Ok(Self::Accident),
            "ROADSIDE_INSPECTION" => Ok(Self::RoadsideInspection),
            other => Err(ParseLabelError::new("incident kind", other)),
        }
    }
}

/// Input for creating a CAF. Identity, numbering, and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewCaf {
    pub organization_id: Uuid,
    pub incident: IncidentRef,
    pub violation_type: ViolationType,
    pub violation_codes: BTreeSet<String>,
    pub violation_summary: Option<String>,
    pub category: CafCategory,
    pub priority: Priority,
    pub title: String,
    pub description: Option<String>,
    pub assigned_staff_id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub due_date: Option<Date>,
}

/// Formats the display number for the nth CAF of an organization.
pub fn format_caf_number(sequence: u32) -> String {
    format!("CAF-{sequence:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip_through_from_str() {
        for status in CafStatus::ALL {
            assert_eq!(status.as_str().parse::<CafStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "DONE".parse::<CafStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown CAF status: DONE");
    }

    #[test]
    fn only_rejected_and_cancelled_are_terminal() {
        let terminal: Vec<_> = CafStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![CafStatus::Rejected, CafStatus::Cancelled]);
    }

    #[test]
    fn caf_number_is_zero_padded() {
        assert_eq!(format_caf_number(12), "CAF-00012");
        assert_eq!(format_caf_number(123_456), "CAF-123456");
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&CafStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
