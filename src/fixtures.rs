//! Shared test fixtures.

use std::collections::BTreeSet;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{
    CafCategory, CafStatus, CorrectiveActionForm, IncidentKind, IncidentRef, NewCaf, Priority,
    Signature, SignatureType, Staff, UserType, ViolationType,
};
use crate::workflow::Actor;

pub fn staff(organization_id: Uuid) -> Staff {
    Staff {
        id: Uuid::new_v4(),
        organization_id,
        name: "Sam Ortiz".into(),
        user_type: UserType::Organization,
        can_sign_cafs: false,
        can_approve_cafs: false,
    }
}

pub fn signer(organization_id: Uuid) -> Staff {
    Staff {
        can_sign_cafs: true,
        ..staff(organization_id)
    }
}

pub fn approver(organization_id: Uuid) -> Staff {
    Staff {
        can_approve_cafs: true,
        ..staff(organization_id)
    }
}

pub fn master() -> Staff {
    Staff {
        user_type: UserType::Master,
        ..staff(Uuid::new_v4())
    }
}

pub fn new_caf(organization_id: Uuid, assigned_staff_id: Uuid) -> NewCaf {
    NewCaf {
        organization_id,
        incident: IncidentRef {
            kind: IncidentKind::RoadsideInspection,
            id: Uuid::new_v4(),
        },
        violation_type: ViolationType::Equipment,
        violation_codes: BTreeSet::from(["393.47".to_string(), "396.3(a)(1)".to_string()]),
        violation_summary: Some("Brake out of adjustment".into()),
        category: CafCategory::EquipmentMaintenance,
        priority: Priority::High,
        title: "Repair brakes on unit 112".into(),
        description: Some("Inspector placed unit OOS.".into()),
        assigned_staff_id,
        equipment_id: Some(Uuid::new_v4()),
        due_date: Some("2026-11-01".parse().unwrap()),
    }
}

/// A CAF in the given status, assigned to `assignee`.
pub fn caf(assignee: &Staff, status: CafStatus) -> CorrectiveActionForm {
    let new = new_caf(assignee.organization_id, assignee.id);
    let now = Timestamp::now();
    CorrectiveActionForm {
        id: Uuid::new_v4(),
        caf_number: "CAF-00001".into(),
        organization_id: new.organization_id,
        incident: new.incident,
        violation_type: new.violation_type,
        violation_codes: new.violation_codes,
        violation_summary: new.violation_summary,
        category: new.category,
        priority: new.priority,
        title: new.title,
        description: new.description,
        status,
        assigned_staff_id: assignee.id,
        assigned_by: assignee.id,
        created_by: assignee.id,
        equipment_id: new.equipment_id,
        created_at: now,
        updated_at: now,
        due_date: new.due_date,
        completed_at: None,
        completion_notes: None,
        approved_at: None,
        approved_by: None,
        maintenance_issue_id: None,
        signatures: Vec::new(),
    }
}

pub fn completion_signature(by: &Staff) -> Signature {
    Signature {
        id: Uuid::new_v4(),
        signature_type: SignatureType::Completion,
        staff_id: by.id,
        digital_signature: "data:image/png;base64,iVBORw0KGgo=".into(),
        signed_at: Timestamp::now(),
        notes: None,
    }
}

pub fn actor(staff: &Staff) -> Actor {
    Actor::from_staff(staff)
}
