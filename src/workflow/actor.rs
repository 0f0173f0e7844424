//! The acting staff member, normalized once at the boundary.

use uuid::Uuid;

use crate::model::{CorrectiveActionForm, Staff, UserType};

/// What an actor may do, independent of any particular CAF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub can_sign: bool,
    pub can_approve: bool,

    /// Master-tier accounts override organization scoping and capability flags.
    pub master_tier: bool,
}

/// Who is acting. Passed explicitly into every predicate and transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub staff_id: Uuid,
    pub organization_id: Uuid,
    pub capabilities: Capabilities,
}

impl Actor {
    pub fn from_staff(staff: &Staff) -> Self {
        Self {
            staff_id: staff.id,
            organization_id: staff.organization_id,
            capabilities: Capabilities {
                can_sign: staff.can_sign_cafs,
                can_approve: staff.can_approve_cafs,
                master_tier: staff.user_type == UserType::Master,
            },
        }
    }

    /// Whether the actor may see and act on CAFs of this organization.
    pub fn in_scope(&self, organization_id: Uuid) -> bool {
        self.capabilities.master_tier || self.organization_id == organization_id
    }

    pub fn is_assignee(&self, caf: &CorrectiveActionForm) -> bool {
        self.staff_id == caf.assigned_staff_id
    }

    pub fn may_sign(&self) -> bool {
        self.capabilities.can_sign || self.capabilities.master_tier
    }

    pub fn may_approve(&self) -> bool {
        self.capabilities.can_approve || self.capabilities.master_tier
    }
}
