//! CAF workflow rules: transitions, signatures, permissions, and maintenance linkage.
//!
//! Everything here is pure. Each rule takes the current CAF, the acting
//! staff member, and the clock, and either describes the mutation to
//! persist or explains why it is refused. Nothing in this module touches
//! storage; the desk loads fresh state, applies a rule, and writes the result.

mod actor;
mod maintenance;
mod permissions;
mod signing;
mod transition;

use uuid::Uuid;

use crate::model::CafStatus;

pub use actor::Actor;
pub use maintenance::plan_work_order;
pub use permissions::Permissions;
pub use signing::{approval_signature, complete_and_sign, sign};
pub use transition::{StatusChange, change_status};

/// Why a workflow action was refused. Refusals never mutate the CAF.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("actor is outside organization {0}")]
    OutOfScope(Uuid),

    #[error("cannot move CAF from {from} to {to}")]
    Unreachable { from: CafStatus, to: CafStatus },

    #[error("only the assigned staff member can {0}")]
    NotAssignee(&'static str),

    #[error("actor is not allowed to {0}")]
    MissingCapability(&'static str),

    #[error("completion notes are required")]
    NotesRequired,

    #[error("signing requires a COMPLETED CAF, found {0}")]
    NotCompleted(CafStatus),

    #[error("actor has already signed this CAF for completion")]
    AlreadySigned,

    #[error("digital signature is empty")]
    EmptySignature,

    #[error("approval signatures are recorded by approving the CAF")]
    ApprovalViaTransition,

    #[error("approval requires a completion signature")]
    CompletionSignatureMissing,

    #[error("CAF is not equipment-related")]
    NotEquipmentRelated,

    #[error("CAF is already linked to maintenance issue {0}")]
    AlreadyLinked(Uuid),

    #[error("no equipment is recorded for this CAF")]
    NoEquipment,

    #[error("CAF is {0}")]
    Closed(CafStatus),
}
