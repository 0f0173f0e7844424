//! Signatures: completion sign-off and approval attestations.
//!
//! A completion signature can only be recorded on a COMPLETED CAF. The
//! "sign while still in progress" convenience is the explicit
//! [`complete_and_sign`] shortcut, which completes first and then signs
//! against the completed state.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{CafStatus, CorrectiveActionForm, Signature, SignatureType};

use super::{Actor, StatusChange, WorkflowError, change_status};

/// Build the completion signature `actor` wants to append to `caf`.
pub fn sign(
    caf: &CorrectiveActionForm,
    signature_type: SignatureType,
    actor: &Actor,
    digital_signature: &str,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<Signature, WorkflowError> {
    if signature_type == SignatureType::Approval {
        return Err(WorkflowError::ApprovalViaTransition);
    }
    if !actor.in_scope(caf.organization_id) {
        return Err(WorkflowError::OutOfScope(caf.organization_id));
    }
    if caf.status != CafStatus::Completed {
        return Err(WorkflowError::NotCompleted(caf.status));
    }
    if !actor.may_sign() {
        return Err(WorkflowError::MissingCapability("sign CAFs"));
    }
    if caf.signed_by(actor.staff_id, SignatureType::Completion) {
        return Err(WorkflowError::AlreadySigned);
    }

    new_signature(SignatureType::Completion, actor, digital_signature, notes, now)
}

/// Build the approval signature that accompanies an accepted approve transition.
///
/// The caller is responsible for having validated the transition itself.
pub fn approval_signature(
    actor: &Actor,
    digital_signature: &str,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<Signature, WorkflowError> {
    new_signature(SignatureType::Approval, actor, digital_signature, notes, now)
}

/// Complete an in-progress CAF and sign it for completion in one step.
///
/// Both halves are validated before anything is returned, so the caller
/// persists either both or neither.
pub fn complete_and_sign(
    caf: &CorrectiveActionForm,
    actor: &Actor,
    completion_notes: &str,
    digital_signature: &str,
    signature_notes: Option<&str>,
    now: Timestamp,
) -> Result<(StatusChange, Signature), WorkflowError> {
    let change = change_status(caf, CafStatus::Completed, actor, Some(completion_notes), now)?;

    let mut completed = caf.clone();
    change.apply(&mut completed);

    let signature = sign(
        &completed,
        SignatureType::Completion,
        actor,
        digital_signature,
        signature_notes,
        now,
    )?;

    Ok((change, signature))
}

fn new_signature(
    signature_type: SignatureType,
    actor: &Actor,
    digital_signature: &str,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<Signature, WorkflowError> {
    if digital_signature.trim().is_empty() {
        return Err(WorkflowError::EmptySignature);
    }

    Ok(Signature {
        id: Uuid::new_v4(),
        signature_type,
        staff_id: actor.staff_id,
        digital_signature: digital_signature.to_string(),
        signed_at: now,
        notes: notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
    })
}
