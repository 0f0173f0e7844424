//! The desk: CAF operations as one acting staff member sees them.
//!
//! Every operation loads fresh state, applies a workflow rule, and commits
//! the result in one transaction. Writes return the CAF as stored.

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{
    CafEvent, CafStatus, CorrectiveActionForm, EventKind, MaintenanceIssue, MaintenanceRequest,
    NewCaf, Signature, SignatureType,
};
use crate::pdf::{self, PdfDocument, PdfError, PdfFormat, StaffNames};
use crate::storage::{StatusWrite, Storage, StorageError};
use crate::workflow::{self, Actor, Permissions, StatusChange, WorkflowError};

/// Errors from desk operations.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("staff member {staff} does not belong to organization {organization}")]
    ForeignStaff { staff: Uuid, organization: Uuid },

    #[error("CAF title is required")]
    TitleRequired,
}

pub type Result<T> = core::result::Result<T, DeskError>;

/// A signature payload supplied alongside another action.
#[derive(Debug, Clone, Copy)]
pub struct SignatureInput<'a> {
    pub digital_signature: &'a str,
    pub notes: Option<&'a str>,
}

pub struct Desk<'a> {
    storage: &'a Storage,
}

impl<'a> Desk<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Resolves a staff member into the actor every rule takes.
    pub fn actor(&self, staff_id: Uuid) -> Result<Actor> {
        let staff = self.storage.load_staff(staff_id)?;
        Ok(Actor::from_staff(&staff))
    }

    /// The full CAF, signatures included.
    pub fn caf(&self, id: Uuid) -> Result<CorrectiveActionForm> {
        Ok(self.storage.load_caf(id)?)
    }

    /// The CAF, provided `actor` may see it.
    pub fn caf_for(&self, id: Uuid, actor: &Actor) -> Result<CorrectiveActionForm> {
        let caf = self.caf(id)?;
        if !actor.in_scope(caf.organization_id) {
            refused("view", caf.id, actor, &WorkflowError::OutOfScope(caf.organization_id));
            return Err(WorkflowError::OutOfScope(caf.organization_id).into());
        }
        Ok(caf)
    }

    /// CAFs visible to `actor`: its own organization, or everything for master tier.
    pub fn list(&self, actor: &Actor, status: Option<CafStatus>) -> Result<Vec<CorrectiveActionForm>> {
        let organization = (!actor.capabilities.master_tier).then_some(actor.organization_id);
        Ok(self.storage.list_cafs(organization, status)?)
    }

    /// CAFs visible to `actor` carrying a display number. Numbers repeat across organizations.
    pub fn find_by_number(&self, actor: &Actor, caf_number: &str) -> Result<Vec<CorrectiveActionForm>> {
        let mut cafs = self
            .storage
            .find_cafs_by_number(&caf_number.to_ascii_uppercase())?;
        cafs.retain(|c| actor.in_scope(c.organization_id));
        Ok(cafs)
    }

    /// The work order linked to the CAF, if any.
    pub fn maintenance(&self, caf_id: Uuid) -> Result<Option<MaintenanceIssue>> {
        Ok(self.storage.load_maintenance_for(caf_id)?)
    }

    /// What `actor` may currently do with the CAF.
    pub fn permissions(&self, caf_id: Uuid, actor: &Actor) -> Result<Permissions> {
        let caf = self.caf(caf_id)?;
        Ok(Permissions::evaluate(&caf, actor))
    }

    pub fn history(&self, caf_id: Uuid) -> Result<Vec<CafEvent>> {
        Ok(self.storage.load_history(caf_id)?)
    }

    /// Opens a CAF in status ASSIGNED.
    pub fn create_caf(&self, new: &NewCaf, actor: &Actor) -> Result<CorrectiveActionForm> {
        if !actor.in_scope(new.organization_id) {
            let err = WorkflowError::OutOfScope(new.organization_id);
            tracing::warn!(actor = %actor.staff_id, error = %err, "refused to create CAF");
            return Err(err.into());
        }
        if new.title.trim().is_empty() {
            return Err(DeskError::TitleRequired);
        }
        self.ensure_member(new.assigned_staff_id, new.organization_id)?;

        let caf = self
            .storage
            .create_caf(new, actor.staff_id, Timestamp::now())?;
        tracing::info!(
            caf = %caf.id,
            number = %caf.caf_number,
            actor = %actor.staff_id,
            assignee = %caf.assigned_staff_id,
            "created CAF"
        );
        Ok(caf)
    }

    /// Moves the CAF to `to`, if `actor` is allowed to.
    pub fn change_status(
        &self,
        caf_id: Uuid,
        to: CafStatus,
        actor: &Actor,
        notes: Option<&str>,
    ) -> Result<CorrectiveActionForm> {
        let caf = self.caf(caf_id)?;
        let now = Timestamp::now();
        let change = workflow::change_status(&caf, to, actor, notes, now)
            .inspect_err(|e| refused("change status", caf.id, actor, e))?;

        self.commit(&caf, Some(&change), Vec::new(), now)
    }

    /// Appends a completion signature to a COMPLETED CAF.
    pub fn sign(
        &self,
        caf_id: Uuid,
        signature_type: SignatureType,
        actor: &Actor,
        digital_signature: &str,
        notes: Option<&str>,
    ) -> Result<CorrectiveActionForm> {
        let caf = self.caf(caf_id)?;
        let now = Timestamp::now();
        let signature =
            workflow::sign(&caf, signature_type, actor, digital_signature, notes, now)
                .inspect_err(|e| refused("sign", caf.id, actor, e))?;

        self.commit(&caf, None, vec![signature], now)
    }

    /// Completes an IN_PROGRESS CAF and signs it in one transaction.
    pub fn complete_and_sign(
        &self,
        caf_id: Uuid,
        actor: &Actor,
        completion_notes: &str,
        signature: SignatureInput<'_>,
    ) -> Result<CorrectiveActionForm> {
        let caf = self.caf(caf_id)?;
        let now = Timestamp::now();
        let (change, signature) = workflow::complete_and_sign(
            &caf,
            actor,
            completion_notes,
            signature.digital_signature,
            signature.notes,
            now,
        )
        .inspect_err(|e| refused("complete and sign", caf.id, actor, e))?;

        self.commit(&caf, Some(&change), vec![signature], now)
    }

    /// Approves a COMPLETED CAF, recording the approver's signature if one is given.
    pub fn approve(
        &self,
        caf_id: Uuid,
        actor: &Actor,
        approval: Option<SignatureInput<'_>>,
    ) -> Result<CorrectiveActionForm> {
        let caf = self.caf(caf_id)?;
        let now = Timestamp::now();
        let change = workflow::change_status(&caf, CafStatus::Approved, actor, None, now)
            .inspect_err(|e| refused("approve", caf.id, actor, e))?;
        let signatures = approval
            .map(|a| workflow::approval_signature(actor, a.digital_signature, a.notes, now))
            .transpose()
            .inspect_err(|e| refused("approve", caf.id, actor, e))?
            .into_iter()
            .collect();

        self.commit(&caf, Some(&change), signatures, now)
    }

    /// Creates the CAF's maintenance work order and links it, in one transaction.
    pub fn link_maintenance(
        &self,
        caf_id: Uuid,
        actor: &Actor,
        request: &MaintenanceRequest,
    ) -> Result<(CorrectiveActionForm, MaintenanceIssue)> {
        let caf = self.caf(caf_id)?;
        let now = Timestamp::now();
        let issue = workflow::plan_work_order(&caf, actor, request, now)
            .inspect_err(|e| refused("link maintenance", caf.id, actor, e))?;
        if request.assigned_staff_id.is_some() {
            self.ensure_member(issue.assigned_staff_id, caf.organization_id)?;
        }

        let event = CafEvent {
            caf_id: caf.id,
            actor: actor.staff_id,
            recorded_at: now,
            kind: EventKind::MaintenanceLinked {
                maintenance_issue_id: issue.id,
            },
        };
        let linked = self.storage.create_and_link_maintenance(&issue, &event)?;
        tracing::info!(
            caf = %caf.id,
            actor = %actor.staff_id,
            issue = %issue.id,
            equipment = %issue.equipment_id,
            "linked maintenance work order"
        );
        Ok((linked, issue))
    }

    /// Renders the CAF as a PDF for an actor who may see it.
    pub fn export_pdf(&self, caf_id: Uuid, actor: &Actor, format: PdfFormat) -> Result<PdfDocument> {
        let caf = self.caf_for(caf_id, actor)?;
        let names = self.staff_names(&caf)?;
        let document = pdf::render(&caf, format, &names)?;
        tracing::info!(
            caf = %caf.id,
            actor = %actor.staff_id,
            format = %format,
            bytes = document.bytes.len(),
            "exported CAF"
        );
        Ok(document)
    }

    // ── Helpers ──

    fn commit(
        &self,
        before: &CorrectiveActionForm,
        change: Option<&StatusChange>,
        signatures: Vec<Signature>,
        now: Timestamp,
    ) -> Result<CorrectiveActionForm> {
        let mut after = before.clone();
        after.updated_at = now;

        let mut events = Vec::with_capacity(1 + signatures.len());
        if let Some(change) = change {
            change.apply(&mut after);
            events.push(change.event(before.id));
        }
        events.extend(signatures.iter().map(|s| signed_event(before.id, s)));

        let stored = self.storage.commit_status(&StatusWrite {
            caf: &after,
            expected_status: before.status,
            signatures: &signatures,
            events: &events,
        })?;

        if let Some(change) = change {
            tracing::info!(
                caf = %stored.id,
                actor = %change.actor,
                from = %change.from,
                to = %change.to,
                "changed CAF status"
            );
        }
        for s in &signatures {
            tracing::info!(
                caf = %stored.id,
                actor = %s.staff_id,
                signature_type = s.signature_type.as_str(),
                "signed CAF"
            );
        }
        Ok(stored)
    }

    fn ensure_member(&self, staff_id: Uuid, organization_id: Uuid) -> Result<()> {
        let staff = self.storage.load_staff(staff_id)?;
        if staff.organization_id != organization_id {
            return Err(DeskError::ForeignStaff {
                staff: staff_id,
                organization: organization_id,
            });
        }
        Ok(())
    }

    /// Names for everyone the document mentions. Unknown staff print as ids.
    fn staff_names(&self, caf: &CorrectiveActionForm) -> Result<StaffNames> {
        let ids = std::iter::once(caf.assigned_staff_id)
            .chain(caf.approved_by)
            .chain(caf.signatures.iter().map(|s| s.staff_id));

        let mut names = StaffNames::new();
        for id in ids {
            if names.contains_key(&id) {
                continue;
            }
            match self.storage.load_staff(id) {
                Ok(staff) => {
                    names.insert(id, staff.name);
                }
                Err(StorageError::StaffNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(names)
    }
}

fn signed_event(caf_id: Uuid, signature: &Signature) -> CafEvent {
    CafEvent {
        caf_id,
        actor: signature.staff_id,
        recorded_at: signature.signed_at,
        kind: EventKind::Signed {
            signature_type: signature.signature_type,
            signature_id: signature.id,
        },
    }
}

fn refused(action: &str, caf: Uuid, actor: &Actor, error: &WorkflowError) {
    tracing::warn!(%caf, actor = %actor.staff_id, error = %error, "refused to {action}");
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::fixtures;
    use crate::model::{CafCategory, Staff, ViolationType};

    const PAYLOAD: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("fleetcaf.sqlite")).unwrap();
        (dir, storage)
    }

    fn register(storage: &Storage, staff: Staff) -> Actor {
        storage.create_staff(&staff).unwrap();
        Actor::from_staff(&staff)
    }

    fn approval() -> SignatureInput<'static> {
        SignatureInput {
            digital_signature: PAYLOAD,
            notes: Some("reviewed"),
        }
    }

    /// A signer-assignee, an approver, and a CAF assigned to the signer.
    struct Scene {
        assignee: Actor,
        approver: Actor,
        caf: CorrectiveActionForm,
    }

    fn scene(storage: &Storage) -> Scene {
        let org = Uuid::new_v4();
        let assignee = register(storage, fixtures::signer(org));
        let approver = register(storage, fixtures::approver(org));
        let caf = Desk::new(storage)
            .create_caf(&fixtures::new_caf(org, assignee.staff_id), &approver)
            .unwrap();
        Scene {
            assignee,
            approver,
            caf,
        }
    }

    fn complete(desk: &Desk<'_>, scene: &Scene) -> CorrectiveActionForm {
        desk.change_status(scene.caf.id, CafStatus::InProgress, &scene.assignee, None)
            .unwrap();
        desk.change_status(
            scene.caf.id,
            CafStatus::Completed,
            &scene.assignee,
            Some("fixed brake"),
        )
        .unwrap()
    }

    #[test]
    fn full_lifecycle_to_approval() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        let id = scene.caf.id;

        assert!(desk.permissions(id, &scene.assignee).unwrap().can_start_work);

        let completed = complete(&desk, &scene);
        assert_eq!(completed.status, CafStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert!(!desk.permissions(id, &scene.approver).unwrap().can_approve);

        let signed = desk
            .sign(id, SignatureType::Completion, &scene.assignee, PAYLOAD, None)
            .unwrap();
        assert!(signed.has_completion_signature());
        assert!(desk.permissions(id, &scene.approver).unwrap().can_approve);

        let approved = desk.approve(id, &scene.approver, Some(approval())).unwrap();
        assert_eq!(approved.status, CafStatus::Approved);
        assert_eq!(approved.approved_by, Some(scene.approver.staff_id));
        assert_eq!(approved.signatures.len(), 2);
        assert_eq!(approved.signatures[1].signature_type, SignatureType::Approval);
        assert_eq!(desk.caf(id).unwrap(), approved);

        let kinds: Vec<_> = desk
            .history(id)
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds.len(), 6);
        assert!(matches!(kinds[0], EventKind::Created { .. }));
        assert!(matches!(
            kinds[4],
            EventKind::StatusChanged {
                to: CafStatus::Approved,
                ..
            }
        ));
        assert!(matches!(
            kinds[5],
            EventKind::Signed {
                signature_type: SignatureType::Approval,
                ..
            }
        ));
    }

    #[test]
    fn refused_change_leaves_caf_untouched() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);

        let err = desk
            .change_status(scene.caf.id, CafStatus::InProgress, &scene.approver, None)
            .unwrap_err();

        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::NotAssignee(_))
        ));
        assert_eq!(desk.caf(scene.caf.id).unwrap(), scene.caf);
        assert_eq!(desk.history(scene.caf.id).unwrap().len(), 1);
    }

    #[test]
    fn approval_without_completion_signature_is_refused() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        complete(&desk, &scene);

        let err = desk
            .approve(scene.caf.id, &scene.approver, Some(approval()))
            .unwrap_err();

        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::CompletionSignatureMissing)
        ));
        let stored = desk.caf(scene.caf.id).unwrap();
        assert_eq!(stored.status, CafStatus::Completed);
        assert!(stored.signatures.is_empty());
    }

    #[test]
    fn complete_and_sign_is_all_or_nothing() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let org = Uuid::new_v4();
        let assignee = register(&storage, fixtures::staff(org));
        let approver = register(&storage, fixtures::approver(org));
        let caf = desk
            .create_caf(&fixtures::new_caf(org, assignee.staff_id), &approver)
            .unwrap();
        desk.change_status(caf.id, CafStatus::InProgress, &assignee, None)
            .unwrap();

        let input = SignatureInput {
            digital_signature: PAYLOAD,
            notes: None,
        };
        let err = desk
            .complete_and_sign(caf.id, &assignee, "fixed brake", input)
            .unwrap_err();

        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::MissingCapability(_))
        ));
        let stored = desk.caf(caf.id).unwrap();
        assert_eq!(stored.status, CafStatus::InProgress);
        assert_eq!(stored.completion_notes, None);
    }

    #[test]
    fn complete_and_sign_commits_both() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        desk.change_status(scene.caf.id, CafStatus::InProgress, &scene.assignee, None)
            .unwrap();

        let input = SignatureInput {
            digital_signature: PAYLOAD,
            notes: Some("adjusted slack"),
        };
        let stored = desk
            .complete_and_sign(scene.caf.id, &scene.assignee, "fixed brake", input)
            .unwrap();

        assert_eq!(stored.status, CafStatus::Completed);
        assert_eq!(stored.completion_notes.as_deref(), Some("fixed brake"));
        assert_eq!(stored.signatures.len(), 1);
        assert_eq!(stored.signatures[0].notes.as_deref(), Some("adjusted slack"));
    }

    #[test]
    fn create_rejects_assignee_from_another_organization() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let org = Uuid::new_v4();
        let approver = register(&storage, fixtures::approver(org));
        let outsider = register(&storage, fixtures::staff(Uuid::new_v4()));

        let err = desk
            .create_caf(&fixtures::new_caf(org, outsider.staff_id), &approver)
            .unwrap_err();

        assert!(matches!(err, DeskError::ForeignStaff { .. }));
        assert!(storage.list_cafs(None, None).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_unknown_assignee_and_outside_scope() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let org = Uuid::new_v4();
        let approver = register(&storage, fixtures::approver(org));

        let err = desk
            .create_caf(&fixtures::new_caf(org, Uuid::new_v4()), &approver)
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Storage(StorageError::StaffNotFound(_))
        ));

        let other_org = Uuid::new_v4();
        let other = register(&storage, fixtures::staff(other_org));
        let err = desk
            .create_caf(&fixtures::new_caf(other_org, other.staff_id), &approver)
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::OutOfScope(_))
        ));
    }

    #[test]
    fn list_is_scoped_unless_master() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let first = scene(&storage);
        scene(&storage);
        let master = register(&storage, fixtures::master());

        let own = desk.list(&first.approver, None).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, first.caf.id);

        assert_eq!(desk.list(&master, None).unwrap().len(), 2);
        assert!(
            desk.list(&master, Some(CafStatus::Approved))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn find_by_number_is_scoped() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let first = scene(&storage);
        scene(&storage);
        let master = register(&storage, fixtures::master());

        let own = desk.find_by_number(&first.assignee, "caf-00001").unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, first.caf.id);

        assert_eq!(desk.find_by_number(&master, "CAF-00001").unwrap().len(), 2);
    }

    #[test]
    fn outsiders_cannot_view_or_export() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        let outsider = register(&storage, fixtures::approver(Uuid::new_v4()));

        assert!(desk.caf_for(scene.caf.id, &outsider).is_err());
        let err = desk
            .export_pdf(scene.caf.id, &outsider, PdfFormat::Completed)
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::OutOfScope(_))
        ));
        assert!(!desk.permissions(scene.caf.id, &outsider).unwrap().can_close);
    }

    #[test]
    fn link_maintenance_once() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);

        let (linked, issue) = desk
            .link_maintenance(scene.caf.id, &scene.assignee, &MaintenanceRequest::default())
            .unwrap();

        assert_eq!(linked.maintenance_issue_id, Some(issue.id));
        assert_eq!(issue.equipment_id, scene.caf.equipment_id.unwrap());
        assert_eq!(issue.violation_codes, scene.caf.violation_codes);
        assert_eq!(desk.maintenance(scene.caf.id).unwrap(), Some(issue.clone()));

        let err = desk
            .link_maintenance(scene.caf.id, &scene.assignee, &MaintenanceRequest::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::AlreadyLinked(id)) if id == issue.id
        ));
    }

    #[test]
    fn link_maintenance_offered_when_request_names_equipment() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let org = Uuid::new_v4();
        let assignee = register(&storage, fixtures::staff(org));
        let mut new = fixtures::new_caf(org, assignee.staff_id);
        new.equipment_id = None;
        let caf = desk.create_caf(&new, &assignee).unwrap();
        assert!(desk.permissions(caf.id, &assignee).unwrap().can_link_maintenance);

        let unit = Uuid::new_v4();
        let (linked, issue) = desk
            .link_maintenance(
                caf.id,
                &assignee,
                &MaintenanceRequest {
                    equipment_id: Some(unit),
                    ..MaintenanceRequest::default()
                },
            )
            .unwrap();

        assert_eq!(issue.equipment_id, unit);
        assert_eq!(linked.maintenance_issue_id, Some(issue.id));
        assert!(!desk.permissions(caf.id, &assignee).unwrap().can_link_maintenance);
    }

    #[test]
    fn link_maintenance_refuses_non_equipment_caf() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let org = Uuid::new_v4();
        let assignee = register(&storage, fixtures::staff(org));
        let mut new = fixtures::new_caf(org, assignee.staff_id);
        new.category = CafCategory::DriverTraining;
        new.violation_type = ViolationType::Driver;
        let caf = desk.create_caf(&new, &assignee).unwrap();

        let err = desk
            .link_maintenance(caf.id, &assignee, &MaintenanceRequest::default())
            .unwrap_err();

        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::NotEquipmentRelated)
        ));
        assert_eq!(storage.load_maintenance_for(caf.id).unwrap(), None);
    }

    #[test]
    fn link_maintenance_checks_requested_assignee() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        let outsider = register(&storage, fixtures::staff(Uuid::new_v4()));

        let request = MaintenanceRequest {
            assigned_staff_id: Some(outsider.staff_id),
            ..MaintenanceRequest::default()
        };
        let err = desk
            .link_maintenance(scene.caf.id, &scene.assignee, &request)
            .unwrap_err();

        assert!(matches!(err, DeskError::ForeignStaff { .. }));
        assert_eq!(desk.caf(scene.caf.id).unwrap().maintenance_issue_id, None);
    }

    #[test]
    fn export_uses_caf_number_for_filename() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);

        let document = desk
            .export_pdf(scene.caf.id, &scene.assignee, PdfFormat::Fillable)
            .unwrap();

        assert_eq!(document.filename, "CAF-00001-fillable.pdf");
        assert!(document.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn approver_may_reject_after_approval() {
        let (_dir, storage) = test_storage();
        let desk = Desk::new(&storage);
        let scene = scene(&storage);
        complete(&desk, &scene);
        desk.sign(
            scene.caf.id,
            SignatureType::Completion,
            &scene.assignee,
            PAYLOAD,
            None,
        )
        .unwrap();
        desk.approve(scene.caf.id, &scene.approver, None).unwrap();

        let rejected = desk
            .change_status(
                scene.caf.id,
                CafStatus::Rejected,
                &scene.approver,
                Some("audit found repair incomplete"),
            )
            .unwrap();

        assert_eq!(rejected.status, CafStatus::Rejected);
        assert_eq!(rejected.signatures.len(), 1);
        let err = desk
            .change_status(scene.caf.id, CafStatus::Cancelled, &scene.approver, None)
            .unwrap_err();
        assert!(matches!(
            err,
            DeskError::Workflow(WorkflowError::Unreachable { .. })
        ));
    }
}
