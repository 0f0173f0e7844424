//! Permission predicates.
//!
//! Pure functions of the CAF and the actor. Evaluate them against freshly
//! loaded state every time; a stale CAF would offer actions already taken.

use serde::Serialize;

use crate::model::{CafStatus, CorrectiveActionForm, SignatureType};

use super::Actor;

/// Every action the actor can take on a CAF right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_start_work: bool,
    pub can_complete: bool,
    pub can_sign: bool,
    pub can_approve: bool,
    pub can_close: bool,
    pub can_link_maintenance: bool,
}

impl Permissions {
    pub fn evaluate(caf: &CorrectiveActionForm, actor: &Actor) -> Self {
        Self {
            can_start_work: can_start_work(caf, actor),
            can_complete: can_complete(caf, actor),
            can_sign: can_sign(caf, actor),
            can_approve: can_approve(caf, actor),
            can_close: can_close(caf, actor),
            can_link_maintenance: can_link_maintenance(caf, actor),
        }
    }
}

pub fn can_start_work(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id)
        && actor.is_assignee(caf)
        && caf.status == CafStatus::Assigned
}

pub fn can_complete(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id)
        && actor.is_assignee(caf)
        && caf.status == CafStatus::InProgress
}

pub fn can_sign(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id)
        && caf.status == CafStatus::Completed
        && !caf.signed_by(actor.staff_id, SignatureType::Completion)
        && actor.may_sign()
}

pub fn can_approve(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id)
        && caf.status == CafStatus::Completed
        && caf.has_completion_signature()
        && actor.may_approve()
}

/// Reject or cancel.
pub fn can_close(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id) && !caf.status.is_terminal() && actor.may_approve()
}

/// The request may name the equipment, so a CAF without `equipment_id` still qualifies.
pub fn can_link_maintenance(caf: &CorrectiveActionForm, actor: &Actor) -> bool {
    actor.in_scope(caf.organization_id)
        && !caf.status.is_terminal()
        && caf.is_equipment_related()
        && caf.maintenance_issue_id.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use uuid::Uuid;

    use crate::fixtures;
    use crate::model::MaintenanceRequest;
    use crate::workflow::{change_status, plan_work_order};
    use crate::workflow::transition::Edge;

    #[test]
    fn assigned_caf_offers_start_work_to_assignee_only() {
        let org = Uuid::new_v4();
        let assignee = fixtures::staff(org);
        let other = fixtures::staff(org);
        let caf = fixtures::caf(&assignee, CafStatus::Assigned);

        assert!(can_start_work(&caf, &fixtures::actor(&assignee)));
        assert!(!can_start_work(&caf, &fixtures::actor(&other)));
        assert!(!can_complete(&caf, &fixtures::actor(&assignee)));
    }

    #[test]
    fn can_sign_is_false_unless_completed() {
        let master = fixtures::actor(&fixtures::master());
        let assignee = fixtures::signer(Uuid::new_v4());
        let capable = fixtures::actor(&assignee);

        for status in CafStatus::ALL {
            let caf = fixtures::caf(&assignee, status);
            let expected = status == CafStatus::Completed;
            assert_eq!(can_sign(&caf, &capable), expected, "{status}");
            assert_eq!(can_sign(&caf, &master), expected, "{status}");
        }
    }

    #[test]
    fn can_sign_is_false_after_signing() {
        let assignee = fixtures::signer(Uuid::new_v4());
        let mut caf = fixtures::caf(&assignee, CafStatus::Completed);
        let actor = fixtures::actor(&assignee);
        assert!(can_sign(&caf, &actor));

        caf.signatures.push(fixtures::completion_signature(&assignee));

        assert!(!can_sign(&caf, &actor));
    }

    #[test]
    fn can_sign_requires_capability() {
        let assignee = fixtures::staff(Uuid::new_v4());
        let caf = fixtures::caf(&assignee, CafStatus::Completed);

        assert!(!can_sign(&caf, &fixtures::actor(&assignee)));
    }

    #[test]
    fn can_approve_is_false_without_completion_signature() {
        let org = Uuid::new_v4();
        let approver = fixtures::actor(&fixtures::approver(org));
        let master = fixtures::actor(&fixtures::master());
        let caf = fixtures::caf(&fixtures::staff(org), CafStatus::Completed);

        assert!(!can_approve(&caf, &approver));
        assert!(!can_approve(&caf, &master));
    }

    #[test]
    fn can_approve_once_completion_is_signed() {
        let org = Uuid::new_v4();
        let assignee = fixtures::signer(org);
        let mut caf = fixtures::caf(&assignee, CafStatus::Completed);
        caf.signatures.push(fixtures::completion_signature(&assignee));

        assert!(can_approve(&caf, &fixtures::actor(&fixtures::approver(org))));
        assert!(!can_approve(&caf, &fixtures::actor(&assignee)));
    }

    #[test]
    fn outsiders_get_no_permissions() {
        let assignee = fixtures::signer(Uuid::new_v4());
        let mut outsider = fixtures::approver(Uuid::new_v4());
        outsider.can_sign_cafs = true;
        let mut caf = fixtures::caf(&assignee, CafStatus::Completed);
        caf.signatures.push(fixtures::completion_signature(&assignee));

        let permissions = Permissions::evaluate(&caf, &fixtures::actor(&outsider));

        assert_eq!(
            permissions,
            Permissions {
                can_start_work: false,
                can_complete: false,
                can_sign: false,
                can_approve: false,
                can_close: false,
                can_link_maintenance: false,
            }
        );
    }

    #[test]
    fn maintenance_link_offered_once() {
        let assignee = fixtures::staff(Uuid::new_v4());
        let actor = fixtures::actor(&assignee);
        let mut caf = fixtures::caf(&assignee, CafStatus::InProgress);
        assert!(can_link_maintenance(&caf, &actor));

        caf.maintenance_issue_id = Some(Uuid::new_v4());

        assert!(!can_link_maintenance(&caf, &actor));
    }

    #[test]
    fn link_predicate_agrees_with_work_order_planning() {
        let org = Uuid::new_v4();
        let assignee = fixtures::staff(org);
        let actors = [
            fixtures::actor(&assignee),
            fixtures::actor(&fixtures::approver(org)),
            fixtures::actor(&fixtures::approver(Uuid::new_v4())),
            fixtures::actor(&fixtures::master()),
        ];
        let request = MaintenanceRequest {
            equipment_id: Some(Uuid::new_v4()),
            ..MaintenanceRequest::default()
        };

        for status in CafStatus::ALL {
            for linked in [None, Some(Uuid::new_v4())] {
                let mut caf = fixtures::caf(&assignee, status);
                caf.equipment_id = None;
                caf.maintenance_issue_id = linked;
                for actor in &actors {
                    let planned = plan_work_order(&caf, actor, &request, Timestamp::now());
                    assert_eq!(
                        can_link_maintenance(&caf, actor),
                        planned.is_ok(),
                        "{status} linked={linked:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn predicates_agree_with_transitions() {
        let org = Uuid::new_v4();
        let assignee = fixtures::signer(org);
        let actors = [
            fixtures::actor(&assignee),
            fixtures::actor(&fixtures::approver(org)),
            fixtures::actor(&fixtures::staff(org)),
            fixtures::actor(&fixtures::master()),
        ];

        for status in CafStatus::ALL {
            let mut caf = fixtures::caf(&assignee, status);
            caf.signatures.push(fixtures::completion_signature(&assignee));
            for actor in &actors {
                let allowed = |to| {
                    change_status(&caf, to, actor, Some("done"), Timestamp::now()).is_ok()
                };
                assert_eq!(
                    can_start_work(&caf, actor),
                    allowed(CafStatus::InProgress)
                );
                assert_eq!(can_complete(&caf, actor), allowed(CafStatus::Completed));
                assert_eq!(can_approve(&caf, actor), allowed(CafStatus::Approved));
                if Edge::between(status, CafStatus::Cancelled).is_some() {
                    assert_eq!(can_close(&caf, actor), allowed(CafStatus::Cancelled));
                }
            }
        }
    }
}
