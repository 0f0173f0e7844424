//! `fleetcaf caf` commands.

use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use crate::desk::{Desk, SignatureInput};
use crate::model::{
    CafStatus, CorrectiveActionForm, IncidentRef, MaintenanceRequest, NewCaf, SignatureType,
};
use crate::workflow::Actor;

use super::format::{format_caf_line, format_event, format_permissions, short_id};
use super::{CafCommand, FormatArg, NewCafArgs};

pub(super) fn run(desk: &Desk<'_>, actor: &Actor, command: CafCommand) -> Result<(), String> {
    match command {
        CafCommand::New(args) => cmd_new(desk, actor, args),
        CafCommand::List { status } => cmd_list(desk, actor, status.map(|s| s.to_domain())),
        CafCommand::Show { reference } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_show(desk, actor, &caf)
        }
        CafCommand::Start { reference } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_transition(desk, actor, &caf, CafStatus::InProgress, None)
        }
        CafCommand::Complete { reference, notes } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_transition(desk, actor, &caf, CafStatus::Completed, Some(&notes))
        }
        CafCommand::Reject { reference, notes } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_transition(desk, actor, &caf, CafStatus::Rejected, notes.as_deref())
        }
        CafCommand::Cancel { reference, notes } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_transition(desk, actor, &caf, CafStatus::Cancelled, notes.as_deref())
        }
        CafCommand::Sign {
            reference,
            signature,
            notes,
            complete,
        } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            let input = SignatureInput {
                digital_signature: &signature,
                notes: notes.as_deref(),
            };
            cmd_sign(desk, actor, &caf, input, complete.as_deref())
        }
        CafCommand::Approve {
            reference,
            signature,
            notes,
        } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            let input = signature.as_deref().map(|s| SignatureInput {
                digital_signature: s,
                notes: notes.as_deref(),
            });
            cmd_approve(desk, actor, &caf, input)
        }
        CafCommand::Maintenance {
            reference,
            description,
            assign,
            priority,
            due,
            equipment,
        } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            let request = MaintenanceRequest {
                equipment_id: equipment,
                priority: priority.map(|p| p.to_domain()),
                description,
                due_date: due,
                assigned_staff_id: assign,
            };
            cmd_maintenance(desk, actor, &caf, &request)
        }
        CafCommand::Export {
            reference,
            format,
            out,
        } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_export(desk, actor, &caf, format, out)
        }
        CafCommand::History { reference } => {
            let caf = resolve_caf(desk, actor, &reference)?;
            cmd_history(desk, &caf)
        }
    }
}

fn cmd_new(desk: &Desk<'_>, actor: &Actor, args: NewCafArgs) -> Result<(), String> {
    let new = NewCaf {
        organization_id: args.org.unwrap_or(actor.organization_id),
        incident: IncidentRef {
            kind: args.incident_kind.to_domain(),
            id: args.incident,
        },
        violation_type: args.violation_type.to_domain(),
        violation_codes: args
            .codes
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect(),
        violation_summary: args.summary,
        category: args.category.to_domain(),
        priority: args.priority.to_domain(),
        title: args.title.trim().to_string(),
        description: args.description,
        assigned_staff_id: args.assign,
        equipment_id: args.equipment,
        due_date: args.due,
    };

    let caf = desk
        .create_caf(&new, actor)
        .map_err(|e| format!("failed to create CAF: {e}"))?;

    println!("{}  {}", caf.caf_number, caf.id);
    Ok(())
}

fn cmd_list(desk: &Desk<'_>, actor: &Actor, status: Option<CafStatus>) -> Result<(), String> {
    let cafs = desk
        .list(actor, status)
        .map_err(|e| format!("failed to list CAFs: {e}"))?;

    if cafs.is_empty() {
        println!("No CAFs");
        return Ok(());
    }

    for caf in &cafs {
        println!("{}", format_caf_line(caf));
    }
    Ok(())
}

fn cmd_show(desk: &Desk<'_>, actor: &Actor, caf: &CorrectiveActionForm) -> Result<(), String> {
    let permissions = desk
        .permissions(caf.id, actor)
        .map_err(|e| format!("failed to evaluate permissions: {e}"))?;

    let maintenance = desk
        .maintenance(caf.id)
        .map_err(|e| format!("failed to load work order: {e}"))?;

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "caf": caf,
        "permissions": permissions,
        "maintenanceIssue": maintenance,
    }))
    .map_err(|e| format!("failed to serialize CAF: {e}"))?;

    println!("{json}");
    eprintln!("You may: {}", format_permissions(&permissions));
    Ok(())
}

fn cmd_transition(
    desk: &Desk<'_>,
    actor: &Actor,
    caf: &CorrectiveActionForm,
    to: CafStatus,
    notes: Option<&str>,
) -> Result<(), String> {
    let updated = desk
        .change_status(caf.id, to, actor, notes)
        .map_err(|e| format!("failed to update {}: {e}", caf.caf_number))?;

    eprintln!("{} {} → {}", updated.caf_number, caf.status, updated.status);
    Ok(())
}

fn cmd_sign(
    desk: &Desk<'_>,
    actor: &Actor,
    caf: &CorrectiveActionForm,
    signature: SignatureInput<'_>,
    complete: Option<&str>,
) -> Result<(), String> {
    let updated = match complete {
        Some(completion_notes) => desk.complete_and_sign(caf.id, actor, completion_notes, signature),
        None => desk.sign(
            caf.id,
            SignatureType::Completion,
            actor,
            signature.digital_signature,
            signature.notes,
        ),
    }
    .map_err(|e| format!("failed to sign {}: {e}", caf.caf_number))?;

    eprintln!(
        "{} signed [{}], {} signature(s) on record",
        updated.caf_number,
        updated.status,
        updated.signatures.len()
    );
    Ok(())
}

fn cmd_approve(
    desk: &Desk<'_>,
    actor: &Actor,
    caf: &CorrectiveActionForm,
    signature: Option<SignatureInput<'_>>,
) -> Result<(), String> {
    let updated = desk
        .approve(caf.id, actor, signature)
        .map_err(|e| format!("failed to approve {}: {e}", caf.caf_number))?;

    eprintln!("{} approved", updated.caf_number);
    Ok(())
}

fn cmd_maintenance(
    desk: &Desk<'_>,
    actor: &Actor,
    caf: &CorrectiveActionForm,
    request: &MaintenanceRequest,
) -> Result<(), String> {
    let (_, issue) = desk
        .link_maintenance(caf.id, actor, request)
        .map_err(|e| format!("failed to create work order for {}: {e}", caf.caf_number))?;

    println!("{}", issue.id);
    eprintln!(
        "Work order {} linked to {} [{}]",
        short_id(issue.id),
        caf.caf_number,
        issue.priority.as_str()
    );
    Ok(())
}

fn cmd_export(
    desk: &Desk<'_>,
    actor: &Actor,
    caf: &CorrectiveActionForm,
    format: FormatArg,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let document = desk
        .export_pdf(caf.id, actor, format.to_domain())
        .map_err(|e| format!("failed to export {}: {e}", caf.caf_number))?;

    let path = out.unwrap_or_else(|| PathBuf::from(&document.filename));
    fs::write(&path, &document.bytes)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;

    eprintln!("Exported {} → {}", caf.caf_number, path.display());
    Ok(())
}

fn cmd_history(desk: &Desk<'_>, caf: &CorrectiveActionForm) -> Result<(), String> {
    let events = desk
        .history(caf.id)
        .map_err(|e| format!("failed to load history: {e}"))?;

    for event in &events {
        println!("{}", format_event(event));
    }
    Ok(())
}

/// Resolve a CAF reference (full UUID, CAF number, or unambiguous id prefix).
///
/// Only CAFs the actor can see are considered.
fn resolve_caf(
    desk: &Desk<'_>,
    actor: &Actor,
    reference: &str,
) -> Result<CorrectiveActionForm, String> {
    let reference = reference.trim();

    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return desk
            .caf_for(id, actor)
            .map_err(|e| format!("CAF not found: {e}"));
    }

    let candidates = if looks_like_number(reference) {
        desk.find_by_number(actor, reference)
    } else {
        desk.list(actor, None)
    }
    .map_err(|e| format!("failed to look up CAFs: {e}"))?;
    select_caf(&candidates, reference).cloned()
}

fn looks_like_number(reference: &str) -> bool {
    reference
        .get(..4)
        .is_some_and(|p| p.eq_ignore_ascii_case("CAF-"))
}

fn select_caf<'a>(
    cafs: &'a [CorrectiveActionForm],
    reference: &str,
) -> Result<&'a CorrectiveActionForm, String> {
    let by_number: Vec<&CorrectiveActionForm> = cafs
        .iter()
        .filter(|c| c.caf_number.eq_ignore_ascii_case(reference))
        .collect();
    let matches: Vec<&CorrectiveActionForm> = if by_number.is_empty() {
        let prefix = reference.to_ascii_lowercase();
        cafs.iter()
            .filter(|c| !prefix.is_empty() && c.id.to_string().starts_with(&prefix))
            .collect()
    } else {
        by_number
    };

    match matches.len() {
        0 => Err(format!("no CAF matching '{reference}'")),
        1 => Ok(matches[0]),
        n => {
            let ids: Vec<String> = matches.iter().map(|c| short_id(c.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} CAFs: {}",
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fixtures;

    fn two_cafs() -> Vec<CorrectiveActionForm> {
        let assignee = fixtures::staff(Uuid::new_v4());
        let first = fixtures::caf(&assignee, CafStatus::Assigned);
        let mut second = fixtures::caf(&assignee, CafStatus::Assigned);
        second.caf_number = "CAF-00002".into();
        vec![first, second]
    }

    #[test]
    fn selects_by_number_case_insensitively() {
        let cafs = two_cafs();

        let selected = select_caf(&cafs, "caf-00002").unwrap();

        assert_eq!(selected.id, cafs[1].id);
    }

    #[test]
    fn selects_by_unique_prefix() {
        let cafs = two_cafs();
        let prefix = &cafs[0].id.to_string()[..8];

        let selected = select_caf(&cafs, prefix).unwrap();

        assert_eq!(selected.id, cafs[0].id);
    }

    #[test]
    fn numbers_shared_across_organizations_are_ambiguous() {
        let mut cafs = two_cafs();
        cafs[1].caf_number = "CAF-00001".into();

        let err = select_caf(&cafs, "CAF-00001").unwrap_err();

        assert!(err.contains("ambiguous"));
    }

    #[test]
    fn numbers_are_recognized_by_prefix() {
        assert!(looks_like_number("CAF-00012"));
        assert!(looks_like_number("caf-7"));
        assert!(!looks_like_number("ca"));
        assert!(!looks_like_number("a3b0fc12"));
    }

    #[test]
    fn unknown_reference_fails() {
        let cafs = two_cafs();

        let err = select_caf(&cafs, "zzz").unwrap_err();

        assert_eq!(err, "no CAF matching 'zzz'");
    }
}
