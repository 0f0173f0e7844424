//! `fleetcaf staff` commands.

use uuid::Uuid;

use crate::model::Staff;
use crate::storage::Storage;

use super::StaffCommand;
use super::format::format_staff_line;

pub(super) fn run(storage: &Storage, command: StaffCommand) -> Result<(), String> {
    match command {
        StaffCommand::Add {
            org,
            name,
            user_type,
            can_sign,
            can_approve,
        } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("staff name cannot be empty".to_string());
            }
            let staff = Staff {
                id: Uuid::new_v4(),
                organization_id: org,
                name: name.to_string(),
                user_type: user_type.to_domain(),
                can_sign_cafs: can_sign,
                can_approve_cafs: can_approve,
            };
            cmd_add(storage, &staff)
        }
        StaffCommand::List { org } => cmd_list(storage, org),
    }
}

fn cmd_add(storage: &Storage, staff: &Staff) -> Result<(), String> {
    storage
        .create_staff(staff)
        .map_err(|e| format!("failed to add staff member: {e}"))?;
    tracing::info!(staff = %staff.id, organization = %staff.organization_id, "added staff member");

    println!("{}", staff.id);
    Ok(())
}

fn cmd_list(storage: &Storage, organization_id: Option<Uuid>) -> Result<(), String> {
    let staff = storage
        .list_staff(organization_id)
        .map_err(|e| format!("failed to list staff: {e}"))?;

    if staff.is_empty() {
        println!("No staff");
        return Ok(());
    }

    for s in &staff {
        println!("{}", format_staff_line(s));
    }
    Ok(())
}
