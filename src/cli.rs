//! CLI interface for fleetcaf.
//!
//! Each subcommand is non-interactive: arguments in, plain text or JSON out.
//!
//! Commands split into two groups:
//!
//! - `fleetcaf staff add|list`: roster management, no acting identity needed.
//! - `fleetcaf caf <command>`: everything else, performed as the acting staff member.
//!
//! CAF references take a full UUID, a CAF number (`CAF-00012`), or an
//! unambiguous id prefix.

mod caf;
mod format;
mod staff;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::civil::Date;
use uuid::Uuid;

use crate::config::Config;
use crate::desk::Desk;
use crate::identity;
use crate::model::{CafCategory, CafStatus, IncidentKind, Priority, UserType, ViolationType};
use crate::pdf::PdfFormat;
use crate::storage::Storage;

/// fleetcaf: corrective action forms for fleet compliance.
#[derive(Debug, Parser)]
#[command(name = "fleetcaf", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Acting staff id. Falls back to `FLEETCAF_STAFF`, then `staff` in the config file.
    #[arg(long = "as", global = true)]
    pub staff: Option<String>,

    /// Path to the SQLite database.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log filter, e.g. `info` or `fleetcaf=debug`. Logs go to stderr.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: closing out a roadside inspection
  1. fleetcaf caf new --incident-kind roadside-inspection --incident <id> \
       --violation-type equipment --code 393.47 --category equipment-maintenance \
       --priority high --assign <staff> --equipment <unit> --title "Repair brakes"
     → prints the CAF number and id
  2. fleetcaf caf start CAF-00001
  3. fleetcaf caf sign CAF-00001 --signature <payload> --complete "Adjusted slack"
  4. fleetcaf --as <approver> caf approve CAF-00001 --signature <payload>

Work orders and documents:
  fleetcaf caf maintenance CAF-00001 --priority critical
  fleetcaf caf export CAF-00001 --format completed"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the staff roster.
    Staff {
        #[command(subcommand)]
        command: StaffCommand,
    },

    /// Work with corrective action forms.
    Caf {
        #[command(subcommand)]
        command: CafCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Add a staff member. Prints the new staff id.
    Add {
        /// Organization the staff member belongs to.
        #[arg(long)]
        org: Uuid,

        /// Display name.
        #[arg(long)]
        name: String,

        #[arg(long, value_enum, default_value = "organization")]
        user_type: UserTypeArg,

        /// May sign CAFs for completion.
        #[arg(long)]
        can_sign: bool,

        /// May approve, reject, and cancel CAFs.
        #[arg(long)]
        can_approve: bool,
    },

    /// List staff, optionally for one organization.
    List {
        #[arg(long)]
        org: Option<Uuid>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CafCommand {
    /// Open a CAF for a violation. Prints the CAF number and id.
    New(NewCafArgs),

    /// List CAFs in your organization (all organizations for master tier).
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show a CAF as JSON, with what you may currently do with it.
    Show { reference: String },

    /// Start work on a CAF assigned to you.
    Start { reference: String },

    /// Complete a CAF you are working on.
    Complete {
        reference: String,

        /// What was done to correct the violation.
        #[arg(long)]
        notes: String,
    },

    /// Sign a CAF for completion.
    ///
    /// With `--complete`, completes an in-progress CAF and signs it in one step.
    Sign {
        reference: String,

        /// Signature payload, e.g. a `data:image/png;base64,...` URL.
        #[arg(long)]
        signature: String,

        /// Notes recorded with the signature.
        #[arg(long)]
        notes: Option<String>,

        /// Complete the CAF with these notes before signing.
        #[arg(long, value_name = "COMPLETION_NOTES")]
        complete: Option<String>,
    },

    /// Approve a completed, signed CAF.
    Approve {
        reference: String,

        /// Approval signature payload. Recorded alongside the approval.
        #[arg(long)]
        signature: Option<String>,

        /// Notes recorded with the approval signature.
        #[arg(long, requires = "signature")]
        notes: Option<String>,
    },

    /// Reject a CAF.
    Reject {
        reference: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Cancel a CAF.
    Cancel {
        reference: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Create and link the maintenance work order for an equipment CAF.
    ///
    /// Unset options default to the CAF's own values.
    Maintenance {
        reference: String,

        #[arg(long)]
        description: Option<String>,

        /// Staff member to assign the work order to.
        #[arg(long)]
        assign: Option<Uuid>,

        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,

        #[arg(long)]
        due: Option<Date>,

        /// Equipment to repair, when the CAF does not name one.
        #[arg(long)]
        equipment: Option<Uuid>,
    },

    /// Export a CAF as PDF.
    Export {
        reference: String,

        #[arg(long, value_enum)]
        format: FormatArg,

        /// Output path. Defaults to the document's filename in the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show a CAF's history, oldest first.
    History { reference: String },
}

#[derive(Debug, clap::Args)]
pub struct NewCafArgs {
    /// Organization to open the CAF in. Defaults to your own.
    #[arg(long)]
    pub org: Option<Uuid>,

    #[arg(long, value_enum)]
    pub incident_kind: IncidentKindArg,

    /// The accident or roadside inspection record the violation came from.
    #[arg(long)]
    pub incident: Uuid,

    #[arg(long, value_enum)]
    pub violation_type: ViolationTypeArg,

    /// Violation code. Repeat for several.
    #[arg(long = "code", required = true)]
    pub codes: Vec<String>,

    /// Short description of the violation.
    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long, value_enum)]
    pub category: CategoryArg,

    #[arg(long, value_enum, default_value = "medium")]
    pub priority: PriorityArg,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Staff member responsible for the corrective action.
    #[arg(long)]
    pub assign: Uuid,

    /// Equipment involved, for equipment-related violations.
    #[arg(long)]
    pub equipment: Option<Uuid>,

    #[arg(long)]
    pub due: Option<Date>,
}

/// CLI-facing status, mapped to the domain `CafStatus`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Assigned,
    InProgress,
    Completed,
    Approved,
    Rejected,
    Cancelled,
}

impl StatusArg {
    fn to_domain(self) -> CafStatus {
        match self {
            Self::Assigned => CafStatus::Assigned,
            Self::InProgress => CafStatus::InProgress,
            Self::Completed => CafStatus::Completed,
            Self::Approved => CafStatus::Approved,
            Self::Rejected => CafStatus::Rejected,
            Self::Cancelled => CafStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityArg {
    fn to_domain(self) -> Priority {
        match self {
            Self::Low => Priority::Low,
            Self::Medium => Priority::Medium,
            Self::High => Priority::High,
            Self::Critical => Priority::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    EquipmentMaintenance,
    DriverTraining,
    DriverQualification,
    HoursOfService,
    Documentation,
    Other,
}

impl CategoryArg {
    fn to_domain(self) -> CafCategory {
        match self {
            Self::EquipmentMaintenance => CafCategory::EquipmentMaintenance,
            Self::DriverTraining => CafCategory::DriverTraining,
            Self::DriverQualification => CafCategory::DriverQualification,
            Self::HoursOfService => CafCategory::HoursOfService,
            Self::Documentation => CafCategory::Documentation,
            Self::Other => CafCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViolationTypeArg {
    Driver,
    Equipment,
    Company,
}

impl ViolationTypeArg {
    fn to_domain(self) -> ViolationType {
        match self {
            Self::Driver => ViolationType::Driver,
            Self::Equipment => ViolationType::Equipment,
            Self::Company => ViolationType::Company,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IncidentKindArg {
    Accident,
    RoadsideInspection,
}

impl IncidentKindArg {
    fn to_domain(self) -> IncidentKind {
        match self {
            Self::Accident => IncidentKind::Accident,
            Self::RoadsideInspection => IncidentKind::RoadsideInspection,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UserTypeArg {
    Master,
    Organization,
    Location,
}

impl UserTypeArg {
    fn to_domain(self) -> UserType {
        match self {
            Self::Master => UserType::Master,
            Self::Organization => UserType::Organization,
            Self::Location => UserType::Location,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Blank template to fill in by hand.
    Fillable,
    /// Populated with the CAF's data and signatures.
    Completed,
}

impl FormatArg {
    fn to_domain(self) -> PdfFormat {
        match self {
            Self::Fillable => PdfFormat::Fillable,
            Self::Completed => PdfFormat::Completed,
        }
    }
}

/// Run a parsed command line, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    match cli.command {
        Command::Staff { command } => staff::run(storage, command),
        Command::Caf { command } => {
            let staff_id = identity::resolve_staff(cli.staff.as_deref(), config)?;
            let desk = Desk::new(storage);
            let actor = desk
                .actor(staff_id)
                .map_err(|e| format!("failed to resolve acting staff: {e}"))?;
            caf::run(&desk, &actor, command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fleetcaf",
            "caf",
            "start",
            "CAF-00001",
            "--as",
            "5f0c1a52-8a4e-4c7e-9a57-2b1f0f7e7a11",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(
            cli.staff.as_deref(),
            Some("5f0c1a52-8a4e-4c7e-9a57-2b1f0f7e7a11")
        );
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(
            cli.command,
            Command::Caf {
                command: CafCommand::Start { .. }
            }
        ));
    }

    #[test]
    fn sign_with_complete_parses_notes() {
        let cli = Cli::try_parse_from([
            "fleetcaf",
            "caf",
            "sign",
            "a3b",
            "--signature",
            "data:image/png;base64,iVBORw0KGgo=",
            "--complete",
            "Adjusted slack",
        ])
        .unwrap();

        let Command::Caf {
            command: CafCommand::Sign { complete, .. },
        } = cli.command
        else {
            panic!("expected caf sign");
        };
        assert_eq!(complete.as_deref(), Some("Adjusted slack"));
    }

    #[test]
    fn approval_notes_require_signature() {
        let result = Cli::try_parse_from(["fleetcaf", "caf", "approve", "a3b", "--notes", "ok"]);
        assert!(result.is_err());
    }
}
