//! Identity and database resolution for fleetcaf commands.
//!
//! Every command that acts on a CAF needs to know which staff member is acting.
//! Rather than requiring `--as` on every invocation, identity is resolved through a chain:
//!
//! 1. `--as <staff-id>`: explicit per-command override
//! 2. `FLEETCAF_STAFF` env var: process/session level
//! 3. `staff` in `~/.fleetcaf/config.toml`: default for single-user machines
//!
//! The database path resolves the same way from `--db`, then `database` in
//! the config file, then `~/.fleetcaf/fleetcaf.sqlite`.

use std::{env, path::PathBuf};

use uuid::Uuid;

use crate::config::Config;
use crate::storage::Storage;

/// Error message shown when identity cannot be resolved.
pub const IDENTITY_REQUIRED: &str = "staff identity required: pass --as <staff-id>, \
    set FLEETCAF_STAFF, or add `staff = \"...\"` to ~/.fleetcaf/config.toml";

/// Resolve the acting staff id from the tiered resolution chain.
pub fn resolve_staff(explicit: Option<&str>, config: &Config) -> Result<Uuid, String> {
    let from_env = env::var("FLEETCAF_STAFF").ok();
    resolve_staff_from(explicit, from_env.as_deref(), config)
}

fn resolve_staff_from(
    explicit: Option<&str>,
    from_env: Option<&str>,
    config: &Config,
) -> Result<Uuid, String> {
    let (source, value) = if let Some(id) = explicit {
        ("--as", id)
    } else if let Some(id) = from_env
        && !id.is_empty()
    {
        ("FLEETCAF_STAFF", id)
    } else if let Some(id) = config.staff.as_deref()
        && !id.is_empty()
    {
        ("config staff", id)
    } else {
        return Err(IDENTITY_REQUIRED.to_string());
    };

    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid staff id from {source}: {e}"))
}

/// Resolve the database path: `--db`, then config, then the default location.
pub fn resolve_database(explicit: Option<PathBuf>, config: &Config) -> Result<PathBuf, String> {
    explicit
        .or_else(|| config.database.clone())
        .or_else(Storage::default_path)
        .ok_or_else(|| "could not determine home directory; pass --db <path>".to_string())
}
