//! Staff members and their CAF capabilities.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseLabelError;

/// A staff member of an organization.
///
/// Capability flags are per-staff and independent of any CAF's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub user_type: UserType,
    pub can_sign_cafs: bool,
    pub can_approve_cafs: bool,
}

/// Tier of the account in the organization hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    /// Top-level tenant with cross-organization visibility.
    Master,
    Organization,
    Location,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Organization => "ORGANIZATION",
            Self::Location => "LOCATION",
        }
    }
}

impl FromStr for UserType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(Self::Master),
            "ORGANIZATION" => Ok(Self::Organization),
            "LOCATION" => Ok(Self::Location),
            other => Err(ParseLabelError::new("user type", other)),
        }
    }
}
