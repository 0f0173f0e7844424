//! Signatures: append-only attestations on a CAF.

use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::ParseLabelError;

/// A digital signature recorded against a CAF.
///
/// Never edited or removed once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: Uuid,
    pub signature_type: SignatureType,

    /// The signer.
    pub staff_id: Uuid,

    /// Opaque payload captured from the signer.
    pub digital_signature: String,

    pub signed_at: Timestamp,
    pub notes: Option<String>,
}

impl Signature {
    /// Hex SHA-256 of the payload, safe to print where the payload itself is not.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.digital_signature.as_bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureType {
    /// The work is done.
    Completion,
    /// The work is accepted.
    Approval,
}

impl SignatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completion => "COMPLETION",
            Self::Approval => "APPROVAL",
        }
    }
}

impl FromStr for SignatureType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLETION" => Ok(Self::Completion),
            "APPROVAL" => Ok(Self::Approval),
            other => Err(ParseLabelError::new("signature type", other)),
        }
    }
}
