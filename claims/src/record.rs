//! Database shape of an issued claim

use serde::{Deserialize, Serialize};

use crate::{CoreClaim, SubjectPosition};

/// Type name of the revocation-status descriptor
pub const CREDENTIAL_STATUS_TYPE: &str = "SparseMerkleTreeProof";

/// Revocation-status descriptor embedded in issued credentials
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// Resolution URL for the revocation proof
    pub id: String,
    /// Descriptor type
    #[serde(rename = "type")]
    pub status_type: String,
    /// Nonce to query
    pub revocation_nonce: u64,
}

impl CredentialStatus {
    /// Build the descriptor for a revocation nonce served under `base_url`
    pub fn new(base_url: &str, revocation_nonce: u64) -> Self {
        Self {
            id: format!(
                "{}/api/v1/claims/revocation/status/{}",
                base_url.trim_end_matches('/'),
                revocation_nonce
            ),
            status_type: CREDENTIAL_STATUS_TYPE.to_string(),
            revocation_nonce,
        }
    }
}

/// Stored record of an issued claim
///
/// The record is keyed by the claim's `h_index` hex and carries everything
/// needed to re-issue the credential document without recomputing proofs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Record key: `h_index` hex
    pub id: String,
    /// Identity owning the record
    pub identifier: String,
    /// Issuer identifier (same as `identifier` for self-issued)
    pub issuer: String,
    /// Schema document URL
    pub schema_url: String,
    /// Credential type
    pub schema_type: String,
    /// The eight-slot core claim
    pub core_claim: CoreClaim,
    /// Subject placement
    pub subject_position: SubjectPosition,
    /// Revocation nonce
    pub revocation_nonce: u64,
    /// Claim version
    pub version: u32,
    /// Expiration (unix seconds)
    pub expiration: Option<u64>,
    /// Original request data
    pub data: serde_json::Value,
    /// Signature proof blob (absent on the auth claim)
    pub signature_proof: Option<serde_json::Value>,
    /// Merkle-tree proof blob
    pub mtp_proof: Option<serde_json::Value>,
    /// Revocation-status descriptor
    pub credential_status: Option<CredentialStatus>,
    /// Creation time (unix seconds)
    pub created_at: u64,
}
