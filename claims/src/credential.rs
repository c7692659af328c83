//! W3C verifiable-credential envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sigil_smt::ProofWire;

use crate::{ClaimRecord, CoreClaim, CredentialStatus};

/// Proof type of the auth-claim signature proof
pub const BJJ_SIGNATURE_PROOF_TYPE: &str = "BJJSignature2021";

/// Proof type of the Merkle inclusion proof
pub const SPARSE_MERKLE_PROOF_TYPE: &str = "Iden3SparseMerkleProof";

const W3C_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
const IDEN3_PROOFS_CONTEXT: &str = "https://schema.iden3.io/core/jsonld/iden3proofs.jsonld";
const SCHEMA_VALIDATOR_TYPE: &str = "JsonSchemaValidator2018";

/// Issuer state snapshot attached to proofs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerState {
    /// State hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Claims tree root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims_tree_root: Option<String>,
    /// Revocations tree root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_tree_root: Option<String>,
    /// Roots tree root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_of_roots: Option<String>,
}

/// Issuer-side data attached to proofs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerData {
    /// Issuer identifier
    pub id: String,
    /// State snapshot at proof generation
    pub state: IssuerState,
    /// The issuer's auth claim (signature proofs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_claim: Option<CoreClaim>,
    /// Inclusion proof of the auth claim (signature proofs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtp: Option<ProofWire>,
    /// Revocation-status URL of the auth claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_status: Option<String>,
}

/// `BJJSignature2021` proof entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureProofEntry {
    /// Always `BJJSignature2021`
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Issuer data: auth claim, its inclusion proof, state
    pub issuer_data: IssuerData,
    /// Compressed signature over the claim's `h_index`, hex
    pub signature: String,
}

/// `Iden3SparseMerkleProof` proof entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtpProofEntry {
    /// Always `Iden3SparseMerkleProof`
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Issuer data: state at inclusion
    pub issuer_data: IssuerData,
    /// Inclusion proof in the Claims tree
    pub mtp: ProofWire,
}

/// Credential-schema descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    /// Schema document URL
    pub id: String,
    /// Validator type
    #[serde(rename = "type")]
    pub schema_type: String,
}

/// W3C credential document returned by `GetClaim`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD contexts
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Credential id (`h_index` hex)
    pub id: String,
    /// Type list
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// Issuer identifier
    pub issuer: String,
    /// RFC 3339 issuance time
    pub issuance_date: String,
    /// RFC 3339 expiration time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Subject fields plus `id` and `type`
    pub credential_subject: Value,
    /// Revocation-status descriptor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
    /// Schema descriptor
    pub credential_schema: CredentialSchema,
    /// Signature and Merkle proofs
    pub proof: Vec<Value>,
}

impl VerifiableCredential {
    /// Repackage a stored record as a credential document
    pub fn from_record(record: &ClaimRecord) -> Self {
        let mut subject = match &record.data {
            Value::Object(fields) => Value::Object(fields.clone()),
            other => json!({ "data": other }),
        };
        if let Value::Object(fields) = &mut subject {
            if let Ok(Some(subject_id)) = record.core_claim.subject_id() {
                fields.insert("id".to_string(), json!(subject_id.to_hex()));
            }
            fields.insert("type".to_string(), json!(record.schema_type));
        }

        let mut proof = Vec::new();
        if let Some(signature_proof) = &record.signature_proof {
            proof.push(signature_proof.clone());
        }
        if let Some(mtp_proof) = &record.mtp_proof {
            proof.push(mtp_proof.clone());
        }

        Self {
            context: vec![W3C_CONTEXT.to_string(), IDEN3_PROOFS_CONTEXT.to_string()],
            id: record.id.clone(),
            types: vec!["VerifiableCredential".to_string(), record.schema_type.clone()],
            issuer: record.issuer.clone(),
            issuance_date: rfc3339(record.created_at),
            expiration_date: record.expiration.map(rfc3339),
            credential_subject: subject,
            credential_status: record.credential_status.clone(),
            credential_schema: CredentialSchema {
                id: record.schema_url.clone(),
                schema_type: SCHEMA_VALIDATOR_TYPE.to_string(),
            },
            proof,
        }
    }
}

fn rfc3339(unix_seconds: u64) -> String {
    DateTime::<Utc>::from_timestamp(unix_seconds as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
}
