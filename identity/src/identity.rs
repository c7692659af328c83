//! The issuer identity
//!
//! Owns the signer, the identifier, and the auth-claim pointer; every
//! operator-surface operation routes through here. Genesis runs once per
//! store: the auth claim binds the public key into the Claims tree, the
//! genesis state fixes the identifier, and both persist for later restarts.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use sigil_babyjub::{PrivateKey, Signature};
use sigil_claims::{
    ClaimRecord, CoreClaim, CoreClaimData, CredentialStatus, Identifier, IssuerData, IssuerState,
    MtpProofEntry, SignatureProofEntry, SubjectPosition, VerifiableCredential,
    AUTH_BJJ_CREDENTIAL_TYPE, AUTH_BJJ_CREDENTIAL_URL, BJJ_SIGNATURE_PROOF_TYPE,
    SPARSE_MERKLE_PROOF_TYPE, TYPE_DEFAULT,
};
use sigil_hash::{fr_to_hex, Fr};
use sigil_schema::SchemaProcessor;
use sigil_smt::ProofWire;
use sigil_store::CancelToken;

use crate::engine::genesis_state_hash;
use crate::{IdentityResult, StateEngine, StateSnapshot};

/// Claim issuance request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateClaimRequest {
    /// Schema document URL
    pub schema_url: String,
    /// Credential type declared by the schema
    pub schema_type: String,
    /// Claim data fields
    pub data: serde_json::Value,
    /// Subject identifier (hex), if the claim is about someone
    pub subject_id: Option<String>,
    /// Subject placement
    pub subject_position: SubjectPosition,
    /// Expiration (unix seconds)
    pub expiration: Option<u64>,
    /// Claim version
    pub version: u32,
    /// Revocation nonce, unique per issuer
    pub revocation_nonce: u64,
}

/// Claim issuance response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateClaimResponse {
    /// Record key of the issued claim (`h_index` hex)
    pub id: String,
}

/// Full identity state view
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStateView {
    /// Issuer identifier
    pub identifier: String,
    /// State hash
    pub state: String,
    /// Claims tree root
    pub claims_tree_root: String,
    /// Revocations tree root
    pub revocation_tree_root: String,
    /// Roots tree root
    pub root_of_roots: String,
}

/// Revocation status response
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatus {
    /// Proof against the Revocations tree; existence means revoked
    pub mtp: ProofWire,
    /// Issuer state the proof was generated against
    pub issuer: IssuerState,
}

/// A self-sovereign issuer identity
pub struct Identity {
    signer: PrivateKey,
    identifier: Identifier,
    auth_claim_id: String,
    base_url: String,
    engine: Arc<StateEngine>,
    schema: Arc<SchemaProcessor>,
}

impl Identity {
    /// Open or create the identity on the given engine
    ///
    /// A store that already holds an identifier is restored as-is;
    /// otherwise genesis runs and persists one.
    pub fn new(
        engine: Arc<StateEngine>,
        signer: PrivateKey,
        base_url: &str,
        schema: Arc<SchemaProcessor>,
    ) -> IdentityResult<Self> {
        if let Some((identifier, auth_claim_id)) = engine.load_identity()? {
            debug!(identifier = %identifier, "restored existing identity");
            return Ok(Self {
                signer,
                identifier,
                auth_claim_id,
                base_url: base_url.trim_end_matches('/').to_string(),
                engine,
                schema,
            });
        }

        let (identifier, auth_claim_id) = Self::genesis(&engine, &signer, base_url)?;
        engine.save_identity(&identifier, &auth_claim_id)?;
        debug!(identifier = %identifier, "created genesis identity");

        Ok(Self {
            signer,
            identifier,
            auth_claim_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            engine,
            schema,
        })
    }

    /// Issuer identifier
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Insert the auth claim and derive the identifier from the genesis state
    fn genesis(
        engine: &StateEngine,
        signer: &PrivateKey,
        base_url: &str,
    ) -> IdentityResult<(Identifier, String)> {
        let pk = signer.public();
        let auth_claim = CoreClaim::new_auth(&pk.x, &pk.y)?;

        let record = ClaimRecord {
            id: String::new(),
            identifier: String::new(),
            issuer: String::new(),
            schema_url: AUTH_BJJ_CREDENTIAL_URL.to_string(),
            schema_type: AUTH_BJJ_CREDENTIAL_TYPE.to_string(),
            core_claim: auth_claim,
            subject_position: SubjectPosition::None,
            revocation_nonce: 0,
            version: 0,
            expiration: None,
            data: json!({ "x": pk.x.to_string(), "y": pk.y.to_string() }),
            signature_proof: None,
            mtp_proof: None,
            credential_status: Some(CredentialStatus::new(base_url, 0)),
            created_at: unix_now(),
        };

        // The identifier derives from the genesis Claims root with the two
        // other trees taken as empty, so it is reproducible from the auth
        // claim alone.
        let mut genesis_claims_root = Fr::from(0u64);
        let hi = engine.insert_claim(&auth_claim, record, |record, proof, snapshot| {
            genesis_claims_root = snapshot.claims_root;
            record.mtp_proof = Some(json!(MtpProofEntry {
                proof_type: SPARSE_MERKLE_PROOF_TYPE.to_string(),
                issuer_data: IssuerData {
                    id: String::new(),
                    state: issuer_state(snapshot),
                    auth_claim: None,
                    mtp: None,
                    revocation_status: None,
                },
                mtp: proof.to_wire(),
            }));
        })?;

        let genesis_state = genesis_state_hash(genesis_claims_root)?;
        let identifier = Identifier::from_genesis(TYPE_DEFAULT, &genesis_state);

        // Stamp the issuer onto the persisted auth-claim record now that
        // the identifier exists.
        let auth_claim_id = fr_to_hex(&hi);
        let mut stored = engine.get_claim(&auth_claim_id)?;
        stored.identifier = identifier.to_hex();
        stored.issuer = identifier.to_hex();
        engine.update_claim_record(&stored)?;

        Ok((identifier, auth_claim_id))
    }

    /// Issue a credential
    ///
    /// Schema processing happens before any engine lock is taken.
    pub fn add_claim(
        &self,
        request: &CreateClaimRequest,
        cancel: &CancelToken,
    ) -> IdentityResult<CreateClaimResponse> {
        debug!(schema = %request.schema_url, credential_type = %request.schema_type, "add claim");

        let (slots, schema_hash) = self.schema.process(
            &request.schema_url,
            &request.schema_type,
            &request.data,
            cancel,
        )?;

        let subject_id = match &request.subject_id {
            Some(hex) => Some(Identifier::from_hex(hex)?),
            None => None,
        };

        let core_claim = CoreClaim::encode(&CoreClaimData {
            schema_hash,
            slots,
            subject_id,
            subject_position: request.subject_position,
            expiration: request.expiration,
            version: request.version,
            revocation_nonce: request.revocation_nonce,
        })?;

        let signature_proof = self.sign_claim_entry(&core_claim)?;

        let issuer_hex = self.identifier.to_hex();
        let record = ClaimRecord {
            id: String::new(),
            identifier: issuer_hex.clone(),
            issuer: issuer_hex,
            schema_url: request.schema_url.clone(),
            schema_type: request.schema_type.clone(),
            core_claim,
            subject_position: request.subject_position,
            revocation_nonce: request.revocation_nonce,
            version: request.version,
            expiration: request.expiration,
            data: request.data.clone(),
            signature_proof: Some(json!(signature_proof)),
            mtp_proof: None,
            credential_status: Some(CredentialStatus::new(
                &self.base_url,
                request.revocation_nonce,
            )),
            created_at: unix_now(),
        };

        let identifier_hex = self.identifier.to_hex();
        let hi = self
            .engine
            .insert_claim(&core_claim, record, |record, proof, snapshot| {
                record.mtp_proof = Some(json!(MtpProofEntry {
                    proof_type: SPARSE_MERKLE_PROOF_TYPE.to_string(),
                    issuer_data: IssuerData {
                        id: identifier_hex,
                        state: issuer_state(snapshot),
                        auth_claim: None,
                        mtp: None,
                        revocation_status: None,
                    },
                    mtp: proof.to_wire(),
                }));
            })?;

        Ok(CreateClaimResponse {
            id: fr_to_hex(&hi),
        })
    }

    /// Return an issued claim as a W3C credential document
    pub fn get_claim(&self, id: &str) -> IdentityResult<VerifiableCredential> {
        let record = self.engine.get_claim(id)?;
        Ok(VerifiableCredential::from_record(&record))
    }

    /// Return the stored record of an issued claim
    pub fn get_claim_record(&self, id: &str) -> IdentityResult<ClaimRecord> {
        self.engine.get_claim(id)
    }

    /// Identifier plus the full tree-root state
    pub fn get_identity(&self) -> IdentityResult<IdentityStateView> {
        let snapshot = self.engine.snapshot()?;

        Ok(IdentityStateView {
            identifier: self.identifier.to_hex(),
            state: fr_to_hex(&snapshot.state),
            claims_tree_root: fr_to_hex(&snapshot.claims_root),
            revocation_tree_root: fr_to_hex(&snapshot.revocations_root),
            root_of_roots: fr_to_hex(&snapshot.roots_root),
        })
    }

    /// Revocation proof for a nonce plus the issuer state it was taken at
    pub fn get_revocation_status(&self, nonce: u64) -> IdentityResult<RevocationStatus> {
        let (proof, snapshot) = self.engine.revocation_proof_with_snapshot(nonce)?;

        Ok(RevocationStatus {
            mtp: proof.to_wire(),
            issuer: issuer_state(&snapshot),
        })
    }

    /// Revoke a nonce
    pub fn revoke(&self, nonce: u64) -> IdentityResult<()> {
        self.engine.revoke(nonce, 0)
    }

    /// Sign a field element with the issuer key
    pub fn sign(&self, z: Fr) -> IdentityResult<Signature> {
        Ok(self.signer.sign(z)?)
    }

    /// Sign little-endian bytes interpreted as a field element
    pub fn sign_bytes(&self, le_bytes: &[u8]) -> IdentityResult<Signature> {
        Ok(self.signer.sign_bytes(le_bytes)?)
    }

    /// Build the auth-claim signature proof over a new claim's index hash
    fn sign_claim_entry(&self, core_claim: &CoreClaim) -> IdentityResult<SignatureProofEntry> {
        let auth_record = self.engine.get_claim(&self.auth_claim_id)?;
        let auth_hi = auth_record.core_claim.h_index()?;

        let (auth_mtp, snapshot) = self.engine.inclusion_proof_with_snapshot(auth_hi)?;
        let signature = self.signer.sign(core_claim.h_index()?)?;

        Ok(SignatureProofEntry {
            proof_type: BJJ_SIGNATURE_PROOF_TYPE.to_string(),
            issuer_data: IssuerData {
                id: self.identifier.to_hex(),
                state: issuer_state(&snapshot),
                auth_claim: Some(auth_record.core_claim),
                mtp: Some(auth_mtp.to_wire()),
                revocation_status: Some(format!(
                    "{}/api/v1/claims/revocation/status/{}",
                    self.base_url, auth_record.revocation_nonce
                )),
            },
            signature: hex::encode(signature.to_bytes()),
        })
    }
}

fn issuer_state(snapshot: &StateSnapshot) -> IssuerState {
    IssuerState {
        value: Some(fr_to_hex(&snapshot.state)),
        claims_tree_root: Some(fr_to_hex(&snapshot.claims_root)),
        revocation_tree_root: Some(fr_to_hex(&snapshot.revocations_root)),
        root_of_roots: Some(fr_to_hex(&snapshot.roots_root)),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
