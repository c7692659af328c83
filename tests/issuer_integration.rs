//! End-to-end issuer tests: genesis, issuance, revocation, publishing

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use sigil::issuer::{Issuer, IssuerError};
use sigil::prelude::*;
use sigil_chain::{CallRequest, ChainError, ChainResult, OperatorKey, TxReceipt};
use sigil_claims::TYPE_DEFAULT;
use sigil_hash::{fr_from_le_bytes, fr_to_hex};
use sigil_identity::{genesis_state_hash, IdentityError};
use sigil_schema::{url_hash, MemSchemaCache, SchemaCache};
use sigil_smt::ProofWire;

const KYC_SCHEMA_URL: &str = "ipfs://QmSigilKyc/kyc-age.json-ld";
const KYC_TYPE: &str = "KYCAgeCredential";
const BASE_URL: &str = "http://localhost:8001";

const OPERATOR_KEY_HEX: &str =
    "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

// =============================================================================
// FIXTURES
// =============================================================================

fn issuer_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    for (i, byte) in seed.iter_mut().enumerate() {
        *byte = (i + 1) as u8;
    }
    seed
}

fn kyc_schema_bytes() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "@context": [{
            KYC_TYPE: {
                "@id": "kyc-vocab:KYCAgeCredential",
                "@context": {
                    "birthday": { "@id": "kyc-vocab:birthday" },
                    "documentType": { "@id": "kyc-vocab:documentType" }
                }
            }
        }]
    }))
    .unwrap()
}

fn schema_processor() -> Arc<SchemaProcessor> {
    let cache = Arc::new(MemSchemaCache::new());
    cache.put(&url_hash(KYC_SCHEMA_URL), &kyc_schema_bytes());
    Arc::new(SchemaProcessor::new().unwrap().with_cache(cache))
}

fn new_issuer() -> Issuer {
    Issuer::new(
        Arc::new(MemStore::new()),
        issuer_seed(),
        BASE_URL,
        schema_processor(),
        40,
    )
    .unwrap()
}

fn subject_hex() -> String {
    Identifier::from_genesis(TYPE_DEFAULT, &Fr::from(11u64)).to_hex()
}

fn kyc_request(nonce: u64, birthday: u64) -> CreateClaimRequest {
    CreateClaimRequest {
        schema_url: KYC_SCHEMA_URL.to_string(),
        schema_type: KYC_TYPE.to_string(),
        data: json!({"birthday": birthday, "documentType": 1}),
        subject_id: Some(subject_hex()),
        subject_position: SubjectPosition::Index,
        expiration: None,
        version: 0,
        revocation_nonce: nonce,
    }
}

// =============================================================================
// SCENARIO A: GENESIS DETERMINISM
// =============================================================================

#[test]
fn genesis_identifier_is_deterministic() {
    let a = new_issuer();
    let b = new_issuer();

    let id_a = a.get_identity().unwrap().identifier;
    let id_b = b.get_identity().unwrap().identifier;
    assert_eq!(id_a, id_b);
    assert_eq!(id_a.len(), 62); // 31 bytes hex
}

#[test]
fn genesis_identifier_matches_manual_derivation() {
    let issuer = new_issuer();

    // Re-derive: auth claim into a fresh tree, genesis state from its root
    let pk = PrivateKey::from_bytes(issuer_seed()).public();
    let auth_claim = CoreClaim::new_auth(&pk.x, &pk.y).unwrap();

    let mut tree =
        SparseMerkleTree::open(Arc::new(MemStore::new()), "probe", 40).unwrap();
    tree.add(auth_claim.h_index().unwrap(), auth_claim.h_value().unwrap())
        .unwrap();

    let genesis_state = genesis_state_hash(tree.root()).unwrap();
    let expected = Identifier::from_genesis(TYPE_DEFAULT, &genesis_state);

    assert_eq!(issuer.get_identity().unwrap().identifier, expected.to_hex());
}

#[test]
fn reopened_store_restores_identity_without_new_genesis() {
    let store: Arc<dyn Store> = Arc::new(MemStore::new());

    let first = Issuer::new(store.clone(), issuer_seed(), BASE_URL, schema_processor(), 40)
        .unwrap()
        .get_identity()
        .unwrap();

    let second = Issuer::new(store, issuer_seed(), BASE_URL, schema_processor(), 40)
        .unwrap()
        .get_identity()
        .unwrap();

    assert_eq!(first.identifier, second.identifier);
    assert_eq!(first.claims_tree_root, second.claims_tree_root);
}

// =============================================================================
// SCENARIO B: ISSUE & VERIFY
// =============================================================================

#[test]
fn issued_credential_proofs_verify() {
    let issuer = new_issuer();

    let response = issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();
    assert_eq!(response.id.len(), 64);

    let record = issuer.identity().get_claim_record(&response.id).unwrap();
    let hi = record.core_claim.h_index().unwrap();
    let hv = record.core_claim.h_value().unwrap();
    assert_eq!(fr_to_hex(&hi), response.id);

    // Merkle proof: inclusion of (h_index, h_value) at the recorded root
    let mtp_entry = record.mtp_proof.clone().unwrap();
    let wire: ProofWire = serde_json::from_value(mtp_entry["mtp"].clone()).unwrap();
    let proof = wire.to_proof().unwrap();
    assert!(proof.existence);

    let root_hex = mtp_entry["issuerData"]["state"]["claimsTreeRoot"]
        .as_str()
        .unwrap();
    let root = fr_from_le_bytes(&hex::decode(root_hex).unwrap()).unwrap();
    assert!(proof.verify(root, hi, hv));

    // Signature proof: issuer key over h_index
    let signature_entry = record.signature_proof.clone().unwrap();
    let signature_hex = signature_entry["signature"].as_str().unwrap();
    let signature = Signature::from_bytes(&hex::decode(signature_hex).unwrap()).unwrap();

    let pk = PrivateKey::from_bytes(issuer_seed()).public();
    assert!(pk.verify(&signature, hi));

    // Envelope carries both proofs and the revocation status URL
    let credential = issuer.get_claim(&response.id).unwrap();
    assert_eq!(credential.proof.len(), 2);
    assert_eq!(
        credential.credential_status.as_ref().unwrap().id,
        format!("{}/api/v1/claims/revocation/status/7", BASE_URL)
    );
}

#[test]
fn signature_proof_carries_auth_claim_issuer_data() {
    let issuer = new_issuer();
    let response = issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();

    let record = issuer.identity().get_claim_record(&response.id).unwrap();
    let entry = record.signature_proof.unwrap();

    assert_eq!(entry["type"], json!("BJJSignature2021"));
    assert!(entry["issuerData"]["authClaim"].is_object());
    assert_eq!(
        entry["issuerData"]["revocationStatus"],
        json!(format!("{}/api/v1/claims/revocation/status/0", BASE_URL))
    );

    // The embedded auth-claim inclusion proof verifies at the embedded root
    let wire: ProofWire =
        serde_json::from_value(entry["issuerData"]["mtp"].clone()).unwrap();
    let proof = wire.to_proof().unwrap();

    let auth_claim: CoreClaim =
        serde_json::from_value(entry["issuerData"]["authClaim"].clone()).unwrap();
    let root_hex = entry["issuerData"]["state"]["claimsTreeRoot"].as_str().unwrap();
    let root = fr_from_le_bytes(&hex::decode(root_hex).unwrap()).unwrap();

    assert!(proof.verify(
        root,
        auth_claim.h_index().unwrap(),
        auth_claim.h_value().unwrap()
    ));
}

// =============================================================================
// SCENARIO C: REVOKE & PROVE
// =============================================================================

#[test]
fn revocation_round_trip() {
    let issuer = new_issuer();
    issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();

    assert!(!issuer.get_revocation_status(7).unwrap().mtp.existence);

    let state_before = issuer.get_identity().unwrap().state;
    issuer.revoke(7).unwrap();

    let status = issuer.get_revocation_status(7).unwrap();
    assert!(status.mtp.existence);
    assert!(status.issuer.value.is_some());

    let state_after = issuer.get_identity().unwrap().state;
    assert_ne!(state_before, state_after);
}

#[test]
fn double_revocation_rejected() {
    let issuer = new_issuer();
    issuer.revoke(9).unwrap();

    assert!(matches!(
        issuer.revoke(9),
        Err(IssuerError::Identity(IdentityError::AlreadyRevoked(9)))
    ));
}

// =============================================================================
// SCENARIO D: DUPLICATE REJECTION
// =============================================================================

#[test]
fn duplicate_claim_rejected_without_state_change() {
    let issuer = new_issuer();
    let request = kyc_request(7, 19_900_101);

    issuer.add_claim(&request, &CancelToken::new()).unwrap();
    let state_after_first = issuer.get_identity().unwrap().state;

    assert!(matches!(
        issuer.add_claim(&request, &CancelToken::new()),
        Err(IssuerError::Identity(IdentityError::Duplicate))
    ));
    assert_eq!(issuer.get_identity().unwrap().state, state_after_first);
}

// =============================================================================
// SCENARIO E: PUBLISH TRANSITION
// =============================================================================

/// Chain client stub capturing broadcasts
#[derive(Default)]
struct StubClient {
    sent: Mutex<Vec<Vec<u8>>>,
}

impl ChainClient for StubClient {
    fn chain_id(&self) -> ChainResult<u64> {
        Ok(31337)
    }

    fn pending_nonce(&self, _address: [u8; 20]) -> ChainResult<u64> {
        Ok(0)
    }

    fn estimate_gas(&self, _call: &CallRequest) -> ChainResult<u64> {
        Ok(300_000)
    }

    fn latest_base_fee(&self) -> ChainResult<u128> {
        Ok(1_000_000_000)
    }

    fn suggest_tip(&self) -> ChainResult<u128> {
        Ok(1_500_000_000)
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<String> {
        self.sent.lock().push(raw.to_vec());
        Ok(format!("0x{:064x}", self.sent.lock().len()))
    }

    fn transaction_receipt(&self, _tx_hash: &str) -> ChainResult<Option<TxReceipt>> {
        Ok(Some(TxReceipt {
            status: true,
            block_number: 1,
        }))
    }
}

/// Prover stub recording the transition endpoints
#[derive(Default)]
struct StubProver {
    proved: Mutex<Vec<(Fr, Fr)>>,
}

impl Prover for StubProver {
    fn prove_transition(&self, old_state: &Fr, new_state: &Fr) -> ChainResult<ZkProof> {
        self.proved.lock().push((*old_state, *new_state));
        Ok(ZkProof {
            a: [[0u8; 32]; 2],
            b: [[[0u8; 32]; 2]; 2],
            c: [[0u8; 32]; 2],
        })
    }
}

fn publishing_issuer() -> (Issuer, Arc<StubClient>, Arc<StubProver>) {
    let client = Arc::new(StubClient::default());
    let prover = Arc::new(StubProver::default());

    let publisher = Publisher::new(
        client.clone(),
        [0x42; 20],
        OperatorKey::from_hex(OPERATOR_KEY_HEX).unwrap(),
    )
    .with_poll_interval(Duration::from_millis(1));

    let issuer = new_issuer().with_publisher(publisher, prover.clone());
    (issuer, client, prover)
}

#[test]
fn publish_anchors_new_state_from_genesis() {
    let (issuer, client, prover) = publishing_issuer();

    issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();
    let tx_hash = issuer.publish_state(&CancelToken::new()).unwrap();
    assert!(tx_hash.starts_with("0x"));
    assert_eq!(client.sent.lock().len(), 1);

    // First publish proves genesis -> current
    let (old_state, new_state) = prover.proved.lock()[0];
    let genesis_root = issuer.engine().historical_root(0).unwrap().unwrap();
    assert_eq!(old_state, genesis_state_hash(genesis_root).unwrap());
    assert_eq!(new_state, issuer.engine().state_hash().unwrap());
}

#[test]
fn publish_without_changes_is_rejected_before_rpc() {
    let (issuer, client, _) = publishing_issuer();

    issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();
    issuer.publish_state(&CancelToken::new()).unwrap();

    // Nothing changed since the confirmed publish
    assert!(matches!(
        issuer.publish_state(&CancelToken::new()),
        Err(IssuerError::Chain(ChainError::StateUnchanged))
    ));
    assert_eq!(client.sent.lock().len(), 1);
}

#[test]
fn second_publish_chains_from_published_state() {
    let (issuer, _, prover) = publishing_issuer();

    issuer
        .add_claim(&kyc_request(7, 19_900_101), &CancelToken::new())
        .unwrap();
    issuer.publish_state(&CancelToken::new()).unwrap();

    issuer.revoke(7).unwrap();
    issuer.publish_state(&CancelToken::new()).unwrap();

    let proved = prover.proved.lock();
    assert_eq!(proved.len(), 2);
    // Second transition starts where the first ended
    assert_eq!(proved[1].0, proved[0].1);
}

// =============================================================================
// SCENARIO F: CONCURRENT ISSUANCE
// =============================================================================

#[test]
fn concurrent_issuance_keeps_trees_consistent() {
    let issuer = new_issuer();

    let ids: Vec<String> = std::thread::scope(|scope| {
        let issuer = &issuer;
        let handles: Vec<_> = (0..10u64)
            .map(|i| {
                scope.spawn(move || {
                    issuer
                        .add_claim(
                            &kyc_request(100 + i, 19_900_101 + i),
                            &CancelToken::new(),
                        )
                        .unwrap()
                        .id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // All ten distinct and retrievable
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 10);
    for id in &ids {
        issuer.get_claim(id).unwrap();
    }

    // Roots tree recorded auth + ten inserts in some total order
    let engine = issuer.engine();
    for index in 0..11 {
        assert!(engine.historical_root(index).unwrap().is_some());
    }
    assert!(engine.historical_root(11).unwrap().is_none());

    // Identifier never moved
    let identity = issuer.get_identity().unwrap();
    assert_eq!(
        identity.identifier,
        new_issuer().get_identity().unwrap().identifier
    );
}
