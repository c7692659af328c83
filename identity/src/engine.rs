//! Identity state engine
//!
//! Owns the three sparse Merkle trees (Claims, Revocations, Roots), the
//! claim-record keyspace, and the persisted identifier. One write lock
//! covers every mutation; readers share a lock so state-hash and proof
//! observations always see the three roots at a single instant.
//!
//! `insert_claim` is atomic: if any step fails after a tree was touched,
//! prior root pointers are restored before returning. Old node content
//! stays reachable because nodes are content-addressed.

use std::sync::Arc;

use ark_ff::Zero;
use parking_lot::RwLock;
use tracing::{debug, warn};

use sigil_claims::{ClaimRecord, CoreClaim, Identifier};
use sigil_hash::{fr_from_le_bytes, fr_to_hex, fr_to_le_bytes, poseidon_hash, Fr};
use sigil_smt::{Proof, SmtError, SparseMerkleTree};
use sigil_store::{keys, Store};

use crate::{IdentityError, IdentityResult};

/// Consistent view of the three roots and their combined state hash
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Claims tree root
    pub claims_root: Fr,
    /// Revocations tree root
    pub revocations_root: Fr,
    /// Roots tree root
    pub roots_root: Fr,
    /// `Poseidon(claims_root, revocations_root, roots_root)`
    pub state: Fr,
}

struct EngineInner {
    claims: SparseMerkleTree,
    revocations: SparseMerkleTree,
    roots: SparseMerkleTree,
    roots_next_index: u64,
}

/// Three-tree state machine behind one write lock
pub struct StateEngine {
    store: Arc<dyn Store>,
    inner: RwLock<EngineInner>,
}

impl StateEngine {
    /// Open the engine, restoring persisted tree roots and the roots counter
    pub fn open(store: Arc<dyn Store>, tree_depth: usize) -> IdentityResult<Self> {
        let claims = SparseMerkleTree::open(store.clone(), keys::TREE_CLAIMS, tree_depth)?;
        let revocations =
            SparseMerkleTree::open(store.clone(), keys::TREE_REVOCATIONS, tree_depth)?;
        let roots = SparseMerkleTree::open(store.clone(), keys::TREE_ROOTS, tree_depth)?;

        let roots_next_index = match store.get(keys::ROOTS_NEXT_INDEX.as_bytes())? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| IdentityError::Corrupt("roots counter width".into()))?;
                u64::from_be_bytes(arr)
            }
            None => 0,
        };

        Ok(Self {
            store,
            inner: RwLock::new(EngineInner {
                claims,
                revocations,
                roots,
                roots_next_index,
            }),
        })
    }

    /// Current state hash
    pub fn state_hash(&self) -> IdentityResult<Fr> {
        Ok(self.snapshot()?.state)
    }

    /// Consistent snapshot of the three roots
    pub fn snapshot(&self) -> IdentityResult<StateSnapshot> {
        let inner = self.inner.read();
        snapshot_of(&inner)
    }

    /// Insert a claim: Claims tree, Roots tree, counter, record
    ///
    /// `attach_proofs` runs after the tree mutations with the fresh
    /// inclusion proof and post-insert snapshot, letting the caller embed
    /// them into the record before it is persisted. Returns the claim's
    /// `h_index`.
    pub fn insert_claim<F>(
        &self,
        claim: &CoreClaim,
        record: ClaimRecord,
        attach_proofs: F,
    ) -> IdentityResult<Fr>
    where
        F: FnOnce(&mut ClaimRecord, &Proof, &StateSnapshot),
    {
        let hi = claim.h_index()?;
        let hv = claim.h_value()?;

        let mut inner = self.inner.write();

        let prev_claims_root = inner.claims.root();
        let prev_roots_root = inner.roots.root();
        let prev_index = inner.roots_next_index;

        match inner.claims.add(hi, hv) {
            Ok(()) => {}
            Err(SmtError::KeyExists) => return Err(IdentityError::Duplicate),
            Err(e) => return Err(e.into()),
        }

        let new_claims_root = inner.claims.root();
        if let Err(e) = inner.roots.add(Fr::from(prev_index), new_claims_root) {
            self.rollback(&mut inner, prev_claims_root, prev_roots_root, prev_index);
            return Err(e.into());
        }

        if let Err(e) = self.store.put(
            keys::ROOTS_NEXT_INDEX.as_bytes(),
            &(prev_index + 1).to_be_bytes(),
        ) {
            self.rollback(&mut inner, prev_claims_root, prev_roots_root, prev_index);
            return Err(e.into());
        }
        inner.roots_next_index = prev_index + 1;

        let record_result = (|| -> IdentityResult<()> {
            let proof = inner.claims.generate_proof(hi)?;
            let snapshot = snapshot_of(&inner)?;

            let mut record = record;
            record.id = fr_to_hex(&hi);
            attach_proofs(&mut record, &proof, &snapshot);

            let bytes = serde_json::to_vec(&record)
                .map_err(|e| IdentityError::Corrupt(e.to_string()))?;
            self.store
                .put(keys::claim_record_key(&record.id).as_bytes(), &bytes)?;
            Ok(())
        })();

        if let Err(e) = record_result {
            self.rollback(&mut inner, prev_claims_root, prev_roots_root, prev_index);
            return Err(e);
        }

        debug!(h_index = %fr_to_hex(&hi), "claim inserted");
        Ok(hi)
    }

    /// Mark a revocation nonce, storing the claim version as its value
    pub fn revoke(&self, nonce: u64, version: u32) -> IdentityResult<()> {
        let mut inner = self.inner.write();

        match inner.revocations.add(Fr::from(nonce), Fr::from(version)) {
            Ok(()) => {
                debug!(nonce, "nonce revoked");
                Ok(())
            }
            Err(SmtError::KeyExists) => Err(IdentityError::AlreadyRevoked(nonce)),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a claim record by its `h_index` hex
    pub fn get_claim(&self, h_index_hex: &str) -> IdentityResult<ClaimRecord> {
        let key = keys::claim_record_key(h_index_hex);
        let bytes = self
            .store
            .get(key.as_bytes())?
            .ok_or_else(|| IdentityError::ClaimNotFound(h_index_hex.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| IdentityError::Corrupt(e.to_string()))
    }

    /// Overwrite a persisted claim record in place
    ///
    /// The record must already exist; the tree entry is untouched.
    pub fn update_claim_record(&self, record: &ClaimRecord) -> IdentityResult<()> {
        let _guard = self.inner.write();

        let key = keys::claim_record_key(&record.id);
        if self.store.get(key.as_bytes())?.is_none() {
            return Err(IdentityError::ClaimNotFound(record.id.clone()));
        }

        let bytes =
            serde_json::to_vec(record).map_err(|e| IdentityError::Corrupt(e.to_string()))?;
        self.store.put(key.as_bytes(), &bytes)?;
        Ok(())
    }

    /// Inclusion proof against the current Claims root
    pub fn inclusion_proof(&self, h_index: Fr) -> IdentityResult<Proof> {
        let inner = self.inner.read();
        Ok(inner.claims.generate_proof(h_index)?)
    }

    /// Inclusion proof plus the snapshot it was generated under
    ///
    /// Both come from one lock acquisition, so the proof verifies against
    /// the snapshot's claims root even under concurrent writers.
    pub fn inclusion_proof_with_snapshot(
        &self,
        h_index: Fr,
    ) -> IdentityResult<(Proof, StateSnapshot)> {
        let inner = self.inner.read();
        Ok((inner.claims.generate_proof(h_index)?, snapshot_of(&inner)?))
    }

    /// Existence/non-existence proof against the Revocations tree
    ///
    /// An existence proof means the nonce is revoked.
    pub fn revocation_proof(&self, nonce: u64) -> IdentityResult<Proof> {
        let inner = self.inner.read();
        Ok(inner.revocations.generate_proof(Fr::from(nonce))?)
    }

    /// Revocation proof plus the snapshot it was generated under
    pub fn revocation_proof_with_snapshot(
        &self,
        nonce: u64,
    ) -> IdentityResult<(Proof, StateSnapshot)> {
        let inner = self.inner.read();
        Ok((
            inner.revocations.generate_proof(Fr::from(nonce))?,
            snapshot_of(&inner)?,
        ))
    }

    /// Historical Claims root recorded at a Roots-tree sequence index
    pub fn historical_root(&self, index: u64) -> IdentityResult<Option<Fr>> {
        let inner = self.inner.read();
        let (value, _) = inner.roots.get(Fr::from(index))?;
        Ok(value)
    }

    /// Persist the identifier and the auth claim's record key
    pub fn save_identity(
        &self,
        identifier: &Identifier,
        auth_claim_id: &str,
    ) -> IdentityResult<()> {
        self.store
            .put(keys::IDENTITY_IDENTIFIER.as_bytes(), identifier.as_bytes())?;
        self.store.put(
            keys::IDENTITY_AUTH_CLAIM_ID.as_bytes(),
            auth_claim_id.as_bytes(),
        )?;
        Ok(())
    }

    /// Restore the identifier and auth claim key, if this store has one
    pub fn load_identity(&self) -> IdentityResult<Option<(Identifier, String)>> {
        let Some(id_bytes) = self.store.get(keys::IDENTITY_IDENTIFIER.as_bytes())? else {
            return Ok(None);
        };
        let identifier = Identifier::from_bytes(&id_bytes)?;

        let auth_bytes = self
            .store
            .get(keys::IDENTITY_AUTH_CLAIM_ID.as_bytes())?
            .ok_or_else(|| IdentityError::Corrupt("identifier without auth claim".into()))?;
        let auth_claim_id = String::from_utf8(auth_bytes)
            .map_err(|_| IdentityError::Corrupt("auth claim key not UTF-8".into()))?;

        Ok(Some((identifier, auth_claim_id)))
    }

    /// Last state hash confirmed on-chain, if any
    pub fn published_state(&self) -> IdentityResult<Option<Fr>> {
        match self.store.get(keys::IDENTITY_PUBLISHED_STATE.as_bytes())? {
            Some(bytes) => Ok(Some(fr_from_le_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Record a state hash as confirmed on-chain
    pub fn set_published_state(&self, state: Fr) -> IdentityResult<()> {
        self.store.put(
            keys::IDENTITY_PUBLISHED_STATE.as_bytes(),
            &fr_to_le_bytes(&state),
        )?;
        Ok(())
    }

    /// Restore prior root pointers after a failed multi-step insert
    fn rollback(
        &self,
        inner: &mut EngineInner,
        claims_root: Fr,
        roots_root: Fr,
        roots_index: u64,
    ) {
        if let Err(e) = inner.claims.set_root(claims_root) {
            warn!("rollback of claims root failed: {}", e);
        }
        if let Err(e) = inner.roots.set_root(roots_root) {
            warn!("rollback of roots root failed: {}", e);
        }
        if let Err(e) = self
            .store
            .put(keys::ROOTS_NEXT_INDEX.as_bytes(), &roots_index.to_be_bytes())
        {
            warn!("rollback of roots counter failed: {}", e);
        }
        inner.roots_next_index = roots_index;
    }
}

fn snapshot_of(inner: &EngineInner) -> IdentityResult<StateSnapshot> {
    let claims_root = inner.claims.root();
    let revocations_root = inner.revocations.root();
    let roots_root = inner.roots.root();

    Ok(StateSnapshot {
        claims_root,
        revocations_root,
        roots_root,
        state: poseidon_hash(&[claims_root, revocations_root, roots_root])?,
    })
}

/// State hash used for identifier derivation: the genesis Claims root
/// combined with two empty trees
pub fn genesis_state_hash(claims_root: Fr) -> IdentityResult<Fr> {
    Ok(poseidon_hash(&[claims_root, Fr::zero(), Fr::zero()])?)
}
