//! SIGIL: Self-Sovereign Credential Issuer
//!
//! This is the root crate that re-exports all Sigil components for
//! integration testing and provides the composition root wiring them into
//! one issuer.
//!
//! ## Architecture Overview
//!
//! A Sigil identity is a three-tree Merkle state machine over the BN254
//! scalar field:
//!
//! - **Claims tree**: one leaf per issued credential, `(h_index, h_value)`
//! - **Revocations tree**: one leaf per revoked nonce
//! - **Roots tree**: the historical sequence of Claims-tree roots
//!
//! `Poseidon(claims_root, revocations_root, roots_root)` is the public
//! state commitment, periodically anchored on an EVM chain so third
//! parties can verify issuance and revocation without trusting the issuer.
//!
//! ## Crate Organization
//!
//! - `sigil-hash`: Poseidon hashing, canonical field encoding
//! - `sigil-babyjub`: Baby Jubjub EdDSA-Poseidon signing
//! - `sigil-smt`: fixed-depth sparse Merkle tree over a `Store`
//! - `sigil-claims`: claim slot codec, identifiers, credential models
//! - `sigil-store`: key/value persistence capability
//! - `sigil-schema`: schema loading and slot parsing
//! - `sigil-identity`: the three-tree state engine and claim lifecycle
//! - `sigil-chain`: transition ABI and EIP-1559 publishing

pub mod issuer;

// Re-export all crates for integration testing
pub use sigil_babyjub as babyjub;
pub use sigil_chain as chain;
pub use sigil_claims as claims;
pub use sigil_hash as hash;
pub use sigil_identity as identity;
pub use sigil_schema as schema;
pub use sigil_smt as smt;
pub use sigil_store as store;

/// Sigil protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::issuer::{Issuer, IssuerError};
    pub use sigil_babyjub::{PrivateKey, PublicKey, Signature};
    pub use sigil_chain::{ChainClient, Prover, Publisher, Transition, ZkProof};
    pub use sigil_claims::{CoreClaim, Identifier, SubjectPosition, VerifiableCredential};
    pub use sigil_hash::{poseidon_hash, Fr};
    pub use sigil_identity::{CreateClaimRequest, Identity, StateEngine};
    pub use sigil_schema::SchemaProcessor;
    pub use sigil_smt::{Proof, SparseMerkleTree};
    pub use sigil_store::{CancelToken, MemStore, RedbStore, Store};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
