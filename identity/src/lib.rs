//! Identity State Engine
//!
//! The heart of the issuer: three sparse Merkle trees (Claims, Revocations,
//! Roots) mutated atomically behind one write lock, and the `Identity`
//! object implementing the operator surface — genesis, claim issuance with
//! signature and inclusion proofs, revocation, and state views.
//!
//! # Ordering Guarantees
//!
//! Within one identity, claims appear in Claims-tree insertion order, the
//! Roots tree records the same order, and any state hash observed after a
//! successful insert includes that claim.

mod engine;
mod error;
mod identity;

pub use engine::{genesis_state_hash, StateEngine, StateSnapshot};
pub use error::{IdentityError, IdentityResult};
pub use identity::{
    CreateClaimRequest, CreateClaimResponse, Identity, IdentityStateView, RevocationStatus,
};
