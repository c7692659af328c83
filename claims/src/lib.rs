//! Claim Encoding and Credential Models
//!
//! The on-chain shape of a credential is a fixed layout of eight 32-byte
//! slots; the Claims tree stores only the Poseidon digests of the two slot
//! groups. This crate owns that bit-exact layout, the issuer identifier
//! derivation, the database-shape claim record, and the W3C credential
//! envelope returned to callers.

mod claim;
mod credential;
mod error;
mod identifier;
mod record;
mod schema_hash;

pub use claim::{CoreClaim, CoreClaimData, ParsedSlots, SubjectPosition};
pub use credential::{
    CredentialSchema, IssuerData, IssuerState, MtpProofEntry, SignatureProofEntry,
    VerifiableCredential, BJJ_SIGNATURE_PROOF_TYPE, SPARSE_MERKLE_PROOF_TYPE,
};
pub use error::{ClaimError, ClaimResult};
pub use identifier::{Identifier, TYPE_DEFAULT};
pub use record::{ClaimRecord, CredentialStatus, CREDENTIAL_STATUS_TYPE};
pub use schema_hash::SchemaHash;

/// Schema hash of the auth credential binding the issuer's Baby Jubjub key
pub const AUTH_BJJ_SCHEMA_HASH: &str = "ca938857241db9451ea329256b9c06e5";

/// Schema URL of the auth credential
pub const AUTH_BJJ_CREDENTIAL_URL: &str =
    "https://schema.iden3.io/core/jsonld/auth.jsonld";

/// Type name of the auth credential
pub const AUTH_BJJ_CREDENTIAL_TYPE: &str = "AuthBJJCredential";
