//! Issuer composition root
//!
//! Wires the store, schema processor, identity, and publisher into the
//! operator surface consumed by the outward HTTP layer and the CLI.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use sigil_babyjub::PrivateKey;
use sigil_chain::{ChainError, Prover, Publisher, Transition};
use sigil_claims::VerifiableCredential;
use sigil_hash::{fr_to_hex, Fr};
use sigil_identity::{
    CreateClaimRequest, CreateClaimResponse, Identity, IdentityError, IdentityStateView,
    RevocationStatus, StateEngine,
};
use sigil_schema::SchemaProcessor;
use sigil_store::{CancelToken, Store};

/// Issuer errors
#[derive(Error, Debug)]
pub enum IssuerError {
    /// Identity operation failed
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Publishing failed
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Operation requires a collaborator that was not wired in
    #[error("Issuer is missing a configured {0}")]
    NotConfigured(&'static str),
}

/// Issuer result type
pub type IssuerResult<T> = Result<T, IssuerError>;

/// The assembled credential issuer
pub struct Issuer {
    engine: Arc<StateEngine>,
    identity: Identity,
    publisher: Option<Publisher>,
    prover: Option<Arc<dyn Prover>>,
}

impl Issuer {
    /// Assemble an issuer over a store
    ///
    /// Runs genesis when the store holds no identity yet.
    pub fn new(
        store: Arc<dyn Store>,
        signer_seed: [u8; 32],
        base_url: &str,
        schema: Arc<SchemaProcessor>,
        tree_depth: usize,
    ) -> IssuerResult<Self> {
        let engine = Arc::new(StateEngine::open(store, tree_depth)?);
        let identity = Identity::new(
            engine.clone(),
            PrivateKey::from_bytes(signer_seed),
            base_url,
            schema,
        )?;

        info!(identifier = %identity.identifier(), "issuer ready");
        Ok(Self {
            engine,
            identity,
            publisher: None,
            prover: None,
        })
    }

    /// Attach the on-chain publisher and its prover
    pub fn with_publisher(mut self, publisher: Publisher, prover: Arc<dyn Prover>) -> Self {
        self.publisher = Some(publisher);
        self.prover = Some(prover);
        self
    }

    /// The underlying identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The underlying state engine
    pub fn engine(&self) -> &Arc<StateEngine> {
        &self.engine
    }

    /// Issue a credential
    pub fn add_claim(
        &self,
        request: &CreateClaimRequest,
        cancel: &CancelToken,
    ) -> IssuerResult<CreateClaimResponse> {
        Ok(self.identity.add_claim(request, cancel)?)
    }

    /// Fetch an issued credential document
    pub fn get_claim(&self, id: &str) -> IssuerResult<VerifiableCredential> {
        Ok(self.identity.get_claim(id)?)
    }

    /// Identifier plus full tree-root state
    pub fn get_identity(&self) -> IssuerResult<IdentityStateView> {
        Ok(self.identity.get_identity()?)
    }

    /// Revocation proof for a nonce
    pub fn get_revocation_status(&self, nonce: u64) -> IssuerResult<RevocationStatus> {
        Ok(self.identity.get_revocation_status(nonce)?)
    }

    /// Revoke a nonce
    pub fn revoke(&self, nonce: u64) -> IssuerResult<()> {
        Ok(self.identity.revoke(nonce)?)
    }

    /// Anchor the current state on-chain
    ///
    /// Uses the last confirmed state as the transition's old state, or the
    /// genesis state when nothing was published yet. Blocks until the
    /// transaction confirms, then records the new state as published.
    pub fn publish_state(&self, cancel: &CancelToken) -> IssuerResult<String> {
        let publisher = self
            .publisher
            .as_ref()
            .ok_or(IssuerError::NotConfigured("publisher"))?;
        let prover = self
            .prover
            .as_ref()
            .ok_or(IssuerError::NotConfigured("prover"))?;

        let new_state = self.engine.state_hash()?;
        let (old_state, is_old_state_genesis) = match self.engine.published_state()? {
            Some(state) => (state, false),
            None => (self.genesis_state()?, true),
        };

        if old_state == new_state {
            return Err(IssuerError::Chain(ChainError::StateUnchanged));
        }

        debug!(
            old_state = %fr_to_hex(&old_state),
            new_state = %fr_to_hex(&new_state),
            "proving state transition"
        );
        let proof = prover.prove_transition(&old_state, &new_state)?;

        let tx_hash = publisher.update_state(&Transition {
            identifier: *self.identity.identifier(),
            old_state,
            new_state,
            is_old_state_genesis,
            proof,
        })?;

        publisher.wait(&tx_hash, cancel)?;
        self.engine.set_published_state(new_state)?;

        info!(tx_hash = %tx_hash, "state anchored on-chain");
        Ok(tx_hash)
    }

    /// Genesis state: the first historical Claims root with empty trees
    fn genesis_state(&self) -> IssuerResult<Fr> {
        let genesis_root = self
            .engine
            .historical_root(0)?
            .ok_or_else(|| IssuerError::Identity(IdentityError::Corrupt(
                "no genesis root recorded".into(),
            )))?;
        Ok(sigil_identity::genesis_state_hash(genesis_root)?)
    }
}
