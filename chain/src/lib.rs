//! On-Chain State Publisher
//!
//! Anchors identity state transitions on an EVM chain. The publisher
//! ABI-encodes `transitState` calls, assembles and signs EIP-1559
//! dynamic-fee transactions with the operator's secp256k1 key, and polls
//! for confirmation. Chain RPC transport is a capability (`ChainClient`);
//! a single mutex serializes sign+broadcast so at most one transition per
//! identity is in flight.

mod abi;
mod client;
mod error;
mod publisher;
mod tx;

pub use abi::{encode_transit_state, fr_to_word, id_to_word, Transition, Word, ZkProof};
pub use client::{CallRequest, ChainClient, TxReceipt};
pub use error::{ChainError, ChainResult};
pub use publisher::{Prover, Publisher};
pub use tx::{Eip1559Tx, OperatorKey};
