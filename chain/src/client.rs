//! Chain RPC capability
//!
//! The transport lives outside the core; the publisher only needs these
//! blocking calls. Implementations map straight onto the standard
//! JSON-RPC surface (`eth_chainId`, `eth_getTransactionCount`,
//! `eth_estimateGas`, `eth_maxPriorityFeePerGas`,
//! `eth_sendRawTransaction`, `eth_getTransactionReceipt`).

use crate::ChainResult;

/// Gas-estimation call shape
#[derive(Clone, Debug)]
pub struct CallRequest {
    /// Sender address
    pub from: [u8; 20],
    /// Target contract
    pub to: [u8; 20],
    /// Call data
    pub data: Vec<u8>,
}

/// Minimal receipt view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Execution success
    pub status: bool,
    /// Inclusion block
    pub block_number: u64,
}

/// Blocking chain RPC capability
pub trait ChainClient: Send + Sync {
    /// Chain id for transaction signing
    fn chain_id(&self) -> ChainResult<u64>;

    /// Next account nonce, including pending transactions
    fn pending_nonce(&self, address: [u8; 20]) -> ChainResult<u64>;

    /// Gas estimate for a call
    fn estimate_gas(&self, call: &CallRequest) -> ChainResult<u64>;

    /// Base fee of the latest block header
    fn latest_base_fee(&self) -> ChainResult<u128>;

    /// Suggested priority fee
    fn suggest_tip(&self) -> ChainResult<u128>;

    /// Broadcast raw transaction bytes, returning the transaction hash
    fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<String>;

    /// Receipt of a transaction, if it has been included
    fn transaction_receipt(&self, tx_hash: &str) -> ChainResult<Option<TxReceipt>>;
}
