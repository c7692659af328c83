//! Single-writer state publisher

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use sigil_hash::Fr;
use sigil_store::CancelToken;

use crate::abi::encode_transit_state;
use crate::{
    CallRequest, ChainClient, ChainError, ChainResult, Eip1559Tx, OperatorKey, Transition,
    TxReceipt, ZkProof,
};

/// External proving capability
///
/// Producing the Groth16-style triple for a transition is out of scope;
/// the publisher only packages and submits it.
pub trait Prover: Send + Sync {
    /// Prove that `new_state` is a valid successor of `old_state`
    fn prove_transition(&self, old_state: &Fr, new_state: &Fr) -> ChainResult<ZkProof>;
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Publishes state transitions, one in flight at a time
///
/// The mutex spans nonce fetch through broadcast, so concurrent callers
/// cannot race on the operator account nonce.
pub struct Publisher {
    client: Arc<dyn ChainClient>,
    contract: [u8; 20],
    operator: OperatorKey,
    lock: Mutex<()>,
    poll_interval: Duration,
}

impl Publisher {
    /// Create a publisher for a state contract
    pub fn new(client: Arc<dyn ChainClient>, contract: [u8; 20], operator: OperatorKey) -> Self {
        Self {
            client,
            contract,
            operator,
            lock: Mutex::new(()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the receipt polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Submit a transition, returning the transaction hash
    pub fn update_state(&self, transition: &Transition) -> ChainResult<String> {
        if transition.old_state == transition.new_state {
            return Err(ChainError::StateUnchanged);
        }

        let _guard = self.lock.lock();

        let payload = encode_transit_state(transition);
        let from = self.operator.address();

        let nonce = self.client.pending_nonce(from)?;
        let gas_limit = self.client.estimate_gas(&CallRequest {
            from,
            to: self.contract,
            data: payload.clone(),
        })?;

        // base' = round(base * 1.25); max fee = base' + tip
        let base_fee = self.client.latest_base_fee()?;
        let base_fee = (base_fee * 125 + 50) / 100;
        let tip = self.client.suggest_tip()?;
        let max_fee = base_fee + tip;

        let chain_id = self.client.chain_id()?;

        let tx = Eip1559Tx {
            chain_id,
            nonce,
            max_priority_fee: tip,
            max_fee,
            gas_limit,
            to: self.contract,
            value: 0,
            data: payload,
        };

        let raw = tx.sign(&self.operator)?;
        let tx_hash = self.client.send_raw_transaction(&raw)?;

        info!(tx_hash = %tx_hash, nonce, "state transition broadcast");
        Ok(tx_hash)
    }

    /// Poll until the transaction is included
    ///
    /// Returns the receipt on success status, `ChainIO` when the
    /// transaction reverted, `Cancelled` when the token fires. A broadcast
    /// transaction is never recalled; cancellation only stops the local
    /// wait.
    pub fn wait(&self, tx_hash: &str, cancel: &CancelToken) -> ChainResult<TxReceipt> {
        loop {
            if cancel.is_cancelled() {
                return Err(ChainError::Cancelled);
            }

            match self.client.transaction_receipt(tx_hash)? {
                Some(receipt) if receipt.status => {
                    debug!(tx_hash = %tx_hash, block = receipt.block_number, "transition confirmed");
                    return Ok(receipt);
                }
                Some(_) => {
                    return Err(ChainError::ChainIO(format!(
                        "transaction {} reverted",
                        tx_hash
                    )))
                }
                None => std::thread::sleep(self.poll_interval),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as TestMutex;
    use sigil_claims::{Identifier, TYPE_DEFAULT};

    use crate::abi::selector;

    /// Client stub recording the broadcast payload
    #[derive(Default)]
    struct StubClient {
        sent: TestMutex<Vec<Vec<u8>>>,
        receipts_until_included: TestMutex<u32>,
        revert: bool,
    }

    impl ChainClient for StubClient {
        fn chain_id(&self) -> ChainResult<u64> {
            Ok(31337)
        }

        fn pending_nonce(&self, _address: [u8; 20]) -> ChainResult<u64> {
            Ok(3)
        }

        fn estimate_gas(&self, _call: &CallRequest) -> ChainResult<u64> {
            Ok(200_000)
        }

        fn latest_base_fee(&self) -> ChainResult<u128> {
            Ok(1_000_000_000)
        }

        fn suggest_tip(&self) -> ChainResult<u128> {
            Ok(2_000_000_000)
        }

        fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<String> {
            self.sent.lock().push(raw.to_vec());
            Ok("0xabc".to_string())
        }

        fn transaction_receipt(&self, _tx_hash: &str) -> ChainResult<Option<TxReceipt>> {
            let mut remaining = self.receipts_until_included.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
            Ok(Some(TxReceipt {
                status: !self.revert,
                block_number: 100,
            }))
        }
    }

    fn word(n: u8) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[31] = n;
        out
    }

    fn transition(old: u64, new: u64) -> Transition {
        Transition {
            identifier: Identifier::from_genesis(TYPE_DEFAULT, &Fr::from(1u64)),
            old_state: Fr::from(old),
            new_state: Fr::from(new),
            is_old_state_genesis: false,
            proof: ZkProof {
                a: [word(1), word(2)],
                b: [[word(3), word(4)], [word(5), word(6)]],
                c: [word(7), word(8)],
            },
        }
    }

    fn publisher(client: Arc<StubClient>) -> Publisher {
        let operator = OperatorKey::from_hex(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        Publisher::new(client, [0x42; 20], operator)
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_unchanged_state_rejected_without_rpc() {
        let client = Arc::new(StubClient::default());
        let publisher = publisher(client.clone());

        assert!(matches!(
            publisher.update_state(&transition(5, 5)),
            Err(ChainError::StateUnchanged)
        ));
        assert!(client.sent.lock().is_empty());
    }

    #[test]
    fn test_broadcast_contains_selector_and_swapped_b() {
        let client = Arc::new(StubClient::default());
        let publisher = publisher(client.clone());

        publisher.update_state(&transition(5, 6)).unwrap();

        let raw = client.sent.lock()[0].clone();
        let sig = selector(
            "transitState(uint256,uint256,uint256,bool,uint256[2],uint256[2][2],uint256[2])",
        );
        let start = raw
            .windows(4)
            .position(|w| w == sig)
            .expect("selector present in raw tx");

        // b encodes swapped: [b01, b00, b11, b10]
        assert_eq!(raw[start + 4 + 6 * 32..start + 4 + 7 * 32], word(4));
        assert_eq!(raw[start + 4 + 7 * 32..start + 4 + 8 * 32], word(3));
        assert_eq!(raw[start + 4 + 8 * 32..start + 4 + 9 * 32], word(6));
        assert_eq!(raw[start + 4 + 9 * 32..start + 4 + 10 * 32], word(5));
    }

    #[test]
    fn test_wait_polls_until_included() {
        let client = Arc::new(StubClient {
            receipts_until_included: TestMutex::new(3),
            ..Default::default()
        });
        let publisher = publisher(client);

        let receipt = publisher.wait("0xabc", &CancelToken::new()).unwrap();
        assert!(receipt.status);
    }

    #[test]
    fn test_wait_surfaces_revert() {
        let client = Arc::new(StubClient {
            revert: true,
            ..Default::default()
        });
        let publisher = publisher(client);

        assert!(matches!(
            publisher.wait("0xabc", &CancelToken::new()),
            Err(ChainError::ChainIO(_))
        ));
    }

    #[test]
    fn test_wait_honors_cancellation() {
        let client = Arc::new(StubClient {
            receipts_until_included: TestMutex::new(u32::MAX),
            ..Default::default()
        });
        let publisher = publisher(client);

        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            publisher.wait("0xabc", &cancel),
            Err(ChainError::Cancelled)
        ));
    }
}
