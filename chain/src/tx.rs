//! EIP-1559 transaction assembly and signing

use k256::ecdsa::SigningKey;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

use crate::{ChainError, ChainResult};

const TX_TYPE_DYNAMIC_FEE: u8 = 0x02;

/// Operator secp256k1 key for transaction signing
pub struct OperatorKey {
    key: SigningKey,
}

impl OperatorKey {
    /// Parse a 32-byte private key from hex
    pub fn from_hex(s: &str) -> ChainResult<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let key =
            SigningKey::from_slice(&bytes).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Ethereum address: low 20 bytes of the Keccak of the public key
    pub fn address(&self) -> [u8; 20] {
        let public = self.key.verifying_key().to_encoded_point(false);
        let digest = Keccak256::digest(&public.as_bytes()[1..]);

        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        out
    }
}

impl std::fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorKey")
            .field("address", &hex::encode(self.address()))
            .finish()
    }
}

/// Dynamic-fee transaction fields
#[derive(Clone, Debug)]
pub struct Eip1559Tx {
    /// Chain id from the client
    pub chain_id: u64,
    /// Sender account nonce
    pub nonce: u64,
    /// Priority fee per gas
    pub max_priority_fee: u128,
    /// Fee cap per gas
    pub max_fee: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient contract
    pub to: [u8; 20],
    /// Value in wei
    pub value: u128,
    /// Call data
    pub data: Vec<u8>,
}

impl Eip1559Tx {
    /// Sign and serialize to raw broadcastable bytes: `0x02 || rlp(...)`
    pub fn sign(&self, operator: &OperatorKey) -> ChainResult<Vec<u8>> {
        let mut preimage = vec![TX_TYPE_DYNAMIC_FEE];
        preimage.extend_from_slice(&self.encode_fields(None));
        let signing_hash = Keccak256::digest(&preimage);

        let (signature, recovery_id) = operator
            .key
            .sign_prehash_recoverable(&signing_hash)
            .map_err(|e| ChainError::ChainIO(format!("signing failed: {}", e)))?;

        let mut raw = vec![TX_TYPE_DYNAMIC_FEE];
        raw.extend_from_slice(&self.encode_fields(Some((
            recovery_id.to_byte(),
            signature.r().to_bytes().into(),
            signature.s().to_bytes().into(),
        ))));
        Ok(raw)
    }

    /// RLP payload; with a signature appended when present
    fn encode_fields(&self, signature: Option<(u8, [u8; 32], [u8; 32])>) -> Vec<u8> {
        let mut stream = RlpStream::new();
        stream.begin_list(if signature.is_some() { 12 } else { 9 });

        append_uint(&mut stream, self.chain_id as u128);
        append_uint(&mut stream, self.nonce as u128);
        append_uint(&mut stream, self.max_priority_fee);
        append_uint(&mut stream, self.max_fee);
        append_uint(&mut stream, self.gas_limit as u128);
        stream.append(&self.to.to_vec());
        append_uint(&mut stream, self.value);
        stream.append(&self.data);
        stream.begin_list(0); // access list

        if let Some((v, r, s)) = signature {
            append_uint(&mut stream, v as u128);
            stream.append(&trim_leading_zeros(&r).to_vec());
            stream.append(&trim_leading_zeros(&s).to_vec());
        }

        stream.out().to_vec()
    }
}

/// Append an integer as its minimal big-endian byte string
fn append_uint(stream: &mut RlpStream, value: u128) {
    let bytes = value.to_be_bytes();
    stream.append(&trim_leading_zeros(&bytes).to_vec());
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> OperatorKey {
        OperatorKey::from_hex(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap()
    }

    #[test]
    fn test_known_address_derivation() {
        // Well-known test vector for the key above
        assert_eq!(
            hex::encode(operator().address()),
            "2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
    }

    #[test]
    fn test_raw_tx_is_typed() {
        let tx = Eip1559Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee: 2,
            max_fee: 100,
            gas_limit: 21_000,
            to: [0x11; 20],
            value: 0,
            data: vec![0xab],
        };

        let raw = tx.sign(&operator()).unwrap();
        assert_eq!(raw[0], TX_TYPE_DYNAMIC_FEE);
        // Signed payload strictly longer than the unsigned preimage
        assert!(raw.len() > tx.encode_fields(None).len());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let tx = Eip1559Tx {
            chain_id: 5,
            nonce: 7,
            max_priority_fee: 1,
            max_fee: 30,
            gas_limit: 100_000,
            to: [0x22; 20],
            value: 0,
            data: vec![],
        };

        assert_eq!(tx.sign(&operator()).unwrap(), tx.sign(&operator()).unwrap());
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 5, 0]), &[5, 0]);
        assert_eq!(trim_leading_zeros(&[0, 0]), &[] as &[u8]);
    }
}
