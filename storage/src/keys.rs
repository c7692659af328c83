//! Persisted keyspace layout
//!
//! Every durable value lives in a flat key/value namespace:
//!
//! - `tree/<tree-id>/nodes/<hash-hex>` → encoded tree node (content-addressed)
//! - `tree/<tree-id>/root`             → current root hash (32 bytes)
//! - `tree/roots/next_index`           → 8-byte big-endian counter
//! - `claims/<h_index_hex>`            → serialized claim record
//! - `identity/identifier`             → 31-byte identifier
//! - `identity/auth_claim_id`          → claim-record key of the auth claim
//! - `identity/published_state`        → last on-chain-confirmed state hash

/// Identifier of the claims tree keyspace
pub const TREE_CLAIMS: &str = "claims";

/// Identifier of the revocations tree keyspace
pub const TREE_REVOCATIONS: &str = "revocations";

/// Identifier of the roots tree keyspace
pub const TREE_ROOTS: &str = "roots";

/// Key of the persisted identifier
pub const IDENTITY_IDENTIFIER: &str = "identity/identifier";

/// Key of the auth claim's record key
pub const IDENTITY_AUTH_CLAIM_ID: &str = "identity/auth_claim_id";

/// Key of the last published state hash
pub const IDENTITY_PUBLISHED_STATE: &str = "identity/published_state";

/// Key of the roots-tree sequence counter
pub const ROOTS_NEXT_INDEX: &str = "tree/roots/next_index";

/// Key of a content-addressed tree node
pub fn tree_node_key(tree_id: &str, hash_hex: &str) -> String {
    format!("tree/{}/nodes/{}", tree_id, hash_hex)
}

/// Key of a tree's root pointer
pub fn tree_root_key(tree_id: &str) -> String {
    format!("tree/{}/root", tree_id)
}

/// Key of a stored claim record
pub fn claim_record_key(h_index_hex: &str) -> String {
    format!("claims/{}", h_index_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(tree_root_key("claims"), "tree/claims/root");
        assert_eq!(tree_node_key("roots", "ab"), "tree/roots/nodes/ab");
        assert_eq!(claim_record_key("00ff"), "claims/00ff");
    }
}
