//! Pluggable schema cache
//!
//! The processor consults the cache before fetching and falls through to a
//! direct fetch on miss or when no cache is configured. Entries are keyed
//! by a hash of the document URL; the consistency model is left to the
//! implementation.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Cache key for a schema URL
pub fn url_hash(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex().to_string()
}

/// Schema cache capability
pub trait SchemaCache: Send + Sync {
    /// Look up cached document bytes
    fn get(&self, url_hash: &str) -> Option<Vec<u8>>;

    /// Store document bytes
    fn put(&self, url_hash: &str, bytes: &[u8]);
}

/// In-process cache backed by a map
#[derive(Debug, Default)]
pub struct MemSchemaCache {
    map: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemSchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaCache for MemSchemaCache {
    fn get(&self, url_hash: &str) -> Option<Vec<u8>> {
        self.map.read().get(url_hash).cloned()
    }

    fn put(&self, url_hash: &str, bytes: &[u8]) {
        self.map.write().insert(url_hash.to_string(), bytes.to_vec());
    }
}
