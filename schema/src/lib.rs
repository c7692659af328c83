//! Schema Processing
//!
//! Maps `(schema_url, credential_type, raw_data)` onto claim data slots plus
//! the truncated Keccak schema hash. Documents load over HTTP(S) or an IPFS
//! gateway, with an optional content-addressed cache consulted first.
//!
//! Network I/O is blocking; callers run schema processing before taking any
//! engine lock.

mod cache;
mod error;
mod loader;
mod processor;

pub use cache::{url_hash, MemSchemaCache, SchemaCache};
pub use error::{SchemaError, SchemaResult};
pub use loader::{SchemaLoader, DEFAULT_IPFS_GATEWAY};
pub use processor::SchemaProcessor;
