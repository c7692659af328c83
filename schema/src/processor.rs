//! Schema processing: load, validate, parse slots

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use sigil_claims::{ParsedSlots, SchemaHash};
use sigil_store::CancelToken;

use crate::cache::url_hash;
use crate::{SchemaCache, SchemaError, SchemaLoader, SchemaResult, DEFAULT_IPFS_GATEWAY};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps schema documents and raw data onto claim slots
pub struct SchemaProcessor {
    client: Client,
    cache: Option<Arc<dyn SchemaCache>>,
    ipfs_gateway: String,
}

impl SchemaProcessor {
    /// Create a processor without a cache
    pub fn new() -> SchemaResult<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            cache: None,
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        })
    }

    /// Attach a schema cache
    pub fn with_cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the IPFS gateway
    pub fn with_ipfs_gateway(mut self, gateway: &str) -> Self {
        self.ipfs_gateway = gateway.to_string();
        self
    }

    /// Process a claim request against its schema
    ///
    /// Returns the parsed data slots and the truncated Keccak schema hash.
    pub fn process(
        &self,
        schema_url: &str,
        credential_type: &str,
        data: &Value,
        cancel: &CancelToken,
    ) -> SchemaResult<(ParsedSlots, SchemaHash)> {
        let schema_bytes = self.load(schema_url, cancel)?;
        let slots = parse_slots(&schema_bytes, credential_type, data)?;
        let schema_hash = SchemaHash::compute(&schema_bytes, credential_type);
        Ok((slots, schema_hash))
    }

    /// Fetch a schema document, consulting the cache first
    fn load(&self, schema_url: &str, cancel: &CancelToken) -> SchemaResult<Vec<u8>> {
        let key = url_hash(schema_url);
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.get(&key) {
                return Ok(bytes);
            }
        }

        let loader = SchemaLoader::for_url(schema_url)?;
        let bytes = loader.load(&self.client, &self.ipfs_gateway, cancel)?;

        if let Some(cache) = &self.cache {
            cache.put(&key, &bytes);
        }
        Ok(bytes)
    }
}

/// Validate data against the document and assign fields to slots
///
/// The document must declare `credential_type` with a field context; every
/// data field must be declared. Declared fields in sorted order occupy
/// `index_a`, `index_b`, `value_a`, `value_b` (one field per slot), so slot
/// assignment depends only on the schema, not on request field order.
pub fn parse_slots(
    schema_bytes: &[u8],
    credential_type: &str,
    data: &Value,
) -> SchemaResult<ParsedSlots> {
    let document: Value = serde_json::from_slice(schema_bytes)?;
    let fields = declared_fields(&document, credential_type)?;

    let data_fields = data.as_object().ok_or_else(|| {
        SchemaError::SchemaInvalid("claim data must be a JSON object".into())
    })?;

    for key in data_fields.keys() {
        if !fields.contains(key) {
            return Err(SchemaError::SchemaInvalid(format!(
                "field '{}' is not declared by type '{}'",
                key, credential_type
            )));
        }
    }

    let mut values = Vec::new();
    for field in &fields {
        if let Some(value) = data_fields.get(field) {
            if values.len() == 4 {
                return Err(SchemaError::SchemaInvalid(format!(
                    "type '{}' data exceeds four slots",
                    credential_type
                )));
            }
            values.push(integer_value(field, value)?);
        }
    }

    let mut slots = ParsedSlots::default();
    let targets = [
        &mut slots.index_a,
        &mut slots.index_b,
        &mut slots.value_a,
        &mut slots.value_b,
    ];
    for (slot, value) in targets.into_iter().zip(&values) {
        slot[..8].copy_from_slice(&value.to_le_bytes());
    }

    Ok(slots)
}

/// Field names declared for a credential type, sorted
fn declared_fields(document: &Value, credential_type: &str) -> SchemaResult<Vec<String>> {
    let contexts = match document.get("@context") {
        Some(Value::Array(entries)) => entries.clone(),
        Some(object @ Value::Object(_)) => vec![object.clone()],
        _ => {
            return Err(SchemaError::SchemaInvalid(
                "document has no @context".into(),
            ))
        }
    };

    for context in contexts {
        let Some(type_entry) = context.get(credential_type) else {
            continue;
        };
        let Some(Value::Object(field_context)) = type_entry.get("@context") else {
            return Err(SchemaError::SchemaInvalid(format!(
                "type '{}' declares no field context",
                credential_type
            )));
        };

        let mut fields: Vec<String> = field_context
            .keys()
            .filter(|k| !k.starts_with('@'))
            .cloned()
            .collect();
        fields.sort();

        if fields.is_empty() {
            return Err(SchemaError::SchemaInvalid(format!(
                "type '{}' declares no fields",
                credential_type
            )));
        }
        return Ok(fields);
    }

    Err(SchemaError::SchemaInvalid(format!(
        "type '{}' not found in schema",
        credential_type
    )))
}

fn integer_value(field: &str, value: &Value) -> SchemaResult<u64> {
    value.as_u64().ok_or_else(|| {
        SchemaError::SchemaInvalid(format!(
            "field '{}' must be a non-negative integer",
            field
        ))
    })
}
