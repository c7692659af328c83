//! Schema document loaders
//!
//! The transport is chosen from the URL scheme at runtime: plain HTTP(S)
//! fetch, or IPFS content addressed by CID and served through a gateway.

use reqwest::blocking::Client;
use url::Url;

use sigil_store::CancelToken;

use crate::{SchemaError, SchemaResult};

/// Default public IPFS gateway
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io";

/// Transport selected for one schema URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaLoader {
    /// Direct HTTP(S) fetch
    Http {
        /// Document URL
        url: String,
    },
    /// IPFS content fetched through a gateway
    Ipfs {
        /// Original `ipfs://` URL
        url: String,
        /// Content identifier
        cid: String,
    },
}

impl SchemaLoader {
    /// Choose a loader for a URL
    pub fn for_url(raw: &str) -> SchemaResult<Self> {
        let parsed = Url::parse(raw).map_err(|e| SchemaError::InvalidUrl(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => Ok(SchemaLoader::Http {
                url: raw.to_string(),
            }),
            "ipfs" => {
                let cid = parsed
                    .host_str()
                    .ok_or_else(|| SchemaError::InvalidUrl("ipfs URL missing CID".into()))?;
                Ok(SchemaLoader::Ipfs {
                    url: raw.to_string(),
                    cid: cid.to_string(),
                })
            }
            scheme => Err(SchemaError::UnsupportedScheme(scheme.to_string())),
        }
    }

    /// Fetch the document bytes
    pub fn load(
        &self,
        client: &Client,
        ipfs_gateway: &str,
        cancel: &CancelToken,
    ) -> SchemaResult<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }

        let fetch_url = match self {
            SchemaLoader::Http { url } => url.clone(),
            SchemaLoader::Ipfs { url, cid } => {
                let path = ipfs_path(url, cid);
                format!("{}/ipfs/{}", ipfs_gateway.trim_end_matches('/'), path)
            }
        };

        let response = client.get(&fetch_url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        if cancel.is_cancelled() {
            return Err(SchemaError::Cancelled);
        }
        Ok(bytes.to_vec())
    }
}

/// CID plus any path component of the original `ipfs://` URL
fn ipfs_path(url: &str, cid: &str) -> String {
    match url.split_once(cid) {
        Some((_, rest)) => format!("{}{}", cid, rest),
        None => cid.to_string(),
    }
}
