//! Issuer Configuration
//!
//! Handles loading issuer configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full issuer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigilConfig {
    /// Issuer settings
    #[serde(default)]
    pub issuer: IssuerSettings,

    /// Schema loading settings
    #[serde(default)]
    pub schema: SchemaSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Issuer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSettings {
    /// Database path
    pub store_path: PathBuf,
    /// Sparse-Merkle-tree depth
    pub tree_depth: usize,
    /// Base URL embedded into revocation-status descriptors
    pub base_url: String,
    /// Issuer secret key, 64 hex chars
    pub secret_key: String,
}

/// Schema loading settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// IPFS gateway for `ipfs://` schema URLs
    pub ipfs_gateway: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./sigil_data/issuer.db"),
            tree_depth: 40,
            base_url: "http://localhost:8001".to_string(),
            secret_key: String::new(),
        }
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            ipfs_gateway: sigil_schema::DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for SigilConfig {
    fn default() -> Self {
        Self {
            issuer: IssuerSettings::default(),
            schema: SchemaSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SigilConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.tree_depth == 0 || self.issuer.tree_depth > 254 {
            return Err(ConfigError::Invalid(format!(
                "tree_depth {} outside 1..=254",
                self.issuer.tree_depth
            )));
        }

        let key = hex::decode(&self.issuer.secret_key)
            .map_err(|e| ConfigError::Invalid(format!("secret_key: {}", e)))?;
        if key.len() != 32 {
            return Err(ConfigError::Invalid(format!(
                "secret_key must be 32 bytes, got {}",
                key.len()
            )));
        }

        Ok(())
    }

    /// Issuer secret key bytes
    pub fn secret_key_bytes(&self) -> Result<[u8; 32], ConfigError> {
        let bytes = hex::decode(&self.issuer.secret_key)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        bytes
            .try_into()
            .map_err(|_| ConfigError::Invalid("secret_key must be 32 bytes".into()))
    }
}
