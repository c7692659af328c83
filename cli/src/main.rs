//! Sigil issuer CLI
//!
//! Operator commands over a local issuer store: create the identity, issue
//! and revoke credentials, inspect state and revocation status.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sigil::issuer::Issuer;
use sigil_claims::SubjectPosition;
use sigil_identity::CreateClaimRequest;
use sigil_schema::SchemaProcessor;
use sigil_store::{CancelToken, RedbStore};

use config::SigilConfig;

#[derive(Parser)]
#[command(name = "sigil", version, about = "Self-sovereign credential issuer")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sigil.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the identity (or confirm it exists) and print the identifier
    Init,

    /// Print the identifier and current tree roots
    Show,

    /// Issue a credential
    Issue {
        /// Schema document URL
        #[arg(long)]
        schema_url: String,
        /// Credential type
        #[arg(long = "type")]
        schema_type: String,
        /// Claim data as a JSON object
        #[arg(long)]
        data: String,
        /// Subject identifier (hex)
        #[arg(long)]
        subject: Option<String>,
        /// Revocation nonce
        #[arg(long)]
        nonce: u64,
        /// Claim version
        #[arg(long, default_value_t = 0)]
        version: u32,
        /// Expiration (unix seconds)
        #[arg(long)]
        expiration: Option<u64>,
    },

    /// Fetch an issued credential as JSON
    Get {
        /// Claim id (h_index hex)
        id: String,
    },

    /// Revoke a nonce
    Revoke {
        /// Revocation nonce
        nonce: u64,
    },

    /// Print the revocation status of a nonce
    Status {
        /// Revocation nonce
        nonce: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SigilConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.level)?)
        .init();

    let store = Arc::new(RedbStore::open(&config.issuer.store_path)?);
    let schema = Arc::new(
        SchemaProcessor::new()?.with_ipfs_gateway(&config.schema.ipfs_gateway),
    );

    let issuer = Issuer::new(
        store,
        config.secret_key_bytes()?,
        &config.issuer.base_url,
        schema,
        config.issuer.tree_depth,
    )?;

    match cli.command {
        Command::Init => {
            let state = issuer.get_identity()?;
            info!(identifier = %state.identifier, "identity ready");
            println!("{}", state.identifier);
        }
        Command::Show => {
            let state = issuer.get_identity()?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Issue {
            schema_url,
            schema_type,
            data,
            subject,
            nonce,
            version,
            expiration,
        } => {
            let subject_position = if subject.is_some() {
                SubjectPosition::Index
            } else {
                SubjectPosition::None
            };

            let response = issuer.add_claim(
                &CreateClaimRequest {
                    schema_url,
                    schema_type,
                    data: serde_json::from_str(&data)?,
                    subject_id: subject,
                    subject_position,
                    expiration,
                    version,
                    revocation_nonce: nonce,
                },
                &CancelToken::new(),
            )?;
            println!("{}", response.id);
        }
        Command::Get { id } => {
            let credential = issuer.get_claim(&id)?;
            println!("{}", serde_json::to_string_pretty(&credential)?);
        }
        Command::Revoke { nonce } => {
            issuer.revoke(nonce)?;
            println!("revoked {}", nonce);
        }
        Command::Status { nonce } => {
            let status = issuer.get_revocation_status(nonce)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
