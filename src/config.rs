//! Configuration for Thought Seal
//!
//! CLI arguments and environment variable handling using clap. A `.env`
//! file is loaded first, so every flag can also come from there.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::license::{GumroadConfig, DEFAULT_VERIFY_URL};
use crate::store::PostgrestConfig;
use crate::types::DEFAULT_PRODUCT_ID;

/// Thought Seal - seal a declaration, prediction or commitment permanently
#[derive(Parser, Debug, Clone)]
#[command(name = "thought-seal")]
#[command(about = "Seal short thoughts with a SHA-256 hash and store them immutably")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Project URL of the hosted database (PostgREST / Supabase)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Anon API key for the hosted database
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// Table holding sealed thoughts
    #[arg(long, env = "THOUGHTS_TABLE", default_value = "thoughts")]
    pub thoughts_table: String,

    /// License registry configuration
    #[command(flatten)]
    pub license: LicenseArgs,

    /// Local state file holding the client id and unlock flag
    /// (defaults to <data dir>/thought-seal/state.json)
    #[arg(long, env = "STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

/// License registry connection
#[derive(Parser, Debug, Clone)]
pub struct LicenseArgs {
    /// Gumroad seller access token (needed to verify keys directly or to serve)
    #[arg(long, env = "GUMROAD_ACCESS_TOKEN")]
    pub gumroad_access_token: Option<String>,

    /// Product license keys are checked against
    #[arg(long, env = "GUMROAD_PRODUCT_ID", default_value = DEFAULT_PRODUCT_ID)]
    pub gumroad_product_id: String,

    /// Gumroad verification endpoint
    #[arg(long, env = "GUMROAD_VERIFY_URL", default_value = DEFAULT_VERIFY_URL)]
    pub gumroad_verify_url: String,

    /// Relay origin to verify through instead of calling Gumroad directly
    /// (e.g. "https://seal.example.com")
    #[arg(long, env = "LICENSE_RELAY_URL")]
    pub license_relay_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Seal a new thought
    Seal {
        /// The thought, up to 800 characters
        content: String,

        /// Make the thought public (only honoured once unlocked)
        #[arg(long)]
        public: bool,
    },

    /// List recently sealed public thoughts
    Public,

    /// List my sealed thoughts
    Mine,

    /// Show one sealed thought by id
    Show {
        id: String,
    },

    /// Redeem a license key for unlimited thoughts and public sharing
    Redeem {
        license_key: String,
    },

    /// Print this profile's client id and unlock state
    Status,

    /// Run the license relay server
    Serve {
        /// Address to listen on
        #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
    },
}

impl Args {
    /// Fallback tracing directive when `RUST_LOG` is unset
    pub fn log_filter(&self) -> String {
        format!("thought_seal={},warn", self.log_level)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.request_timeout_ms.div_ceil(1000).max(1)
    }

    /// Effective state file path
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("thought-seal")
                .join("state.json")
        })
    }

    pub fn postgrest_config(&self) -> PostgrestConfig {
        PostgrestConfig {
            base_url: self.supabase_url.clone().unwrap_or_default(),
            api_key: self.supabase_anon_key.clone(),
            table: self.thoughts_table.clone(),
            timeout_secs: self.timeout_secs(),
        }
    }

    pub fn gumroad_config(&self) -> GumroadConfig {
        GumroadConfig {
            verify_url: self.license.gumroad_verify_url.clone(),
            product_id: self.license.gumroad_product_id.clone(),
            access_token: self.license.gumroad_access_token.clone(),
            timeout_secs: self.timeout_secs(),
        }
    }

    /// Validate configuration for the selected command
    pub fn validate(&self) -> Result<(), String> {
        match self.command {
            Command::Serve { .. } => {
                if self.license.gumroad_access_token.is_none() {
                    return Err("GUMROAD_ACCESS_TOKEN is required to serve".to_string());
                }
            }
            Command::Redeem { .. } => {
                if self.license.license_relay_url.is_none()
                    && self.license.gumroad_access_token.is_none()
                {
                    return Err(
                        "LICENSE_RELAY_URL or GUMROAD_ACCESS_TOKEN is required to redeem".to_string(),
                    );
                }
            }
            Command::Status => {}
            Command::Seal { .. } | Command::Public | Command::Mine | Command::Show { .. } => {
                if self.supabase_url.is_none() {
                    return Err("SUPABASE_URL is required".to_string());
                }
            }
        }
        Ok(())
    }
}
