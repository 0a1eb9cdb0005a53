//! Configuration for Keykeeper
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::passphrase::PassphraseCacheConfig;
use crate::types::{KeyId, KeyIdentifier};

/// Keykeeper - passphrase verification and caching for sealed keys
#[derive(Parser, Debug, Clone)]
#[command(name = "keykeeper")]
#[command(about = "Verify and cache passphrases for sealed signing keys")]
pub struct Args {
    /// Path to the JSON keyring file
    #[arg(long, env = "KEYRING_PATH", default_value = "keyring.json")]
    pub keyring: PathBuf,

    /// How long a verified passphrase stays cached, in seconds
    #[arg(long, env = "PASSPHRASE_CACHE_TTL_SECS", default_value = "180")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached passphrases
    #[arg(long, env = "PASSPHRASE_CACHE_MAX_ENTRIES", default_value = "1000")]
    pub cache_max_entries: usize,

    /// Interval between expired-entry sweeps, in seconds
    #[arg(long, env = "PASSPHRASE_CACHE_CLEANUP_SECS", default_value = "60")]
    pub cache_cleanup_interval_secs: u64,

    /// Treat a prompt left open this long as cancelled (optional)
    #[arg(long, env = "PROMPT_TIMEOUT_SECS")]
    pub prompt_timeout_secs: Option<u64>,

    /// Passphrase attempts before `unlock` gives up
    #[arg(long, env = "MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Append session audit events to this JSONL file
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log: Option<PathBuf>,

    /// Host identifier recorded in audit events
    #[arg(long, env = "HOST_ID", default_value_t = Uuid::new_v4())]
    pub host_id: Uuid,

    #[command(subcommand)]
    pub command: Command,
}

/// Keykeeper commands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Unlock a key, prompting for its passphrase if needed
    Unlock {
        /// Hex key id, "symmetric" or "none"
        key: KeyIdentifier,
    },

    /// Report whether a key is passphrase-protected
    Probe {
        /// Hex key id
        key_id: KeyId,
    },

    /// List the keys in the keyring
    List,
}

impl Args {
    /// Cache settings derived from the CLI options
    pub fn cache_config(&self) -> PassphraseCacheConfig {
        PassphraseCacheConfig {
            default_ttl: Duration::from_secs(self.cache_ttl_secs),
            max_entries: self.cache_max_entries,
            cleanup_interval: Duration::from_secs(self.cache_cleanup_interval_secs),
        }
    }

    pub fn prompt_timeout(&self) -> Option<Duration> {
        self.prompt_timeout_secs.map(Duration::from_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl_secs == 0 {
            return Err("PASSPHRASE_CACHE_TTL_SECS must be greater than zero".to_string());
        }

        if self.cache_max_entries == 0 {
            return Err("PASSPHRASE_CACHE_MAX_ENTRIES must be greater than zero".to_string());
        }

        if self.cache_cleanup_interval_secs == 0 {
            return Err("PASSPHRASE_CACHE_CLEANUP_SECS must be greater than zero".to_string());
        }

        if self.max_attempts == 0 {
            return Err("MAX_ATTEMPTS must be greater than zero".to_string());
        }

        if self.prompt_timeout_secs == Some(0) {
            return Err("PROMPT_TIMEOUT_SECS must be greater than zero".to_string());
        }

        Ok(())
    }
}
