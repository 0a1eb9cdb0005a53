//! Keykeeper - passphrase verification and caching for sealed signing keys
//!
//! Callers ask for a key to be usable. Keykeeper checks the passphrase
//! cache, takes the no-passphrase shortcut when the key allows it, and
//! otherwise prompts, trial-decrypts the key with the candidate and caches
//! it on success.
//!
//! ## Modules
//!
//! - **types**: key identifiers, zeroizing passphrases, errors
//! - **keyring**: sealed Ed25519 key records and key stores
//! - **passphrase**: cache, verifier, prompt contract, session state machine
//! - **logging**: tracing setup and the JSONL audit log
//! - **terminal**: interactive prompter for the CLI

pub mod config;
pub mod keyring;
pub mod logging;
pub mod passphrase;
pub mod terminal;
pub mod types;

pub use config::Args;
pub use passphrase::{PassphraseService, VerificationOutcome};
pub use types::{KeykeeperError, Result};
