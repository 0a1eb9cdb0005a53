//! Passphrase verification and caching.
//!
//! # Flow
//!
//! ```text
//! caller ──start(identifier, notifier)──▶ PassphraseService
//!                                           │  per-slot lock
//!                                           ▼
//!                                   VerificationSession
//!                          ┌────────────────┼──────────────────┐
//!                          ▼                ▼                  ▼
//!                  PassphraseCache      KeyStore          Prompter
//!                                           │
//!                                           ▼
//!                                  CredentialVerifier
//! ```
//!
//! A verified passphrase is cached before the caller is notified, so a
//! caller that reacts to [`SessionMessage::Okay`] always finds it in the
//! cache.

pub mod cache;
pub mod channel;
pub mod prompt;
pub mod service;
pub mod session;
pub mod verifier;

pub use cache::{
    spawn_cleanup_task, InMemoryPassphraseCache, PassphraseCache, PassphraseCacheConfig,
};
pub use channel::{result_channel, ResultReceiver, ResultSender, SessionMessage};
pub use prompt::{key_not_found_message, PromptContext, PromptReply, Prompter};
pub use service::PassphraseService;
pub use session::{SessionContext, VerificationOutcome, VerificationSession};
pub use verifier::{probe_no_passphrase, CredentialVerifier, RecordVerifier};
