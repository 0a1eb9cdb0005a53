//! Passphrase Service
//!
//! Entry point for callers that need a key unlocked.
//!
//! # Responsibilities
//!
//! - Run one verification session per request
//! - Serialise sessions that target the same cache slot
//! - Notify the caller over the result channel when a prompt was verified
//! - Record finished sessions in the audit log

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::cache::PassphraseCache;
use super::channel::{ResultSender, SessionMessage};
use super::prompt::Prompter;
use super::session::{SessionContext, VerificationOutcome, VerificationSession};
use super::verifier::CredentialVerifier;
use crate::keyring::KeyStore;
use crate::logging::AuditLogger;
use crate::types::{CacheKey, KeyIdentifier, Passphrase, Result};

// =============================================================================
// Passphrase Service
// =============================================================================

/// Service that verifies and caches passphrases.
///
/// Sessions for the same cache slot run one at a time. A session that had to
/// wait re-reads the cache first, so a passphrase entered for the session
/// ahead of it is reused instead of prompting again.
pub struct PassphraseService {
    context: SessionContext,

    /// Per-slot locks held for the duration of a session
    locks: DashMap<CacheKey, Arc<Mutex<()>>>,

    /// Optional JSONL audit log
    audit: Option<AuditLogger>,
}

impl PassphraseService {
    /// Create a service from its collaborators.
    pub fn new(
        key_store: Arc<dyn KeyStore>,
        cache: Arc<dyn PassphraseCache>,
        verifier: Arc<dyn CredentialVerifier>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            context: SessionContext {
                key_store,
                cache,
                verifier,
                prompter,
                prompt_timeout: None,
            },
            locks: DashMap::new(),
            audit: None,
        }
    }

    /// Treat prompts left open longer than `timeout` as cancelled.
    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.context.prompt_timeout = Some(timeout);
        self
    }

    /// Write an audit event for every finished session.
    pub fn with_audit_logger(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one session for `identifier`.
    ///
    /// `notifier` receives [`SessionMessage::Okay`] only when the session
    /// ends `Verified`; it is dropped silently otherwise.
    pub async fn start(
        &self,
        identifier: KeyIdentifier,
        notifier: Option<ResultSender>,
    ) -> Result<VerificationOutcome> {
        let outcome = self.run_session(identifier).await?;
        notify_if_verified(&outcome, notifier);
        Ok(outcome)
    }

    /// Run sessions until one ends in something other than `Mismatch`, or
    /// `max_attempts` sessions have run.
    ///
    /// Retrying is the caller's policy; this helper exists for callers (like
    /// the CLI) that want it. The notifier fires at most once.
    pub async fn unlock_with_retries(
        &self,
        identifier: KeyIdentifier,
        max_attempts: u32,
        notifier: Option<ResultSender>,
    ) -> Result<VerificationOutcome> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = self.run_session(identifier).await?;

            if outcome == VerificationOutcome::Mismatch && attempt < max_attempts {
                debug!(key = %identifier, attempt, max_attempts, "Wrong passphrase, retrying");
                attempt += 1;
                continue;
            }

            if outcome == VerificationOutcome::Mismatch {
                info!(key = %identifier, attempts = attempt, "Giving up after wrong passphrases");
            }

            notify_if_verified(&outcome, notifier);
            return Ok(outcome);
        }
    }

    /// Cached passphrase for `identifier`, if any.
    ///
    /// This is what a caller reads after being told a passphrase is
    /// available.
    pub fn cached_passphrase(&self, identifier: KeyIdentifier) -> Option<Passphrase> {
        identifier
            .cache_key()
            .and_then(|key| self.context.cache.get(key))
    }

    /// Number of slots with a session running or waiting.
    pub fn active_slots(&self) -> usize {
        self.locks.len()
    }

    async fn run_session(&self, identifier: KeyIdentifier) -> Result<VerificationOutcome> {
        let started = Instant::now();
        let session = VerificationSession::new(&self.context, identifier);
        let session_id = session.session_id().to_string();

        let result = match identifier.cache_key() {
            Some(key) => {
                let slot = SlotLock::join(&self.locks, key);
                let _held = slot.mutex.lock().await;

                session.run().await
            }
            None => session.run().await,
        };

        if let Some(audit) = &self.audit {
            let key = identifier.to_string();
            let duration_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(outcome) => {
                    audit
                        .log_completed(&session_id, &key, outcome.kind(), duration_ms)
                        .await
                }
                Err(e) => {
                    audit
                        .log_failed(&session_id, &key, &e.to_string(), duration_ms)
                        .await
                }
            }
        }

        result
    }
}

/// A session's claim on the lock for one cache slot.
///
/// Dropping the claim removes the slot's entry once no other session refers
/// to it. This also runs when the owning future is dropped mid-session.
struct SlotLock<'a> {
    locks: &'a DashMap<CacheKey, Arc<Mutex<()>>>,
    key: CacheKey,
    mutex: Arc<Mutex<()>>,
}

impl<'a> SlotLock<'a> {
    fn join(locks: &'a DashMap<CacheKey, Arc<Mutex<()>>>, key: CacheKey) -> Self {
        let mutex = Arc::clone(&*locks.entry(key).or_default());
        Self { locks, key, mutex }
    }
}

impl Drop for SlotLock<'_> {
    fn drop(&mut self) {
        // Referenced only by the map and this claim
        self.locks.remove_if(&self.key, |_, mutex| {
            Arc::ptr_eq(mutex, &self.mutex) && Arc::strong_count(mutex) == 2
        });
    }
}

fn notify_if_verified(outcome: &VerificationOutcome, notifier: Option<ResultSender>) {
    if let (VerificationOutcome::Verified(_), Some(notifier)) = (outcome, notifier) {
        notifier.notify(SessionMessage::Okay);
    }
}

// =============================================================================
// Tests
// =============================================================================
