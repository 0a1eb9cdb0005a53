//! Verification session state machine.
//!
//! ```text
//! Init ──▶ CacheCheck ──hit──▶ Done(AlreadyCached)
//!  │            │
//!  │ none       ▼
//!  ▼       ProbeOrPrompt ──no record──▶ Done(KeyNotFound)
//! Done(NotRequired) ◀──probe ok──┘ │
//!                                  ▼
//!                              Prompting ──dismissed──▶ Done(Cancelled)
//!                                  │
//!                                  ▼
//!                              Verifying ──▶ Done(Verified | Mismatch)
//! ```
//!
//! Prompting is the only await point that depends on the user. The cache
//! is read before any prompt and written at most once per session.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::PassphraseCache;
use super::prompt::{PromptContext, PromptReply, Prompter};
use super::verifier::{probe_no_passphrase, CredentialVerifier};
use crate::keyring::{KeyStore, SecretKeyRecord};
use crate::types::{CacheKey, KeyId, KeyIdentifier, KeykeeperError, Passphrase, Result};

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// A passphrase for this identifier was already cached
    AlreadyCached,
    /// No passphrase is needed (none mode, or the key opens with "")
    NotRequired,
    /// The candidate unlocked the key and is now cached
    Verified(Passphrase),
    /// The candidate was wrong; nothing was cached
    Mismatch,
    /// The prompt was dismissed or timed out
    Cancelled,
    /// The key store has no record for this id
    KeyNotFound(KeyId),
}

impl VerificationOutcome {
    /// Short name used in logs and audit events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyCached => "already_cached",
            Self::NotRequired => "not_required",
            Self::Verified(_) => "verified",
            Self::Mismatch => "mismatch",
            Self::Cancelled => "cancelled",
            Self::KeyNotFound(_) => "key_not_found",
        }
    }

    /// Whether a usable passphrase is now available to the caller
    pub fn is_unlocked(&self) -> bool {
        matches!(
            self,
            Self::AlreadyCached | Self::NotRequired | Self::Verified(_)
        )
    }

    /// Turn the outcomes that leave the key locked into errors.
    pub fn require_unlocked(self) -> Result<Self> {
        match self {
            Self::Mismatch => Err(KeykeeperError::WrongPassphrase),
            Self::Cancelled => Err(KeykeeperError::Cancelled),
            Self::KeyNotFound(key_id) => Err(KeykeeperError::KeyNotFound(key_id)),
            unlocked => Ok(unlocked),
        }
    }
}

/// Where a session currently is. Only reported in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Init,
    CacheCheck,
    ProbeOrPrompt,
    Prompting,
    Verifying,
    Done,
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub key_store: Arc<dyn KeyStore>,
    pub cache: Arc<dyn PassphraseCache>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub prompter: Arc<dyn Prompter>,

    /// Prompts left open longer than this count as cancelled
    pub prompt_timeout: Option<Duration>,
}

/// One run of the verification protocol for one identifier.
///
/// The session owns the key record and the candidate; both are dropped
/// when [`run`](Self::run) returns.
pub struct VerificationSession<'a> {
    context: &'a SessionContext,
    session_id: String,
    identifier: KeyIdentifier,
    state: SessionState,
}

impl<'a> VerificationSession<'a> {
    pub fn new(context: &'a SessionContext, identifier: KeyIdentifier) -> Self {
        Self {
            context,
            session_id: format!("sess_{}", uuid::Uuid::new_v4()),
            identifier,
            state: SessionState::Init,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Drive the session to its outcome.
    ///
    /// `Err` is returned only for verifier faults; every other way a
    /// session can end is a [`VerificationOutcome`].
    pub async fn run(mut self) -> Result<VerificationOutcome> {
        // Init: none mode never touches the cache or the prompter
        let Some(cache_key) = self.identifier.cache_key() else {
            return Ok(self.finish(VerificationOutcome::NotRequired));
        };

        self.transition(SessionState::CacheCheck);
        if self.context.cache.get(cache_key).is_some() {
            return Ok(self.finish(VerificationOutcome::AlreadyCached));
        }

        self.transition(SessionState::ProbeOrPrompt);
        let (record, prompt_context) = match self.identifier {
            KeyIdentifier::Key(key_id) => match self.resolve_key(key_id).await {
                Resolved::Prompt(record, context) => (Some(record), context),
                Resolved::Done(outcome) => return Ok(self.finish(outcome)),
            },
            _ => (None, PromptContext::Symmetric),
        };

        self.transition(SessionState::Prompting);
        let candidate = match self.prompt(&prompt_context).await {
            PromptReply::Passphrase(candidate) => candidate,
            PromptReply::Cancelled => return Ok(self.finish(VerificationOutcome::Cancelled)),
        };

        // Entries are keyed by the record that was found, not the request
        let commit_key = record
            .as_ref()
            .map_or(cache_key, |record| CacheKey::Key(record.key_id));

        // Symmetric mode has no key to test against
        if let Some(record) = &record {
            self.transition(SessionState::Verifying);
            match self.context.verifier.verify(record, &candidate) {
                Ok(true) => {}
                Ok(false) => {
                    self.context.prompter.wrong_passphrase(&prompt_context);
                    return Ok(self.finish(VerificationOutcome::Mismatch));
                }
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        key = %self.identifier,
                        error = %e,
                        "Passphrase verification failed"
                    );
                    self.state = SessionState::Done;
                    return Err(e);
                }
            }
        }

        info!(
            session_id = %self.session_id,
            key = %commit_key,
            "Passphrase verified, caching entered passphrase"
        );
        self.context.cache.put(commit_key, candidate.clone());

        Ok(self.finish(VerificationOutcome::Verified(candidate)))
    }

    /// Look the key up and take the no-passphrase shortcut when it applies.
    async fn resolve_key(&mut self, key_id: KeyId) -> Resolved {
        let Some(record) = self.context.key_store.lookup(key_id) else {
            warn!(session_id = %self.session_id, key_id = %key_id, "Secret key not found");
            self.context.prompter.key_not_found(key_id).await;
            return Resolved::Done(VerificationOutcome::KeyNotFound(key_id));
        };

        if probe_no_passphrase(self.context.verifier.as_ref(), &record) {
            info!(
                session_id = %self.session_id,
                key_id = %key_id,
                "Key has no passphrase, caching empty passphrase"
            );
            self.context
                .cache
                .put(CacheKey::Key(record.key_id), Passphrase::empty());
            return Resolved::Done(VerificationOutcome::NotRequired);
        }

        let user_id = self.context.key_store.main_identifier_of(&record);
        debug!(session_id = %self.session_id, user_id = %user_id, "Prompting for passphrase");

        Resolved::Prompt(record, PromptContext::Key { key_id, user_id })
    }

    async fn prompt(&self, context: &PromptContext) -> PromptReply {
        let request = self.context.prompter.request_passphrase(context);

        match self.context.prompt_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(reply) => reply,
                Err(_) => {
                    debug!(session_id = %self.session_id, "Passphrase prompt timed out");
                    PromptReply::Cancelled
                }
            },
            None => request.await,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            session_id = %self.session_id,
            from = ?self.state,
            to = ?next,
            "Session transition"
        );
        self.state = next;
    }

    fn finish(&mut self, outcome: VerificationOutcome) -> VerificationOutcome {
        self.transition(SessionState::Done);
        debug!(
            session_id = %self.session_id,
            key = %self.identifier,
            outcome = outcome.kind(),
            "Session finished"
        );
        outcome
    }
}

enum Resolved {
    Prompt(SecretKeyRecord, PromptContext),
    Done(VerificationOutcome),
}
