//! Hand-written collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;

use keykeeper::keyring::{InMemoryKeyStore, KdfParams, SecretKeyRecord};
use keykeeper::passphrase::{
    CredentialVerifier, InMemoryPassphraseCache, PassphraseCache, PassphraseService,
    PromptContext, PromptReply, Prompter, RecordVerifier,
};
use keykeeper::types::{CacheKey, KeyId, Passphrase, Result};

/// Cheap Argon2 parameters so tests stay fast.
pub fn fast_kdf() -> KdfParams {
    KdfParams::new(1024, 1, 1)
}

pub fn sealed_record(id: u64, user_id: Option<&str>, passphrase: &str) -> SecretKeyRecord {
    SecretKeyRecord::seal(
        KeyId::new(id),
        user_id.map(str::to_string),
        &SigningKey::from_bytes(&[id as u8; 32]),
        &Passphrase::from(passphrase),
        fast_kdf(),
    )
    .unwrap()
}

pub fn typed(passphrase: &str) -> PromptReply {
    PromptReply::Passphrase(Passphrase::from(passphrase))
}

/// Prompter that replays scripted replies and records what it was shown.
#[derive(Default)]
pub struct ScriptedPrompter {
    replies: Mutex<VecDeque<PromptReply>>,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<PromptContext>>,
    pub not_found: Mutex<Vec<KeyId>>,
    pub rejections: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(replies: Vec<PromptReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Wait `delay` before answering each prompt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompt_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn rejection_count(&self) -> usize {
        self.rejections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn request_passphrase(&self, context: &PromptContext) -> PromptReply {
        self.requests.lock().unwrap().push(context.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PromptReply::Cancelled)
    }

    async fn key_not_found(&self, key_id: KeyId) {
        self.not_found.lock().unwrap().push(key_id);
    }

    fn wrong_passphrase(&self, _context: &PromptContext) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }
}

/// Verifier that counts calls before delegating to [`RecordVerifier`].
#[derive(Default)]
pub struct CountingVerifier {
    pub calls: AtomicUsize,
    pub candidates: Mutex<Vec<String>>,
}

impl CountingVerifier {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls made with something other than the empty passphrase.
    pub fn candidate_calls(&self) -> Vec<String> {
        self.candidates
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect()
    }
}

impl CredentialVerifier for CountingVerifier {
    fn verify(&self, record: &SecretKeyRecord, candidate: &Passphrase) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.candidates
            .lock()
            .unwrap()
            .push(candidate.as_str().to_string());
        RecordVerifier.verify(record, candidate)
    }
}

/// Cache that counts reads and writes before delegating to the in-memory cache.
#[derive(Default)]
pub struct CountingCache {
    pub inner: InMemoryPassphraseCache,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

impl CountingCache {
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl PassphraseCache for CountingCache {
    fn get(&self, key: CacheKey) -> Option<Passphrase> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn put(&self, key: CacheKey, passphrase: Passphrase) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, passphrase)
    }
}

/// Everything a test needs to drive the service and inspect its collaborators.
pub struct Harness {
    pub service: PassphraseService,
    pub store: Arc<InMemoryKeyStore>,
    pub cache: Arc<CountingCache>,
    pub verifier: Arc<CountingVerifier>,
    pub prompter: Arc<ScriptedPrompter>,
}

impl Harness {
    pub fn new(records: Vec<SecretKeyRecord>, prompter: ScriptedPrompter) -> Self {
        let store = Arc::new(InMemoryKeyStore::new());
        for record in records {
            store.insert(record);
        }
        let cache = Arc::new(CountingCache::default());
        let verifier = Arc::new(CountingVerifier::default());
        let prompter = Arc::new(prompter);

        let service = PassphraseService::new(
            store.clone(),
            cache.clone(),
            verifier.clone(),
            prompter.clone(),
        );

        Self {
            service,
            store,
            cache,
            verifier,
            prompter,
        }
    }

    pub fn cached(&self, key: CacheKey) -> Option<Passphrase> {
        self.cache.inner.get(key)
    }
}
