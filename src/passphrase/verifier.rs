//! Trial decryption of key records.

use tracing::debug;

use crate::keyring::SecretKeyRecord;
use crate::types::{Passphrase, Result};

/// Checks a passphrase candidate against a key record.
///
/// A wrong passphrase is `Ok(false)`. `Err` is reserved for faults that
/// have nothing to do with the passphrase (malformed record, bad KDF
/// parameters).
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, record: &SecretKeyRecord, candidate: &Passphrase) -> Result<bool>;
}

/// Verifier backed by [`SecretKeyRecord::unlock`].
///
/// The unlocked key material is dropped (and zeroized) immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordVerifier;

impl CredentialVerifier for RecordVerifier {
    fn verify(&self, record: &SecretKeyRecord, candidate: &Passphrase) -> Result<bool> {
        Ok(record.unlock(candidate)?.is_some())
    }
}

/// Whether `record` opens with the empty passphrase.
///
/// Faults count as "passphrase required"; the probe is only a shortcut.
pub fn probe_no_passphrase(verifier: &dyn CredentialVerifier, record: &SecretKeyRecord) -> bool {
    debug!(key_id = %record.key_id, "Checking if key has no passphrase");

    match verifier.verify(record, &Passphrase::empty()) {
        Ok(unprotected) => unprotected,
        Err(e) => {
            debug!(key_id = %record.key_id, error = %e, "No-passphrase probe failed");
            false
        }
    }
}
