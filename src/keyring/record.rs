//! Sealed secret key records.
//!
//! A record carries an Ed25519 public key and the matching private key
//! sealed under a passphrase-derived key. Everything is base64 so records
//! can live in a JSON keyring file.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::crypto::{
    derive_key_encryption_key, generate_random_bytes, open_private_key, seal_private_key,
    KdfParams, NONCE_LEN, SALT_LEN,
};
use crate::types::{KeyId, KeykeeperError, Passphrase, Result};

/// Display name used when a record carries no user id.
pub const UNKNOWN_USER_ID: &str = "<unknown user id>";

/// A password-sealed private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRecord {
    /// Identifier the key store indexes this record by
    pub key_id: KeyId,

    /// Main user identity bound to the key (display only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Ed25519 public key (base64)
    pub public_key: String,

    /// Sealed private key (base64)
    pub encrypted_private_key: String,

    /// Key derivation salt (base64)
    pub key_derivation_salt: String,

    /// Encryption nonce (base64)
    pub encryption_nonce: String,

    /// Argon2id cost parameters used when sealing
    #[serde(default)]
    pub kdf: KdfParams,
}

impl SecretKeyRecord {
    /// Seal existing key material under `passphrase`.
    ///
    /// Sealing with the empty passphrase produces an unprotected record.
    pub fn seal(
        key_id: KeyId,
        user_id: Option<String>,
        signing_key: &SigningKey,
        passphrase: &Passphrase,
        kdf: KdfParams,
    ) -> Result<Self> {
        let salt: [u8; SALT_LEN] = generate_random_bytes();
        let nonce: [u8; NONCE_LEN] = generate_random_bytes();

        let encryption_key = derive_key_encryption_key(passphrase.as_bytes(), &salt, &kdf)?;
        let encrypted = seal_private_key(&signing_key.to_bytes(), &encryption_key, &nonce)?;

        debug!(key_id = %key_id, "Sealed secret key record");

        Ok(Self {
            key_id,
            user_id,
            public_key: BASE64.encode(signing_key.verifying_key().to_bytes()),
            encrypted_private_key: BASE64.encode(&encrypted),
            key_derivation_salt: BASE64.encode(salt),
            encryption_nonce: BASE64.encode(nonce),
            kdf,
        })
    }

    /// Main user id for prompt text, falling back to a placeholder.
    pub fn main_user_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(UNKNOWN_USER_ID)
    }

    /// Decode the stored public key.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        let bytes: [u8; 32] = decode_field("public key", &self.public_key)?
            .try_into()
            .map_err(|_| KeykeeperError::Verifier("Invalid public key length".into()))?;

        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeykeeperError::Verifier(format!("Invalid public key: {e}")))
    }

    /// Trial-unlock the record with `passphrase`.
    ///
    /// Returns `Ok(None)` for a wrong passphrase. Malformed fields, bad KDF
    /// parameters, or a private key that does not match the public key are
    /// errors.
    pub fn unlock(&self, passphrase: &Passphrase) -> Result<Option<SigningKey>> {
        // 1. Decode stored values
        let salt = decode_field("salt", &self.key_derivation_salt)?;
        let nonce: [u8; NONCE_LEN] = decode_field("nonce", &self.encryption_nonce)?
            .try_into()
            .map_err(|_| KeykeeperError::Verifier("Invalid nonce length".into()))?;
        let encrypted = decode_field("ciphertext", &self.encrypted_private_key)?;
        let expected = self.verifying_key()?;

        // 2. Derive encryption key from passphrase
        let encryption_key = derive_key_encryption_key(passphrase.as_bytes(), &salt, &self.kdf)?;

        // 3. Open private key
        let Some(private_key) = open_private_key(&encrypted, &encryption_key, &nonce)? else {
            return Ok(None);
        };

        // 4. Reconstruct and cross-check against the public key
        let signing_key = SigningKey::from_bytes(&private_key);
        if signing_key.verifying_key() != expected {
            return Err(KeykeeperError::Verifier(format!(
                "Could not extract private key for {}",
                self.key_id
            )));
        }

        Ok(Some(signing_key))
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| KeykeeperError::Verifier(format!("Invalid {name} encoding: {e}")))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_kdf() -> KdfParams {
        KdfParams::new(1024, 1, 1)
    }

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn sealed(passphrase: &str) -> SecretKeyRecord {
        SecretKeyRecord::seal(
            KeyId::new(0x1122),
            Some("Alice <alice@example.com>".to_string()),
            &signing_key(3),
            &Passphrase::from(passphrase),
            fast_kdf(),
        )
        .unwrap()
    }

    #[test]
    fn test_seal_populates_fields() {
        let record = sealed("hunter2");

        assert!(!record.public_key.is_empty());
        assert!(!record.encrypted_private_key.is_empty());
        assert!(!record.key_derivation_salt.is_empty());
        assert!(!record.encryption_nonce.is_empty());
        assert_eq!(record.verifying_key().unwrap(), signing_key(3).verifying_key());
    }

    #[test]
    fn test_unlock_with_correct_passphrase() {
        let record = sealed("hunter2");
        let unlocked = record.unlock(&Passphrase::from("hunter2")).unwrap().unwrap();
        assert_eq!(unlocked.to_bytes(), signing_key(3).to_bytes());
    }

    #[test]
    fn test_unlock_with_wrong_passphrase_is_none() {
        let record = sealed("hunter2");
        assert!(record.unlock(&Passphrase::from("wrong")).unwrap().is_none());
        assert!(record.unlock(&Passphrase::empty()).unwrap().is_none());
    }

    #[test]
    fn test_unprotected_record_opens_with_empty_passphrase() {
        let record = sealed("");
        assert!(record.unlock(&Passphrase::empty()).unwrap().is_some());
    }

    #[test]
    fn test_malformed_nonce_is_fault() {
        let mut record = sealed("hunter2");
        record.encryption_nonce = BASE64.encode([0u8; 8]);

        let result = record.unlock(&Passphrase::from("hunter2"));
        assert!(matches!(result, Err(KeykeeperError::Verifier(_))));
    }

    #[test]
    fn test_bad_base64_is_fault() {
        let mut record = sealed("hunter2");
        record.encrypted_private_key = "not base64!".to_string();

        let result = record.unlock(&Passphrase::from("hunter2"));
        assert!(matches!(result, Err(KeykeeperError::Verifier(_))));
    }

    #[test]
    fn test_mismatched_public_key_is_fault() {
        let mut record = sealed("hunter2");
        record.public_key = BASE64.encode(signing_key(9).verifying_key().to_bytes());

        let result = record.unlock(&Passphrase::from("hunter2"));
        assert!(matches!(result, Err(KeykeeperError::Verifier(_))));
    }

    #[test]
    fn test_main_user_id_fallback() {
        let mut record = sealed("x");
        assert_eq!(record.main_user_id(), "Alice <alice@example.com>");

        record.user_id = None;
        assert_eq!(record.main_user_id(), UNKNOWN_USER_ID);

        record.user_id = Some("   ".to_string());
        assert_eq!(record.main_user_id(), UNKNOWN_USER_ID);
    }

    #[test]
    fn test_record_json_shape() {
        let record = sealed("hunter2");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["key_id"], "0000000000001122");
        assert_eq!(json["kdf"]["memory_kib"], 1024);

        let back: SecretKeyRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
