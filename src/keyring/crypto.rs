//! Cryptographic primitives for sealed key records.
//!
//! # Algorithms
//!
//! - **Key Derivation**: Argon2id (memory-hard, brute-force resistant)
//! - **Encryption**: ChaCha20-Poly1305 (authenticated encryption)
//!
//! A wrong passphrase shows up as an AEAD authentication failure, which
//! [`open_private_key`] reports as `Ok(None)` rather than an error.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::types::{KeykeeperError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Argon2id memory cost in KiB (64 MB)
pub const ARGON2_MEMORY_KB: u32 = 65536;

/// Argon2id iteration count
pub const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id parallelism (threads)
pub const ARGON2_PARALLELISM: u32 = 4;

/// Largest memory cost a stored record may ask for (1 GiB)
pub const MAX_ARGON2_MEMORY_KB: u32 = 1024 * 1024;

/// Largest iteration count a stored record may ask for
pub const MAX_ARGON2_ITERATIONS: u32 = 64;

/// Largest parallelism a stored record may ask for
pub const MAX_ARGON2_PARALLELISM: u32 = 16;

/// Salt length for key derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_LEN: usize = 12;

/// Ed25519 private key length (32 bytes)
pub const PRIVATE_KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 auth tag length (16 bytes)
pub const AUTH_TAG_LEN: usize = 16;

// =============================================================================
// Key Derivation Parameters
// =============================================================================

/// Argon2id cost parameters, stored alongside each sealed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Iteration count
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Reject costs above the configured maximums.
    ///
    /// Records come from disk, so their parameters are untrusted input.
    pub fn check_bounds(&self) -> Result<()> {
        if self.memory_kib > MAX_ARGON2_MEMORY_KB {
            return Err(KeykeeperError::Verifier(format!(
                "Argon2 memory cost {} KiB exceeds maximum {} KiB",
                self.memory_kib, MAX_ARGON2_MEMORY_KB
            )));
        }
        if self.iterations > MAX_ARGON2_ITERATIONS {
            return Err(KeykeeperError::Verifier(format!(
                "Argon2 iteration count {} exceeds maximum {}",
                self.iterations, MAX_ARGON2_ITERATIONS
            )));
        }
        if self.parallelism > MAX_ARGON2_PARALLELISM {
            return Err(KeykeeperError::Verifier(format!(
                "Argon2 parallelism {} exceeds maximum {}",
                self.parallelism, MAX_ARGON2_PARALLELISM
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: ARGON2_MEMORY_KB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// Generate cryptographically secure random bytes (salts and nonces).
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

// =============================================================================
// Key Derivation
// =============================================================================

/// Derive a 256-bit key encryption key from a passphrase using Argon2id.
///
/// The empty passphrase is a valid input; records sealed with it are the
/// "unprotected" keys the no-passphrase probe looks for.
///
/// # Errors
///
/// Fails only when the parameters or salt are unusable, never because the
/// passphrase is wrong. Parameters above the `MAX_ARGON2_*` limits are
/// rejected before any memory is allocated.
pub fn derive_key_encryption_key(
    passphrase: &[u8],
    salt: &[u8],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>> {
    kdf.check_bounds()?;

    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(32))
        .map_err(|e| KeykeeperError::Verifier(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, &mut *key)
        .map_err(|e| KeykeeperError::Verifier(format!("Key derivation failed: {e}")))?;

    Ok(key)
}

// =============================================================================
// Sealing / Opening
// =============================================================================

/// Seal a private key using ChaCha20-Poly1305.
///
/// Returns 48 bytes: the encrypted key followed by the auth tag.
/// The nonce must never be reused with the same encryption key.
pub fn seal_private_key(
    private_key: &[u8; PRIVATE_KEY_LEN],
    encryption_key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(encryption_key));
    cipher
        .encrypt(Nonce::from_slice(nonce), private_key.as_slice())
        .map_err(|e| KeykeeperError::Internal(format!("Encryption failed: {e}")))
}

/// Open a sealed private key.
///
/// Returns `Ok(None)` when authentication fails, which for a well-formed
/// record means the encryption key (and so the passphrase) is wrong.
///
/// # Errors
///
/// Returns an error if the plaintext is not a 32-byte private key.
pub fn open_private_key(
    ciphertext: &[u8],
    encryption_key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
) -> Result<Option<Zeroizing<[u8; PRIVATE_KEY_LEN]>>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(encryption_key));
    let plaintext = match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
        Ok(plaintext) => Zeroizing::new(plaintext),
        Err(_) => return Ok(None),
    };

    if plaintext.len() != PRIVATE_KEY_LEN {
        return Err(KeykeeperError::Verifier(format!(
            "Invalid decrypted key length: expected {}, got {}",
            PRIVATE_KEY_LEN,
            plaintext.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    key.copy_from_slice(&plaintext);
    Ok(Some(key))
}

// =============================================================================
// Tests
// =============================================================================
