//! Sealed key records and the stores that hold them.
//!
//! # Record format
//!
//! Each record holds an Ed25519 keypair:
//! - Public key in the clear
//! - Private key sealed with a passphrase (Argon2id + ChaCha20-Poly1305)
//!
//! A record sealed with the empty passphrase is unprotected: it opens with
//! `""` and never needs a prompt.

pub mod crypto;
pub mod record;
pub mod store;

pub use crypto::{KdfParams, NONCE_LEN, SALT_LEN};
pub use record::{SecretKeyRecord, UNKNOWN_USER_ID};
pub use store::{FileKeyStore, InMemoryKeyStore, KeyStore, KeyringFile};
