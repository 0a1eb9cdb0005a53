//! Shared types: identifiers, passphrases and errors.

pub mod error;
pub mod key_id;
pub mod passphrase;

pub use error::{KeykeeperError, Result};
pub use key_id::{CacheKey, KeyId, KeyIdentifier};
pub use passphrase::Passphrase;
