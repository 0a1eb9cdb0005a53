//! Key identifiers and the cache slots they resolve to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KeykeeperError;

/// Opaque 64-bit identifier of a secret key record.
///
/// Displayed and serialized as 16 upper-case hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(u64);

impl KeyId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for KeyId {
    type Err = KeykeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 16 {
            return Err(KeykeeperError::Config(format!("Invalid key id: '{s}'")));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| KeykeeperError::Config(format!("Invalid key id '{s}': {e}")))
    }
}

impl TryFrom<String> for KeyId {
    type Error = KeykeeperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.to_string()
    }
}

/// What a verification session is about.
///
/// Exactly one of a concrete key, symmetric mode or no-passphrase mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyIdentifier {
    /// A secret key record in the key store
    Key(KeyId),
    /// No asymmetric key involved; the passphrase is the whole secret
    Symmetric,
    /// No passphrase needed at all
    None,
}

impl KeyIdentifier {
    /// The cache slot for this identifier, or `None` when nothing is cached.
    pub fn cache_key(&self) -> Option<CacheKey> {
        match self {
            Self::Key(id) => Some(CacheKey::Key(*id)),
            Self::Symmetric => Some(CacheKey::Symmetric),
            Self::None => None,
        }
    }
}

impl From<KeyId> for KeyIdentifier {
    fn from(id: KeyId) -> Self {
        Self::Key(id)
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(id) => id.fmt(f),
            Self::Symmetric => f.write_str("symmetric"),
            Self::None => f.write_str("none"),
        }
    }
}

impl FromStr for KeyIdentifier {
    type Err = KeykeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symmetric" => Ok(Self::Symmetric),
            "none" => Ok(Self::None),
            _ => s.parse().map(Self::Key),
        }
    }
}

/// Slot in the passphrase cache.
///
/// Symmetric passphrases live in their own slot so they never collide with
/// a key id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Key(KeyId),
    Symmetric,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(id) => id.fmt(f),
            Self::Symmetric => f.write_str("symmetric"),
        }
    }
}
