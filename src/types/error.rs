//! Error types for Keykeeper
//!
//! Wrong passphrases and cancelled prompts are session outcomes, not errors.
//! They only become errors when a caller asks for an unlocked key via
//! [`VerificationOutcome::require_unlocked`](crate::passphrase::VerificationOutcome::require_unlocked).

use super::KeyId;

/// Main error type for Keykeeper operations
#[derive(Debug, thiserror::Error)]
pub enum KeykeeperError {
    #[error("Key not found: {0}")]
    KeyNotFound(KeyId),

    #[error("Wrong passphrase")]
    WrongPassphrase,

    #[error("Passphrase entry cancelled")]
    Cancelled,

    /// The unlock primitive failed for a reason unrelated to the passphrase.
    #[error("Verifier fault: {0}")]
    Verifier(String),

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeykeeperError {
    /// Convert error to a process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::WrongPassphrase => 2,
            Self::Cancelled => 3,
            Self::KeyNotFound(_) => 4,
            Self::Verifier(_) => 5,
            Self::Keyring(_) => 6,
            Self::Config(_) => 78,
            Self::Internal(_) => 70,
        }
    }

    /// Whether this error reports a genuine fault rather than a user decision
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Verifier(_) | Self::Keyring(_) | Self::Internal(_))
    }
}

impl From<std::io::Error> for KeykeeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

impl From<serde_json::Error> for KeykeeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Keyring(format!("JSON error: {}", err))
    }
}

/// Result type alias for Keykeeper operations
pub type Result<T> = std::result::Result<T, KeykeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_for_outcomes() {
        assert_eq!(KeykeeperError::WrongPassphrase.exit_code(), 2);
        assert_eq!(KeykeeperError::Cancelled.exit_code(), 3);
        assert_eq!(KeykeeperError::KeyNotFound(KeyId::new(7)).exit_code(), 4);
    }

    #[test]
    fn test_fault_classification() {
        assert!(KeykeeperError::Verifier("bad nonce".into()).is_fault());
        assert!(!KeykeeperError::WrongPassphrase.is_fault());
        assert!(!KeykeeperError::Cancelled.is_fault());
    }

    #[test]
    fn test_display_includes_key_id() {
        let err = KeykeeperError::KeyNotFound(KeyId::new(0xABCD));
        assert_eq!(err.to_string(), "Key not found: 000000000000ABCD");
    }
}
