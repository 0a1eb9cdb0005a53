//! Prompt surface contract.
//!
//! The prompter is the only place a session waits. It collects a candidate
//! from a human (or anything standing in for one) and renders the error and
//! rejection notices the session asks for.

use std::fmt;

use async_trait::async_trait;

use crate::types::{KeyId, Passphrase};

/// Title shown on every passphrase prompt.
pub const PROMPT_TITLE: &str = "Authentication";

/// Title shown when the requested key is missing.
pub const KEY_NOT_FOUND_TITLE: &str = "Key not found";

/// What the prompt is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptContext {
    /// Passphrase is the whole secret
    Symmetric,
    /// Passphrase unlocks a stored key
    Key { key_id: KeyId, user_id: String },
}

impl PromptContext {
    pub fn title(&self) -> &'static str {
        PROMPT_TITLE
    }

    /// Prompt message text.
    pub fn message(&self) -> String {
        match self {
            Self::Symmetric => "Passphrase for symmetric encryption".to_string(),
            Self::Key { user_id, .. } => format!("Passphrase for {user_id}"),
        }
    }
}

impl fmt::Display for PromptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Message shown on the key-not-found surface.
pub fn key_not_found_message(key_id: KeyId) -> String {
    format!("Cannot find key {key_id}")
}

/// Result of one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    Passphrase(Passphrase),
    Cancelled,
}

/// Interactive surface that collects passphrases.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask for a passphrase. Resolves once the user submits or dismisses.
    async fn request_passphrase(&self, context: &PromptContext) -> PromptReply;

    /// Show the key-not-found error. Offers dismissal only.
    async fn key_not_found(&self, key_id: KeyId);

    /// Tell the user the passphrase was rejected.
    fn wrong_passphrase(&self, context: &PromptContext);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_messages() {
        assert_eq!(
            PromptContext::Symmetric.message(),
            "Passphrase for symmetric encryption"
        );

        let context = PromptContext::Key {
            key_id: KeyId::new(1),
            user_id: "Alice <alice@example.com>".to_string(),
        };
        assert_eq!(context.message(), "Passphrase for Alice <alice@example.com>");
        assert_eq!(context.title(), "Authentication");
    }

    #[test]
    fn test_key_not_found_message() {
        assert_eq!(
            key_not_found_message(KeyId::new(0xBEEF)),
            "Cannot find key 000000000000BEEF"
        );
    }
}
