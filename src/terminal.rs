//! Terminal prompter backed by dialoguer.

use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Password};
use tracing::{debug, warn};

use crate::passphrase::{key_not_found_message, PromptContext, PromptReply, Prompter};
use crate::passphrase::prompt::KEY_NOT_FOUND_TITLE;
use crate::types::{KeyId, Passphrase};

/// Reads passphrases from the controlling terminal.
///
/// Input is hidden. Ctrl-C, EOF or a terminal error all count as a
/// dismissal. Empty input is accepted and verified like any other
/// candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn request_passphrase(&self, context: &PromptContext) -> PromptReply {
        let title = context.title();
        let message = context.message();

        let entered = tokio::task::spawn_blocking(move || {
            eprintln!("{title}");
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .allow_empty_password(true)
                .interact()
        })
        .await;

        match entered {
            Ok(Ok(passphrase)) => PromptReply::Passphrase(Passphrase::new(passphrase)),
            Ok(Err(e)) => {
                debug!(error = %e, "Passphrase prompt dismissed");
                PromptReply::Cancelled
            }
            Err(e) => {
                warn!(error = %e, "Passphrase prompt task failed");
                PromptReply::Cancelled
            }
        }
    }

    async fn key_not_found(&self, key_id: KeyId) {
        eprintln!("{KEY_NOT_FOUND_TITLE}: {}", key_not_found_message(key_id));
    }

    fn wrong_passphrase(&self, _context: &PromptContext) {
        eprintln!("Wrong passphrase");
    }
}
