//! One-shot result channel between a verification session and its caller.
//!
//! The caller keeps the receiver; the session sends [`SessionMessage::Okay`]
//! once the passphrase is verified and cached. Every other outcome leaves
//! the channel silent.

use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Message delivered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SessionMessage {
    /// Passphrase verified and cached
    Okay = 1,
}

impl SessionMessage {
    /// Wire value of the message discriminant
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Create a connected sender/receiver pair.
pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = oneshot::channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Sending half, consumed by the first notification.
#[derive(Debug)]
pub struct ResultSender {
    tx: oneshot::Sender<SessionMessage>,
}

impl ResultSender {
    /// Deliver `message` to the caller.
    ///
    /// A receiver that has gone away is logged and otherwise ignored.
    /// Returns whether the message was delivered.
    pub fn notify(self, message: SessionMessage) -> bool {
        match self.tx.send(message) {
            Ok(()) => {
                debug!(code = message.code(), "Delivered session result");
                true
            }
            Err(_) => {
                warn!(
                    code = message.code(),
                    "Failed to deliver session result, is the receiver still present?"
                );
                false
            }
        }
    }

    /// Whether the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half held by the caller.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: oneshot::Receiver<SessionMessage>,
}

impl ResultReceiver {
    /// Wait for the session result.
    ///
    /// Resolves to `None` when the session ended without notifying.
    pub async fn recv(self) -> Option<SessionMessage> {
        self.rx.await.ok()
    }

    /// Non-blocking check for a delivered message.
    pub fn try_recv(&mut self) -> Option<SessionMessage> {
        self.rx.try_recv().ok()
    }
}
