//! Audit logging for verification sessions
//!
//! Logs one JSONL line per finished session. Passphrases never appear in
//! audit events; only the key, the outcome and the timing do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Session reached an outcome
    SessionCompleted,
    /// Session stopped on a fault
    SessionFailed,
}

/// Audit event for one verification session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: EventType,
    /// Host that ran the session
    pub host_id: String,
    /// Session identifier
    pub session_id: String,
    /// Key identifier (hex id, "symmetric" or "none")
    pub key: String,
    /// Outcome kind (for completed sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Fault description (for failed sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Session duration in milliseconds
    pub duration_ms: u64,
}

impl UnlockEvent {
    /// Create a new audit event
    pub fn new(event_type: EventType, host_id: String, session_id: String, key: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            host_id,
            session_id,
            key,
            outcome: None,
            error: None,
            duration_ms: 0,
        }
    }

    /// Set the outcome kind
    pub fn with_outcome(mut self, outcome: &str) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    /// Set the fault description
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger that writes events to a JSONL file
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Mutex<AuditLoggerInner>>,
    host_id: String,
}

struct AuditLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    /// Create a new audit logger (no output until a file is attached)
    pub fn new(host_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuditLoggerInner {
                writer: None,
                path: None,
            })),
            host_id,
        }
    }

    /// Initialize file logging to the specified path
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let writer = BufWriter::new(file);

        let mut inner = self.inner.lock().await;
        inner.writer = Some(writer);
        inner.path = Some(path.clone());

        info!("Audit logging initialized to {}", path.display());
        Ok(())
    }

    /// Log an audit event
    pub async fn log(&self, event: UnlockEvent) {
        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;

        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write audit event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        }
    }

    /// Log a session that reached an outcome
    pub async fn log_completed(&self, session_id: &str, key: &str, outcome: &str, duration_ms: u64) {
        let event = UnlockEvent::new(
            EventType::SessionCompleted,
            self.host_id.clone(),
            session_id.to_string(),
            key.to_string(),
        )
        .with_outcome(outcome)
        .with_duration(duration_ms);

        self.log(event).await;
    }

    /// Log a session that stopped on a fault
    pub async fn log_failed(&self, session_id: &str, key: &str, error: &str, duration_ms: u64) {
        let event = UnlockEvent::new(
            EventType::SessionFailed,
            self.host_id.clone(),
            session_id.to_string(),
            key.to_string(),
        )
        .with_error(error.to_string())
        .with_duration(duration_ms);

        self.log(event).await;
    }

    /// Path of the attached audit file, if any
    pub async fn path(&self) -> Option<PathBuf> {
        self.inner.lock().await.path.clone()
    }
}
