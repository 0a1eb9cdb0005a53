//! Keykeeper - passphrase verification and caching for sealed signing keys

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use keykeeper::{
    config::{Args, Command},
    keyring::{FileKeyStore, KeyStore},
    logging::{self, AuditLogger},
    passphrase::{
        probe_no_passphrase, result_channel, spawn_cleanup_task, InMemoryPassphraseCache,
        PassphraseService, RecordVerifier, SessionMessage,
    },
    terminal::TerminalPrompter,
    types::{KeyId, KeyIdentifier, KeykeeperError},
    VerificationOutcome,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(KeykeeperError::Config(e).exit_code());
    }

    let result = match &args.command {
        Command::Unlock { key } => unlock(&args, *key).await,
        Command::Probe { key_id } => probe(&args, *key_id),
        Command::List => list(&args),
    };

    if let Err(e) = result {
        if e.is_fault() {
            error!(error = %e, "Command failed");
        }
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn unlock(args: &Args, key: KeyIdentifier) -> keykeeper::Result<()> {
    let key_store = FileKeyStore::load(&args.keyring)?;

    let cache_config = args.cache_config();
    let cleanup_interval = cache_config.cleanup_interval;
    let cache = Arc::new(InMemoryPassphraseCache::new(cache_config));
    let cleanup = spawn_cleanup_task(cache.clone(), cleanup_interval);

    let mut service = PassphraseService::new(
        Arc::new(key_store),
        cache,
        Arc::new(RecordVerifier),
        Arc::new(TerminalPrompter::new()),
    );

    if let Some(timeout) = args.prompt_timeout() {
        service = service.with_prompt_timeout(timeout);
    }

    if let Some(path) = &args.audit_log {
        let audit = AuditLogger::new(args.host_id.to_string());
        audit.init_file(path.clone()).await?;
        service = service.with_audit_logger(audit);
    }

    info!(key = %key, max_attempts = args.max_attempts, "Unlocking key");

    let (notifier, receiver) = result_channel();
    let outcome = service
        .unlock_with_retries(key, args.max_attempts, Some(notifier))
        .await;
    cleanup.abort();

    let outcome = outcome?.require_unlocked()?;

    if receiver.recv().await == Some(SessionMessage::Okay) {
        info!(key = %key, "Passphrase verified and cached");
    }

    match outcome {
        VerificationOutcome::AlreadyCached => println!("{key}: already cached"),
        VerificationOutcome::NotRequired => println!("{key}: no passphrase required"),
        _ => println!("{key}: unlocked"),
    }

    Ok(())
}

fn probe(args: &Args, key_id: KeyId) -> keykeeper::Result<()> {
    let key_store = FileKeyStore::load(&args.keyring)?;
    let record = key_store
        .lookup(key_id)
        .ok_or(KeykeeperError::KeyNotFound(key_id))?;

    if probe_no_passphrase(&RecordVerifier, &record) {
        println!("{key_id}: not protected");
    } else {
        println!("{key_id}: passphrase required");
    }

    Ok(())
}

fn list(args: &Args) -> keykeeper::Result<()> {
    let key_store = FileKeyStore::load(&args.keyring)?;

    for key_id in key_store.key_ids() {
        if let Some(record) = key_store.lookup(key_id) {
            println!("{key_id}  {}", key_store.main_identifier_of(&record));
        }
    }

    Ok(())
}
