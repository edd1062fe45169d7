//! CLI command implementations

pub mod add;
pub mod config;
pub mod delete;
pub mod list;
pub mod logs;
pub mod note;
pub mod parse;
pub mod show;
pub mod stats;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use billpay_core::config::Config;
use billpay_core::{BillpayContext, EntryPoint, LogEvent, LoggingService};
use uuid::Uuid;

/// Get the logging service for CLI operations
///
/// Returns None when event logging is switched off or fails to initialize;
/// logging never blocks a command.
pub fn get_logger() -> Option<LoggingService> {
    let billpay_dir = get_billpay_dir().ok()?;
    std::fs::create_dir_all(&billpay_dir).ok()?;
    let config = Config::load(&billpay_dir).unwrap_or_default();
    if !config.event_logging {
        return None;
    }
    LoggingService::new(&billpay_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Data directory from `BILLPAY_DIR` or `~/.billpay`
pub fn get_billpay_dir() -> Result<PathBuf> {
    billpay_core::config::billpay_dir()
}

/// Open the ledger, creating the data directory on first use
pub fn get_context() -> Result<BillpayContext> {
    let billpay_dir = get_billpay_dir()?;

    std::fs::create_dir_all(&billpay_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", billpay_dir))?;

    BillpayContext::new(&billpay_dir).context("Failed to initialize billpay context")
}

/// Message text from the argument, a file, or piped stdin, in that order
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        Ok(text.to_string())
    } else if let Some(file_path) = file {
        std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read message file: {:?}", file_path))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read message from stdin")?;
        Ok(buffer)
    } else {
        bail!("No message provided. Use positional argument, --file, or pipe from stdin.");
    }
}

/// Resolve a full id or a unique id prefix (as shown by `bp list`)
pub fn resolve_id(ctx: &BillpayContext, id: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    let prefix = id.trim().to_lowercase();
    if prefix.is_empty() {
        bail!("Record ID must not be empty");
    }

    let matches: Vec<Uuid> = ctx
        .history_service
        .list(&Default::default())?
        .into_iter()
        .map(|stored| stored.id)
        .filter(|uuid| uuid.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [uuid] => Ok(*uuid),
        [] => bail!("No record found with ID '{}'", id),
        _ => bail!("ID prefix '{}' matches {} records; use more characters", id, matches.len()),
    }
}
