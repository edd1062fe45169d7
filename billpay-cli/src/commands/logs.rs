//! Logs command - view and manage the event log

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_billpay_dir;
use crate::output;
use billpay_core::services::logging::now_ms;
use billpay_core::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let billpay_dir = get_billpay_dir()?;
    std::fs::create_dir_all(&billpay_dir)?;
    LoggingService::new(&billpay_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Epoch-millisecond cutoff `days` before `now_ms`
fn cutoff_ms(now_ms: i64, days: u64) -> Result<i64> {
    i64::try_from(days)
        .ok()
        .and_then(|days| days.checked_mul(MS_PER_DAY))
        .and_then(|span| now_ms.checked_sub(span))
        .ok_or_else(|| anyhow!("--older-than-days {} is too large", days))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => {
            let service = get_logging_service()?;
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Command", "Family", "Provider", "Error"]);

            for entry in &entries {
                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.event.clone(),
                    entry.command.clone().unwrap_or_default(),
                    entry.family.clone().unwrap_or_default(),
                    entry.provider.clone().unwrap_or_default(),
                    if entry.error_message.is_some() {
                        "!".red().to_string()
                    } else {
                        String::new()
                    },
                ]);
            }

            println!("{}", table);

            if !errors {
                let recent_errors: Vec<_> = entries
                    .iter()
                    .filter(|e| e.error_message.is_some())
                    .take(3)
                    .collect();
                if !recent_errors.is_empty() {
                    println!();
                    println!("{}", "Recent Errors:".red().bold());
                    for err in recent_errors {
                        println!(
                            "  {} [{}]: {}",
                            format_timestamp(err.timestamp).dimmed(),
                            err.event,
                            err.error_message.as_deref().unwrap_or("Unknown error")
                        );
                    }
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let cutoff_ms = cutoff_ms(now_ms(), older_than_days)?;
            let service = get_logging_service()?;

            if !force
                && !json
                && !Confirm::new()
                    .with_prompt(format!("Delete logs older than {} days?", older_than_days))
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = service.delete_before(cutoff_ms)?;

            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let service = get_logging_service()?;
            let total = service.count()?;
            let errors = service.get_errors(1000)?.len();
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": total,
                        "error_count": errors,
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
            } else {
                println!("{}", "Log Statistics".bold());
                println!("  Total entries: {}", total);
                println!("  Errors: {}", errors);
                println!("  Database: {}", db_path.display());
                println!("  Size: {}", output::format_size(size_bytes));
            }
        }
    }

    Ok(())
}
