//! Add command - parse messages and save them to the ledger

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_event, read_input};
use crate::output;
use billpay_core::services::split_messages;
use billpay_core::LogEvent;

pub fn run(text: Option<&str>, file: Option<&Path>, preview: bool, json: bool) -> Result<()> {
    let input = read_input(text, file)?;
    let messages = split_messages(&input);

    let ctx = get_context()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("add"));

    let result = ctx.ingest_service.ingest_batch(&messages, preview)?;

    for ingested in &result.records {
        let event = if preview { "sms_parsed" } else { "record_saved" };
        log_event(&logger, LogEvent::for_record(event, &ingested.record).with_command("add"));
    }
    for _ in 0..result.skipped {
        log_event(&logger, LogEvent::new("sms_unrecognized").with_command("add"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.discovered == 0 {
        output::warning("No messages found in input.");
        return Ok(());
    }

    if preview {
        output::info("Preview only, nothing was saved.");
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Family", "Provider", "Amount", "Trx ID"]);
    for ingested in &result.records {
        let record = &ingested.record;
        let id = ingested
            .id
            .map(|id| id.to_string().chars().take(8).collect::<String>())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            id,
            record.family().name().to_string(),
            record
                .provider()
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| "-".to_string()),
            output::format_amount(record.amount),
            record.transaction_id.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    if !result.records.is_empty() {
        println!("{}", table);
    }

    let verb = if preview { "Would import" } else { "Imported" };
    output::success(&format!(
        "{} {} of {} message(s)",
        verb, result.imported, result.discovered
    ));
    if result.skipped > 0 {
        println!(
            "{}",
            format!("Skipped {} unrecognized message(s)", result.skipped).dimmed()
        );
    }
    let low_quality = result
        .records
        .iter()
        .filter(|r| r.record.is_low_quality())
        .count();
    if low_quality > 0 {
        output::warning(&format!(
            "{} record(s) have no amount or transaction ID; check the message text.",
            low_quality
        ));
    }

    Ok(())
}
