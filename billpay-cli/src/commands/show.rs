//! Show command - full detail of one record

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_event, resolve_id};
use crate::output;
use billpay_core::LogEvent;

pub fn run(id: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_event(&get_logger(), LogEvent::new("command_executed").with_command("show"));

    let stored = ctx.history_service.get(resolve_id(&ctx, id)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    println!("{} {}", "Record".bold(), stored.id.to_string().dimmed());
    println!("{}", output::record_detail_table(&stored.record));

    if let Some(notes) = &stored.notes {
        println!("{} {}", "Notes:".bold(), notes);
    }
    println!();
    println!("{}", "Original message:".bold());
    println!("{}", stored.record.raw_text.trim_end());

    output::warn_if_low_quality(&stored.record);
    Ok(())
}
