//! Delete command - remove a record from the ledger

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use super::{get_context, get_logger, log_event, resolve_id};
use crate::output;
use billpay_core::LogEvent;

pub fn run(id: &str, force: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("delete"));

    let stored = ctx.history_service.get(resolve_id(&ctx, id)?)?;

    // Confirm removal unless --force
    if !force {
        println!("{}", output::records_table(std::slice::from_ref(&stored)));
        println!("\n{}", "This record will be permanently deleted.".yellow());

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    ctx.history_service.delete(stored.id)?;
    log_event(
        &logger,
        LogEvent::for_record("record_deleted", &stored.record).with_command("delete"),
    );

    output::success(&format!("Deleted record {}", output::short_id(&stored)));
    Ok(())
}
