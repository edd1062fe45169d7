//! Note command - attach or clear free-form notes on a record

use anyhow::{bail, Result};

use super::{get_context, get_logger, log_event, resolve_id};
use crate::output;
use billpay_core::LogEvent;

pub fn run(id: &str, text: Option<&str>, clear: bool) -> Result<()> {
    if text.is_none() && !clear {
        bail!("Provide note text, or --clear to remove the existing note.");
    }

    let ctx = get_context()?;
    log_event(&get_logger(), LogEvent::new("command_executed").with_command("note"));

    let uuid = resolve_id(&ctx, id)?;
    let notes = if clear { None } else { text };
    let stored = ctx.history_service.set_notes(uuid, notes)?;

    match stored.notes {
        Some(_) => output::success(&format!("Note saved on {}", output::short_id(&stored))),
        None => output::success(&format!("Note cleared on {}", output::short_id(&stored))),
    }
    Ok(())
}
