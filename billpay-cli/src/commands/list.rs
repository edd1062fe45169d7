//! List command - browse stored records

use anyhow::Result;
use chrono::NaiveDate;

use super::{get_context, get_logger, log_event};
use crate::output;
use billpay_core::services::HistoryFilter;
use billpay_core::{Family, LogEvent, Provider};

pub fn run(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    family: Option<Family>,
    provider: Option<Provider>,
    search: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    log_event(&get_logger(), LogEvent::new("command_executed").with_command("list"));

    let filter = HistoryFilter {
        from,
        to,
        family,
        provider,
        search,
    };
    let mut records = ctx.history_service.list(&filter)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    println!("{}", output::records_table(&records));
    println!("{} record(s)", records.len());
    Ok(())
}
