//! Parse command - show what a message parses to without saving it

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use super::{get_logger, log_event, read_input};
use crate::output;
use billpay_core::LogEvent;

pub fn run(text: Option<&str>, file: Option<&Path>, json: bool) -> Result<()> {
    let input = read_input(text, file)?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("parse"));

    let Some(record) = billpay_core::parse(&input) else {
        log_event(&logger, LogEvent::new("sms_unrecognized").with_command("parse"));
        bail!("Message not recognized as a mobile payment or electricity token");
    };
    log_event(&logger, LogEvent::for_record("sms_parsed", &record).with_command("parse"));

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("{}", record.family().name().bold());
    println!("{}", output::record_detail_table(&record));
    output::warn_if_low_quality(&record);

    Ok(())
}
