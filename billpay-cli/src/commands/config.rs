//! Config command - show and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_billpay_dir, get_logger, log_event};
use crate::output;
use billpay_core::config::Config;
use billpay_core::LogEvent;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show every setting
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting, e.g. `bp config set receipt.businessName "Rupsha Studio"`
    Set {
        /// Setting key as written in settings.json (app.eventLogging, receipt.footerText, ...)
        key: String,
        /// New value; on/off for app.eventLogging
        value: String,
    },
    /// Turn event logging on
    #[command(name = "logging-on")]
    LoggingOn,
    /// Turn event logging off
    #[command(name = "logging-off")]
    LoggingOff,
}

pub fn run(command: Option<ConfigCommands>) -> Result<()> {
    let billpay_dir = get_billpay_dir()?;
    std::fs::create_dir_all(&billpay_dir)?;
    let mut config = Config::load(&billpay_dir)?;

    let (key, value) = match command {
        Some(ConfigCommands::Show { json }) => return show(&config, json),
        None => return show(&config, false),
        Some(ConfigCommands::Set { key, value }) => (key, value),
        Some(ConfigCommands::LoggingOn) => ("app.eventLogging".to_string(), "on".to_string()),
        Some(ConfigCommands::LoggingOff) => ("app.eventLogging".to_string(), "off".to_string()),
    };

    config.set(&key, &value)?;
    config.save(&billpay_dir)?;

    // Logged after saving, so switching logging off is itself not recorded
    log_event(&get_logger(), LogEvent::new("config_changed").with_command("config"));

    output::success(&format!(
        "{} = {}",
        key,
        config.get(&key).unwrap_or_default()
    ));
    Ok(())
}

fn show(config: &Config, json: bool) -> Result<()> {
    if json {
        let settings: serde_json::Map<String, serde_json::Value> = Config::KEYS
            .iter()
            .map(|key| {
                let value = config.get(key).unwrap_or_default();
                (key.to_string(), serde_json::Value::String(value))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Setting", "Value"]);
    for key in Config::KEYS {
        let value = config.get(key).unwrap_or_default();
        let value = if value.is_empty() {
            "-".dimmed().to_string()
        } else {
            value
        };
        table.add_row(vec![key.to_string(), value]);
    }
    println!("{}", table);
    Ok(())
}
