//! Billpay CLI - payment SMS ledger in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use billpay_core::{Family, LogEvent, Provider};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{add, config, delete, list, logs, note, parse, show, stats};

/// Billpay - record bKash, Nagad, Rocket and prepaid electricity SMS payments
#[derive(Parser)]
#[command(name = "bp", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a message and show the extracted fields without saving
    Parse {
        /// Message text (reads stdin when omitted and piped)
        text: Option<String>,
        /// Read the message from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse messages and save them; blank lines separate messages
    Add {
        /// Message text (reads stdin when omitted and piped)
        text: Option<String>,
        /// Read messages from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Preview without saving
        #[arg(long)]
        preview: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved records, newest first
    List {
        /// Earliest date (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only this family (mobile, electricity)
        #[arg(long)]
        family: Option<Family>,
        /// Only this provider (bkash, nagad, rocket, other)
        #[arg(long)]
        provider: Option<Provider>,
        /// Case-insensitive text in the transaction ID, meter number, token or customer name
        #[arg(short, long)]
        search: Option<String>,
        /// Show at most N records
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every field of one record
    Show {
        /// Record ID or unique prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set or clear the note on a record
    Note {
        /// Record ID or unique prefix
        id: String,
        /// Note text
        text: Option<String>,
        /// Remove the existing note
        #[arg(long, conflicts_with = "text")]
        clear: bool,
    },

    /// Delete a record
    Delete {
        /// Record ID or unique prefix
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show payment totals
    Stats {
        /// Earliest date (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<config::ConfigCommands>,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Parse { .. } => "parse",
            Commands::Add { .. } => "add",
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::Note { .. } => "note",
            Commands::Delete { .. } => "delete",
            Commands::Stats { .. } => "stats",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_event(
                &commands::get_logger(),
                LogEvent::new("command_failed")
                    .with_command(command)
                    .with_error(e.to_string()),
            );
            output::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse { text, file, json } => parse::run(text.as_deref(), file.as_deref(), json),
        Commands::Add {
            text,
            file,
            preview,
            json,
        } => add::run(text.as_deref(), file.as_deref(), preview, json),
        Commands::List {
            from,
            to,
            family,
            provider,
            search,
            limit,
            json,
        } => list::run(from, to, family, provider, search, limit, json),
        Commands::Show { id, json } => show::run(&id, json),
        Commands::Note { id, text, clear } => note::run(&id, text.as_deref(), clear),
        Commands::Delete { id, force } => delete::run(&id, force),
        Commands::Stats { from, to, json } => stats::run(from, to, json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
