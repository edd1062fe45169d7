//! Output formatting utilities

use billpay_core::{Record, StoredRecord};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount in taka, e.g. `Tk 1,250.50`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}Tk {}.{}", sign, grouped, fraction)
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// First 8 characters of an id, enough to tell records apart on screen
pub fn short_id(stored: &StoredRecord) -> String {
    stored.id.to_string().chars().take(8).collect()
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Where the payment came from: provider for mobile money, meter otherwise
fn source(record: &Record) -> String {
    match (record.provider(), record.electricity()) {
        (Some(provider), _) => provider.name().to_string(),
        (None, Some(token)) => format!("Meter {}", or_dash(token.meter_number.as_deref())),
        (None, None) => "-".to_string(),
    }
}

/// Table of stored records, one per row
pub fn records_table(records: &[StoredRecord]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Date", "Family", "Source", "Amount", "Trx ID", "Notes"]);

    for stored in records {
        let record = &stored.record;
        table.add_row(vec![
            Cell::new(short_id(stored)),
            Cell::new(record.occurred_at.format("%Y-%m-%d %H:%M")),
            Cell::new(record.family().name()),
            Cell::new(source(record)),
            Cell::new(format_amount(record.amount)).set_alignment(CellAlignment::Right),
            Cell::new(or_dash(record.transaction_id.as_deref())),
            Cell::new(or_dash(stored.notes.as_deref())),
        ]);
    }

    table
}

/// Key-value table with every field of one record
pub fn record_detail_table(record: &Record) -> Table {
    let mut table = create_table();
    let mut row = |label: &str, value: String| {
        table.add_row(vec![Cell::new(label).fg(comfy_table::Color::Cyan), Cell::new(value)]);
    };

    row("Family", record.family().name().to_string());
    row("Amount", format_amount(record.amount));
    row("Transaction ID", or_dash(record.transaction_id.as_deref()));
    row("Customer", or_dash(record.customer_name.as_deref()));

    if let Some(provider) = record.provider() {
        row("Provider", provider.name().to_string());
        row("Phone", or_dash(record.phone_number()));
    }

    if let Some(token) = record.electricity() {
        let money = |value: Option<Decimal>| value.map(format_amount).unwrap_or_else(|| "-".into());
        row("Meter No", or_dash(token.meter_number.as_deref()));
        row("Token", or_dash(token.token.as_deref()));
        row(
            "Sequence",
            token
                .sequence_number
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into()),
        );
        row("Energy Cost", money(token.energy_cost));
        row("Meter Rent", money(token.meter_rent));
        row("Demand Charge", money(token.demand_charge));
        row("VAT", money(token.vat));
        row("Rebate", money(token.rebate));
        row("Arrear", money(token.arrear_amount));
        row("Vending Amount", money(token.vending_amount));
    }

    row("Parsed At", record.occurred_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    table
}

/// Warn when a record looks like extraction mostly failed
pub fn warn_if_low_quality(record: &Record) {
    if record.is_low_quality() {
        warning("No amount or transaction ID found; check the message text.");
    }
}
