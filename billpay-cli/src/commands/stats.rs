//! Stats command - payment totals

use anyhow::{bail, Result};
use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment};

use super::{get_context, get_logger, log_event};
use crate::output::{self, format_amount};
use billpay_core::services::{Statistics, Tally};
use billpay_core::{Family, LogEvent, Provider};

pub fn run(from: Option<NaiveDate>, to: Option<NaiveDate>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_event(&get_logger(), LogEvent::new("command_executed").with_command("stats"));

    let stats = match (from, to) {
        (None, None) => ctx.statistics_service.get_statistics()?,
        (Some(from), Some(to)) => ctx.statistics_service.get_statistics_for_range(from, to)?,
        (Some(from), None) => ctx
            .statistics_service
            .get_statistics_for_range(from, chrono::Utc::now().date_naive())?,
        (None, Some(_)) => bail!("--to needs --from"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_statistics(&stats);
    Ok(())
}

fn tally_row(label: &str, tally: Tally) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(tally.count).set_alignment(CellAlignment::Right),
        Cell::new(format_amount(tally.amount)).set_alignment(CellAlignment::Right),
    ]
}

fn print_statistics(stats: &Statistics) {
    println!("{}", "Overview".bold());
    let mut overview = output::create_table();
    overview.set_header(vec!["", "Count", "Amount"]);
    overview.add_row(tally_row("Today", stats.today));
    overview.add_row(tally_row("This month", stats.this_month));
    overview.add_row(tally_row("All time", stats.total));
    println!("{}", overview);
    println!();

    println!("{}", "By family".bold());
    let mut families = output::create_table();
    families.set_header(vec!["Family", "Count", "Amount"]);
    for family in [Family::MobilePayment, Family::ElectricityToken] {
        families.add_row(tally_row(family.name(), stats.family(family)));
    }
    println!("{}", families);
    println!();

    println!("{}", "Mobile money by provider".bold());
    let mut providers = output::create_table();
    providers.set_header(vec!["Provider", "Count", "Amount"]);
    for provider in Provider::NAMED.into_iter().chain([Provider::Other]) {
        providers.add_row(tally_row(provider.name(), stats.providers.get(provider)));
    }
    println!("{}", providers);

    if stats.electricity_token.count > 0 {
        println!();
        println!("{}", "Electricity charges".bold());
        let sums = &stats.electricity;
        let mut charges = output::create_table();
        for (label, amount) in [
            ("Energy cost", sums.energy_cost),
            ("Meter rent", sums.meter_rent),
            ("Demand charge", sums.demand_charge),
            ("VAT", sums.vat),
            ("Rebate", sums.rebate),
            ("Arrear", sums.arrear_amount),
        ] {
            charges.add_row(vec![
                Cell::new(label),
                Cell::new(format_amount(amount)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{}", charges);
    }
}
