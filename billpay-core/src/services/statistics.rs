//! Statistics service - payment totals for the dashboard

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Family, Provider, Record, StoredRecord};
use crate::ports::RecordStore;

/// Amount and number of records in one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub count: i64,
    pub amount: Decimal,
}

impl Tally {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.amount += amount;
    }
}

/// Mobile-money amounts per provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderTotals {
    pub bkash: Tally,
    pub nagad: Tally,
    pub rocket: Tally,
    pub other: Tally,
}

impl ProviderTotals {
    fn slot(&mut self, provider: Provider) -> &mut Tally {
        match provider {
            Provider::Bkash => &mut self.bkash,
            Provider::Nagad => &mut self.nagad,
            Provider::Rocket => &mut self.rocket,
            Provider::Other => &mut self.other,
        }
    }

    pub fn get(&self, provider: Provider) -> Tally {
        match provider {
            Provider::Bkash => self.bkash,
            Provider::Nagad => self.nagad,
            Provider::Rocket => self.rocket,
            Provider::Other => self.other,
        }
    }
}

/// Sums of the itemized electricity charges; absent charges count as zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElectricityTotals {
    pub energy_cost: Decimal,
    pub meter_rent: Decimal,
    pub demand_charge: Decimal,
    pub vat: Decimal,
    pub rebate: Decimal,
    pub arrear_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: Tally,
    pub today: Tally,
    pub this_month: Tally,
    pub mobile_payment: Tally,
    pub electricity_token: Tally,
    pub providers: ProviderTotals,
    pub electricity: ElectricityTotals,
}

impl Statistics {
    pub fn family(&self, family: Family) -> Tally {
        match family {
            Family::MobilePayment => self.mobile_payment,
            Family::ElectricityToken => self.electricity_token,
        }
    }
}

/// Compute statistics over `records` relative to the calendar day `today`
///
/// Days are taken from `occurred_at` in UTC.
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a Record>, today: NaiveDate) -> Statistics {
    let mut stats = Statistics::default();

    for record in records {
        let date = record.occurred_at.date_naive();
        stats.total.add(record.amount);
        if date == today {
            stats.today.add(record.amount);
        }
        if date.year() == today.year() && date.month() == today.month() {
            stats.this_month.add(record.amount);
        }

        match record.family() {
            Family::MobilePayment => {
                stats.mobile_payment.add(record.amount);
                if let Some(provider) = record.provider() {
                    stats.providers.slot(provider).add(record.amount);
                }
            }
            Family::ElectricityToken => {
                stats.electricity_token.add(record.amount);
                if let Some(token) = record.electricity() {
                    let sums = &mut stats.electricity;
                    sums.energy_cost += token.energy_cost.unwrap_or_default();
                    sums.meter_rent += token.meter_rent.unwrap_or_default();
                    sums.demand_charge += token.demand_charge.unwrap_or_default();
                    sums.vat += token.vat.unwrap_or_default();
                    sums.rebate += token.rebate.unwrap_or_default();
                    sums.arrear_amount += token.arrear_amount.unwrap_or_default();
                }
            }
        }
    }

    stats
}

pub struct StatisticsService {
    store: Arc<dyn RecordStore>,
}

impl StatisticsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Statistics over every stored record
    pub fn get_statistics(&self) -> Result<Statistics> {
        let records = self.store.list_records()?;
        Ok(summarize_stored(&records, Utc::now().date_naive()))
    }

    /// Statistics over records dated within `from..=to`
    pub fn get_statistics_for_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Statistics> {
        let records = self.store.list_records_by_date_range(from, to)?;
        Ok(summarize_stored(&records, Utc::now().date_naive()))
    }
}

fn summarize_stored(records: &[StoredRecord], today: NaiveDate) -> Statistics {
    summarize(records.iter().map(|s| &s.record), today)
}
