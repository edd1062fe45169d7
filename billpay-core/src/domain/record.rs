//! Payment record domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::Error;

/// Top-level category of a parsed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    MobilePayment,
    ElectricityToken,
}

impl Family {
    /// Stable code used in storage and on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Family::MobilePayment => "mobile_payment",
            Family::ElectricityToken => "electricity_token",
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Family::MobilePayment => "Mobile Payment",
            Family::ElectricityToken => "Electricity Token",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "mobile_payment" | "mobile" => Ok(Family::MobilePayment),
            "electricity_token" | "electricity" => Ok(Family::ElectricityToken),
            other => Err(Error::validation(format!("Unknown family: {}", other))),
        }
    }
}

/// Mobile financial service that issued a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Bkash,
    Nagad,
    Rocket,
    Other,
}

impl Provider {
    /// The three providers the classifier can recognize by name
    pub const NAMED: [Provider; 3] = [Provider::Bkash, Provider::Nagad, Provider::Rocket];

    pub fn code(&self) -> &'static str {
        match self {
            Provider::Bkash => "bkash",
            Provider::Nagad => "nagad",
            Provider::Rocket => "rocket",
            Provider::Other => "other",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Bkash => "bKash",
            Provider::Nagad => "Nagad",
            Provider::Rocket => "Rocket",
            Provider::Other => "Other",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bkash" => Ok(Provider::Bkash),
            "nagad" => Ok(Provider::Nagad),
            "rocket" => Ok(Provider::Rocket),
            "other" => Ok(Provider::Other),
            other => Err(Error::validation(format!("Unknown provider: {}", other))),
        }
    }
}

/// Itemized charges printed on a prepaid-electricity token message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricityToken {
    pub meter_number: Option<String>,
    pub token: Option<String>,
    pub sequence_number: Option<i32>,
    pub energy_cost: Option<Decimal>,
    pub meter_rent: Option<Decimal>,
    pub demand_charge: Option<Decimal>,
    pub vat: Option<Decimal>,
    /// Rebates may be credits, so this is the only signed charge
    pub rebate: Option<Decimal>,
    pub arrear_amount: Option<Decimal>,
    /// Total paid for the token, inclusive of charges and rebates
    pub vending_amount: Option<Decimal>,
}

/// Family-specific part of a record
///
/// Only one family's fields can exist on a record at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum RecordDetails {
    MobilePayment {
        provider: Provider,
        phone_number: Option<String>,
    },
    ElectricityToken(ElectricityToken),
}

/// Structured output of parsing one SMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical transaction total; zero when the message carried no amount
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub customer_name: Option<String>,
    #[serde(flatten)]
    pub details: RecordDetails,
    /// Original message, kept verbatim for audit
    pub raw_text: String,
    /// Time of parsing
    pub occurred_at: DateTime<Utc>,
}

impl Record {
    /// Create a record with no optional fields set
    pub fn new(details: RecordDetails, raw_text: impl Into<String>) -> Self {
        Self {
            amount: Decimal::ZERO,
            transaction_id: None,
            customer_name: None,
            details,
            raw_text: raw_text.into(),
            occurred_at: now(),
        }
    }

    pub fn family(&self) -> Family {
        match self.details {
            RecordDetails::MobilePayment { .. } => Family::MobilePayment,
            RecordDetails::ElectricityToken(_) => Family::ElectricityToken,
        }
    }

    /// Provider, only meaningful for mobile payments
    pub fn provider(&self) -> Option<Provider> {
        match self.details {
            RecordDetails::MobilePayment { provider, .. } => Some(provider),
            RecordDetails::ElectricityToken(_) => None,
        }
    }

    pub fn phone_number(&self) -> Option<&str> {
        match &self.details {
            RecordDetails::MobilePayment { phone_number, .. } => phone_number.as_deref(),
            RecordDetails::ElectricityToken(_) => None,
        }
    }

    pub fn electricity(&self) -> Option<&ElectricityToken> {
        match &self.details {
            RecordDetails::ElectricityToken(token) => Some(token),
            RecordDetails::MobilePayment { .. } => None,
        }
    }

    /// A zero amount with no transaction id usually means extraction failed
    /// rather than a genuine zero-value payment.
    pub fn is_low_quality(&self) -> bool {
        self.amount.is_zero() && self.transaction_id.is_none()
    }
}

/// Current time at the microsecond resolution the store keeps
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A record as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: Record,
    /// Free-form user notes
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(record: Record) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            notes: None,
            created_at: now(),
        }
    }
}
