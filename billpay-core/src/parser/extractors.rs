//! Field extractors - the fixed catalog of labeled pattern matchers
//!
//! Every semantic field has exactly one entry: a compiled pattern whose first
//! capture group holds the value, plus the reader that normalizes it. All
//! label synonyms for a field live inside that one pattern. The catalog is
//! compiled on first use and shared read-only for the life of the process.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use super::compile;
use crate::domain::Provider;

/// Leading digits of a national mobile number
pub const MOBILE_PREFIX: &str = "01";

/// Length of a national mobile number
pub const MOBILE_NUMBER_LEN: usize = 11;

/// Currency tokens that may trail a captured amount
const CURRENCY_SUFFIXES: [&str; 4] = ["tk.", "tk", "bdt", "৳"];

/// Labels whose figure is never the amount moved by the transaction
const NON_AMOUNT_LABELS: [&str; 4] = ["balance", "bal", "fee", "charge"];

/// Semantic fields the catalog can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Electricity transaction id (`Trx ID`, `RTrx ID`)
    TransactionId,
    BkashTransactionId,
    NagadTransactionId,
    RocketTransactionId,
    /// Generic mobile-money amount (`Tk 500.00`, `500.00 Tk`, `Amount: 500`)
    Amount,
    PhoneNumber,
    MeterNumber,
    Token,
    SequenceNumber,
    EnergyCost,
    MeterRent,
    DemandCharge,
    Vat,
    Rebate,
    ArrearAmount,
    VendingAmount,
    CustomerName,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::TransactionId,
        Field::BkashTransactionId,
        Field::NagadTransactionId,
        Field::RocketTransactionId,
        Field::Amount,
        Field::PhoneNumber,
        Field::MeterNumber,
        Field::Token,
        Field::SequenceNumber,
        Field::EnergyCost,
        Field::MeterRent,
        Field::DemandCharge,
        Field::Vat,
        Field::Rebate,
        Field::ArrearAmount,
        Field::VendingAmount,
        Field::CustomerName,
    ];
}

/// The transaction-id field used for a mobile-money provider
pub fn transaction_id_field(provider: Provider) -> Field {
    match provider {
        Provider::Bkash => Field::BkashTransactionId,
        Provider::Nagad => Field::NagadTransactionId,
        Provider::Rocket => Field::RocketTransactionId,
        Provider::Other => Field::TransactionId,
    }
}

/// A matched and normalized field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Decimal(Decimal),
    Integer(i32),
}

impl RawValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RawValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            RawValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

type Reader = fn(&Regex, &str) -> Option<RawValue>;

struct Extractor {
    pattern: Regex,
    read: Reader,
}

/// Money pattern: label, optional parenthesized qualifier such as `(5%)`,
/// separators, optional leading currency, then the number
fn money(label: &str, number: &str) -> String {
    format!(
        r"(?i){label}(?:\s*\([^)]*\))?[:\s]*(?:(?:tk\.?|bdt|৳)\s*)?({number})(?:\s*(?:tk|bdt|৳))?"
    )
}

const UNSIGNED: &str = r"[0-9][0-9.,]*";
const SIGNED: &str = r"-?[0-9][0-9.,]*";

fn entry(field: Field) -> (String, Reader) {
    match field {
        Field::TransactionId => (
            r"(?i)\bR?Trx\.?\s*ID[:\s]*([A-Z0-9]+)".to_string(),
            first_text,
        ),
        Field::BkashTransactionId => (
            r"(?i)\bTrx\.?\s*ID[:\s]*([A-Z0-9]+)".to_string(),
            first_text,
        ),
        Field::NagadTransactionId => (
            r"(?i)\b(?:Txn|Trx)\.?\s*ID[:\s]*([A-Z0-9]+)".to_string(),
            first_text,
        ),
        Field::RocketTransactionId => (
            r"(?i)\b(?:Txn\s*ID|Trx\.?\s*ID|Ref(?:erence)?\s*No\.?)[:\s]*([A-Z0-9]+)".to_string(),
            first_text,
        ),
        // Currency before the number, or after it when no other number follows
        Field::Amount => (
            concat!(
                r"(?i)(?:\btk\.?|\bbdt|৳|\bamount[:\s]*)\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
                r"|\b([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:tk\b\.?|bdt\b|৳)(?:\s*$|\s*[^\s0-9])",
            )
            .to_string(),
            transaction_amount,
        ),
        Field::PhoneNumber => (r"[0-9]+".to_string(), mobile_number),
        Field::MeterNumber => (
            r"(?i)\bmeter\s*(?:no\.?|number)[:\s]*([0-9]+)".to_string(),
            first_text,
        ),
        Field::Token => (
            r"(?i)\btoken(?:\(s\))?(?:[:\s]+is\s+|[:\s]+)([0-9](?:[0-9-]*[0-9])?)".to_string(),
            first_text,
        ),
        Field::SequenceNumber => (
            r"(?i)\b(?:seq(?:uence)?(?:\s*no\.?)?|squno)[:\s]*([0-9]+)".to_string(),
            first_integer,
        ),
        Field::EnergyCost => (money(r"\b(?:enrg|energy)\s*cost", UNSIGNED), first_decimal),
        Field::MeterRent => (money(r"\bmeter\s*rent", UNSIGNED), first_decimal),
        Field::DemandCharge => (money(r"\bdemand\s*charge", UNSIGNED), first_decimal),
        Field::Vat => (money(r"\bvat\b", UNSIGNED), first_decimal),
        Field::Rebate => (money(r"\brebate", SIGNED), first_decimal),
        Field::ArrearAmount => (
            money(r"\barrears?(?:\s*(?:amount|amt))?", UNSIGNED),
            first_decimal,
        ),
        Field::VendingAmount => (
            money(r"\bvending\s*(?:amt|amount)", UNSIGNED),
            first_decimal,
        ),
        Field::CustomerName => (
            r"(?i)\bcustomer\s*name[:\s]*([^,\n]+)".to_string(),
            first_text,
        ),
    }
}

/// Immutable mapping from field to matcher
pub struct Catalog {
    extractors: HashMap<Field, Extractor>,
}

impl Catalog {
    /// Compile the built-in catalog
    ///
    /// Panics on a malformed built-in pattern.
    pub fn builtin() -> Self {
        let extractors = Field::ALL
            .iter()
            .map(|field| {
                let (pattern, read) = entry(*field);
                let extractor = Extractor {
                    pattern: compile(&pattern),
                    read,
                };
                (*field, extractor)
            })
            .collect();

        Self { extractors }
    }

    /// Run one field's extractor over the text
    pub fn extract(&self, field: Field, text: &str) -> Option<RawValue> {
        let extractor = self.extractors.get(&field)?;
        (extractor.read)(&extractor.pattern, text)
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::builtin);

/// Extract a field using the shared catalog
pub fn extract(field: Field, text: &str) -> Option<RawValue> {
    CATALOG.extract(field, text)
}

pub fn extract_text(field: Field, text: &str) -> Option<String> {
    extract(field, text).and_then(RawValue::into_text)
}

pub fn extract_decimal(field: Field, text: &str) -> Option<Decimal> {
    extract(field, text).and_then(|v| v.as_decimal())
}

pub fn extract_integer(field: Field, text: &str) -> Option<i32> {
    extract(field, text).and_then(|v| v.as_integer())
}

/// Normalize captured money text into a decimal
///
/// Strips a trailing currency token, grouping commas and a trailing sentence
/// period. Returns `None` when what remains is not a number.
pub fn normalize_decimal(raw: &str) -> Option<Decimal> {
    let mut value = raw.trim();

    for suffix in CURRENCY_SUFFIXES {
        let stripped = value
            .len()
            .checked_sub(suffix.len())
            .and_then(|split| value.get(split..).map(|tail| (split, tail)))
            .filter(|(_, tail)| tail.eq_ignore_ascii_case(suffix))
            .map(|(split, _)| value[..split].trim_end());
        if let Some(rest) = stripped {
            value = rest;
            break;
        }
    }

    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(cleaned).ok()
}

fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn first_text(pattern: &Regex, text: &str) -> Option<RawValue> {
    first_capture(pattern, text).map(|s| RawValue::Text(s.to_string()))
}

fn first_decimal(pattern: &Regex, text: &str) -> Option<RawValue> {
    first_capture(pattern, text)
        .and_then(normalize_decimal)
        .map(RawValue::Decimal)
}

fn first_integer(pattern: &Regex, text: &str) -> Option<RawValue> {
    first_capture(pattern, text)
        .and_then(|s| s.parse::<i32>().ok())
        .map(RawValue::Integer)
}

/// The earliest amount not labeled as a balance, fee or charge
fn transaction_amount(pattern: &Regex, text: &str) -> Option<RawValue> {
    pattern
        .captures_iter(text)
        .filter(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            !follows_non_amount_label(&text[..start])
        })
        .find_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| normalize_decimal(m.as_str()))
        })
        .map(RawValue::Decimal)
}

/// True when the last word before a match is a balance or fee label
fn follows_non_amount_label(before: &str) -> bool {
    let trimmed = before.trim_end_matches(|c: char| c.is_whitespace() || c == ':' || c == '.');
    let last_word = trimmed
        .rsplit(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("");
    NON_AMOUNT_LABELS
        .iter()
        .any(|label| last_word.eq_ignore_ascii_case(label))
}

/// Pick a mobile number out of every numeric run of the right length
///
/// The first run starting with the mobile prefix wins; failing that, the
/// first run of the right length at all.
fn mobile_number(pattern: &Regex, text: &str) -> Option<RawValue> {
    let runs: Vec<&str> = pattern
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() == MOBILE_NUMBER_LEN)
        .collect();

    runs.iter()
        .find(|run| run.starts_with(MOBILE_PREFIX))
        .or_else(|| runs.first())
        .map(|run| RawValue::Text(run.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_catalog_covers_every_field() {
        let catalog = Catalog::builtin();
        for field in Field::ALL {
            assert!(catalog.extractors.contains_key(&field), "{:?} missing", field);
        }
    }

    #[test]
    fn test_normalize_decimal() {
        assert_eq!(normalize_decimal("1,234.50"), Some(dec("1234.50")));
        assert_eq!(normalize_decimal("538.75 Tk"), Some(dec("538.75")));
        assert_eq!(normalize_decimal("538.75tk."), Some(dec("538.75")));
        assert_eq!(normalize_decimal("20 BDT"), Some(dec("20")));
        assert_eq!(normalize_decimal("20৳"), Some(dec("20")));
        assert_eq!(normalize_decimal("-12.50"), Some(dec("-12.50")));
        assert_eq!(normalize_decimal("500."), Some(dec("500")));
        assert_eq!(normalize_decimal("1.2.3"), None);
        assert_eq!(normalize_decimal(","), None);
        assert_eq!(normalize_decimal(""), None);
    }

    #[test]
    fn test_energy_cost_label_synonyms() {
        assert_eq!(
            extract_decimal(Field::EnergyCost, "Energy Cost: 1,234.50 Tk"),
            Some(dec("1234.50"))
        );
        assert_eq!(
            extract_decimal(Field::EnergyCost, "Enrg Cost:500.00Tk"),
            Some(dec("500.00"))
        );
        assert_eq!(
            extract_decimal(Field::EnergyCost, "ENERGY COST 75"),
            Some(dec("75"))
        );
    }

    #[test]
    fn test_rebate_keeps_sign() {
        assert_eq!(
            extract_decimal(Field::Rebate, "Rebate: -12.50 Tk"),
            Some(dec("-12.50"))
        );
        assert_eq!(
            extract_decimal(Field::Rebate, "Rebate: 12.50"),
            Some(dec("12.50"))
        );
    }

    #[test]
    fn test_unsigned_fields_ignore_minus() {
        // No sign in the pattern, so a negative VAT does not match at all
        assert_eq!(extract_decimal(Field::Vat, "VAT: -25.75 Tk"), None);
        assert_eq!(extract_decimal(Field::Vat, "VAT: 25.75 Tk"), Some(dec("25.75")));
    }

    #[test]
    fn test_vat_with_rate_qualifier() {
        assert_eq!(
            extract_decimal(Field::Vat, "VAT(5%): 25.75 Tk"),
            Some(dec("25.75"))
        );
    }

    #[test]
    fn test_vat_is_whole_word() {
        assert_eq!(extract_decimal(Field::Vat, "private 100"), None);
    }

    #[test]
    fn test_leading_currency_before_amount() {
        assert_eq!(
            extract_decimal(Field::VendingAmount, "Vending Amount: Tk 1,000.00"),
            Some(dec("1000.00"))
        );
    }

    #[test]
    fn test_vending_and_arrear_synonyms() {
        assert_eq!(
            extract_decimal(Field::VendingAmount, "Vending Amt: 538.75 Tk"),
            Some(dec("538.75"))
        );
        assert_eq!(
            extract_decimal(Field::ArrearAmount, "Arrear Amount: 0.00"),
            Some(dec("0.00"))
        );
        assert_eq!(
            extract_decimal(Field::ArrearAmount, "Arrear:15"),
            Some(dec("15"))
        );
    }

    #[test]
    fn test_unparseable_number_is_absent() {
        assert_eq!(extract_decimal(Field::MeterRent, "Meter Rent: 1.0.0 Tk"), None);
        assert_eq!(extract_decimal(Field::MeterRent, "Meter Rent: N/A"), None);
    }

    #[test]
    fn test_transaction_id_qualifier_and_case() {
        assert_eq!(
            extract_text(Field::TransactionId, "Trx ID: ABC123"),
            Some("ABC123".to_string())
        );
        assert_eq!(
            extract_text(Field::TransactionId, "rtrx id:Xy9Z01"),
            Some("Xy9Z01".to_string())
        );
        assert_eq!(
            extract_text(Field::TransactionId, "TRXID 7KQ2"),
            Some("7KQ2".to_string())
        );
    }

    #[test]
    fn test_provider_transaction_ids() {
        assert_eq!(
            extract_text(transaction_id_field(Provider::Bkash), "TrxID ABC12345 at"),
            Some("ABC12345".to_string())
        );
        assert_eq!(
            extract_text(transaction_id_field(Provider::Nagad), "TxnID: 73X5K9P2"),
            Some("73X5K9P2".to_string())
        );
        assert_eq!(
            extract_text(transaction_id_field(Provider::Rocket), "TxnId:3283783829 Date"),
            Some("3283783829".to_string())
        );
        assert_eq!(
            extract_text(transaction_id_field(Provider::Rocket), "Ref No. 99812"),
            Some("99812".to_string())
        );
    }

    #[test]
    fn test_meter_token_sequence() {
        let text = "Meter No: 12345678 Token: 1234-5678-9012-3456-7890 SquNo: 1";
        assert_eq!(extract_text(Field::MeterNumber, text), Some("12345678".to_string()));
        assert_eq!(
            extract_text(Field::Token, text),
            Some("1234-5678-9012-3456-7890".to_string())
        );
        assert_eq!(extract_integer(Field::SequenceNumber, text), Some(1));

        assert_eq!(
            extract_text(Field::Token, "Your Token(s) is 1111-2222-3333"),
            Some("1111-2222-3333".to_string())
        );
        assert_eq!(extract_integer(Field::SequenceNumber, "Sequence: 42"), Some(42));
        assert_eq!(
            extract_text(Field::MeterNumber, "for offline Meter No:0312"),
            Some("0312".to_string())
        );
    }

    #[test]
    fn test_token_skips_label_without_digits() {
        let text = "BREB Prepaid Token... Meter No: 1 Token: 4444-5555";
        assert_eq!(extract_text(Field::Token, text), Some("4444-5555".to_string()));
    }

    #[test]
    fn test_customer_name_trimmed() {
        assert_eq!(
            extract_text(Field::CustomerName, "Customer Name:  Rahim Uddin , Meter No: 1"),
            Some("Rahim Uddin".to_string())
        );
        assert_eq!(extract_text(Field::CustomerName, "Meter No: 1"), None);
    }

    #[test]
    fn test_generic_amount() {
        assert_eq!(
            extract_decimal(Field::Amount, "Cash In Tk 500.00 from 01712345678. Fee Tk 0.00"),
            Some(dec("500.00"))
        );
        assert_eq!(extract_decimal(Field::Amount, "Tk1,500 sent"), Some(dec("1500")));
        assert_eq!(
            extract_decimal(Field::Amount, "Amount: Tk 20.50 received"),
            Some(dec("20.50"))
        );
        assert_eq!(extract_decimal(Field::Amount, "৳ 90 paid"), Some(dec("90")));
        assert_eq!(extract_decimal(Field::Amount, "no money here"), None);
    }

    #[test]
    fn test_amount_with_trailing_currency() {
        let text = "Rocket: 500.00 Tk received from 01812345678. TxnId: 9988";
        assert_eq!(extract_decimal(Field::Amount, text), Some(dec("500.00")));
        assert_eq!(extract_decimal(Field::Amount, "Paid 1,200 BDT to shop"), Some(dec("1200")));
        assert_eq!(extract_decimal(Field::Amount, "Received 90৳"), Some(dec("90")));
        assert_eq!(extract_decimal(Field::Amount, "Received 75 Tk."), Some(dec("75")));
    }

    #[test]
    fn test_amount_skips_balance_and_fee() {
        let text = "Rocket: 500.00 Tk received from 01812345678. TxnId: 9988 Balance Tk 12,000.00";
        assert_eq!(extract_decimal(Field::Amount, text), Some(dec("500.00")));

        let balance_first = "Balance: Tk 12,000.00. Cash In Tk 500.00 from 01712345678";
        assert_eq!(extract_decimal(Field::Amount, balance_first), Some(dec("500.00")));

        let fee_first = "Fee Tk 5.00. Cash Out Tk 1,000.00";
        assert_eq!(extract_decimal(Field::Amount, fee_first), Some(dec("1000.00")));

        assert_eq!(extract_decimal(Field::Amount, "Your Balance Tk 800.00"), None);
        assert_eq!(extract_decimal(Field::Amount, "Coffee Tk 120"), Some(dec("120")));
    }

    #[test]
    fn test_currency_before_next_number_is_not_a_suffix() {
        let text = "Sent to 01712345678 Tk 50.00 TrxID X1";
        assert_eq!(extract_decimal(Field::Amount, text), Some(dec("50.00")));
    }

    #[test]
    fn test_phone_prefers_mobile_prefix_regardless_of_order() {
        let prefixed_last = "Ref 99887766554 sent to 01712345678";
        assert_eq!(
            extract_text(Field::PhoneNumber, prefixed_last),
            Some("01712345678".to_string())
        );

        let prefixed_first = "Sent to 01712345678 Ref 99887766554";
        assert_eq!(
            extract_text(Field::PhoneNumber, prefixed_first),
            Some("01712345678".to_string())
        );
    }

    #[test]
    fn test_phone_falls_back_to_first_eleven_digit_run() {
        let text = "Ref 99887766554 and 55544433322";
        assert_eq!(
            extract_text(Field::PhoneNumber, text),
            Some("99887766554".to_string())
        );
    }

    #[test]
    fn test_phone_ignores_other_lengths() {
        assert_eq!(extract_text(Field::PhoneNumber, "8801712345678 and 0171234567"), None);
    }
}
