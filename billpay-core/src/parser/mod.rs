//! SMS parsing engine
//!
//! Turns a free-text payment notification into a [`Record`]:
//!
//! - **classifier**: marker detection, decides family and provider
//! - **extractors**: the fixed catalog of per-field pattern matchers
//! - **builder**: runs the extractor subset for a classification
//!
//! Everything here is pure and synchronous. The only shared state is the
//! compiled pattern catalog, built once and never mutated, so [`parse`] can
//! be called from any number of threads at once.

pub mod builder;
pub mod classifier;
pub mod extractors;

use regex::Regex;

use crate::domain::Record;

pub use builder::build;
pub use classifier::{
    classify, detect_provider, is_electricity_token, is_mobile_payment, mentions_provider,
    Classification,
};
pub use extractors::{Field, RawValue};

/// Compile a built-in pattern
///
/// Built-in patterns are fixed at compile time, so a failure here is a
/// programming error and aborts catalog initialization.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Parse one message
///
/// Returns `None` for blank input and for text that matches no known
/// message family.
pub fn parse(text: &str) -> Option<Record> {
    if text.trim().is_empty() {
        return None;
    }
    let classification = classify(text)?;
    Some(build(classification, text))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{Family, Provider};

    const BREB_SMS: &str = "BREB Prepaid Token... Meter No: 12345678 Token: 1234-5678-9012-3456-7890 SquNo: 1 Enrg Cost: 500.00 Tk Meter Rent: 10.00 Tk Demand Charge: 5.00 Tk VAT: 25.75 Tk Rebate: -2.00 Tk Vending Amt: 538.75 Tk Trx ID: ABC123";

    const BKASH_SMS: &str = "bKash: TrxID ABC12345 confirmed. Tk 500.00 sent to 01712345678";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_electricity_token_end_to_end() {
        let record = parse(BREB_SMS).expect("should parse");

        assert_eq!(record.family(), Family::ElectricityToken);
        assert_eq!(record.amount, dec("538.75"));
        assert_eq!(record.transaction_id.as_deref(), Some("ABC123"));

        let token = record.electricity().unwrap();
        assert_eq!(token.meter_number.as_deref(), Some("12345678"));
        assert_eq!(token.token.as_deref(), Some("1234-5678-9012-3456-7890"));
        assert_eq!(token.sequence_number, Some(1));
        assert_eq!(token.energy_cost, Some(dec("500.00")));
        assert_eq!(token.meter_rent, Some(dec("10.00")));
        assert_eq!(token.demand_charge, Some(dec("5.00")));
        assert_eq!(token.vat, Some(dec("25.75")));
        assert_eq!(token.rebate, Some(dec("-2.00")));
        assert_eq!(token.arrear_amount, None);
        assert_eq!(token.vending_amount, Some(dec("538.75")));
        assert_eq!(record.amount, token.vending_amount.unwrap());
    }

    #[test]
    fn test_parse_mobile_payment_end_to_end() {
        let record = parse(BKASH_SMS).expect("should parse");

        assert_eq!(record.family(), Family::MobilePayment);
        assert_eq!(record.provider(), Some(Provider::Bkash));
        assert_eq!(record.amount, dec("500.00"));
        assert_eq!(record.phone_number(), Some("01712345678"));
        assert_eq!(record.transaction_id.as_deref(), Some("ABC12345"));
    }

    #[test]
    fn test_parse_rejects_unrelated_text() {
        assert!(parse("Hello, your package has shipped.").is_none());
    }

    #[test]
    fn test_parse_rejects_blank_input() {
        assert!(parse("").is_none());
        assert!(parse("   \n\t ").is_none());
    }

    #[test]
    fn test_parse_is_idempotent_apart_from_timestamp() {
        for sms in [BREB_SMS, BKASH_SMS] {
            let first = parse(sms).unwrap();
            let mut second = parse(sms).unwrap();
            second.occurred_at = first.occurred_at;
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_parse_both_marker_sets_resolves_to_electricity() {
        let text = "bKash bill payment: BREB Prepaid Token Meter No: 87654321 Vending Amt: 200.00 Tk TrxID XY99";
        let record = parse(text).unwrap();
        assert_eq!(record.family(), Family::ElectricityToken);
        assert_eq!(record.provider(), None);
        assert_eq!(record.amount, dec("200.00"));
    }

    #[test]
    fn test_partial_message_still_builds() {
        let record = parse("Nagad: payment received").unwrap();
        assert_eq!(record.provider(), Some(Provider::Nagad));
        assert_eq!(record.amount, Decimal::ZERO);
        assert_eq!(record.transaction_id, None);
        assert_eq!(record.phone_number(), None);
        assert!(record.is_low_quality());
    }

    #[test]
    fn test_reb_message_with_customer_name() {
        let text = "REB Prepaid: Customer Name: MD KARIM, Meter No: 0412345, Token(s): 5555-6666-7777, Seq: 3, Energy Cost: 1,234.50 Tk, Arrear Amount: 12.00, Vending Amount: 1,300.00 Tk, RTrx ID: r77K";
        let record = parse(text).unwrap();
        assert_eq!(record.customer_name.as_deref(), Some("MD KARIM"));
        assert_eq!(record.transaction_id.as_deref(), Some("r77K"));

        let token = record.electricity().unwrap();
        assert_eq!(token.meter_number.as_deref(), Some("0412345"));
        assert_eq!(token.token.as_deref(), Some("5555-6666-7777"));
        assert_eq!(token.sequence_number, Some(3));
        assert_eq!(token.energy_cost, Some(dec("1234.50")));
        assert_eq!(token.arrear_amount, Some(dec("12.00")));
        assert_eq!(record.amount, dec("1300.00"));
    }
}
