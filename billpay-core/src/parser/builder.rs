//! Record builder - runs the extractor subset for a classification

use rust_decimal::Decimal;

use super::classifier::Classification;
use super::extractors::{
    extract_decimal, extract_integer, extract_text, transaction_id_field, Field,
};
use crate::domain::{ElectricityToken, Provider, Record, RecordDetails};

/// Build a record from already-classified text
///
/// Fields that are not found stay `None`; the amount falls back to zero.
pub fn build(classification: Classification, text: &str) -> Record {
    match classification {
        Classification::ElectricityToken => build_electricity_token(text),
        Classification::MobilePayment(provider) => build_mobile_payment(provider, text),
    }
}

fn build_electricity_token(text: &str) -> Record {
    let token = ElectricityToken {
        meter_number: extract_text(Field::MeterNumber, text),
        token: extract_text(Field::Token, text),
        sequence_number: extract_integer(Field::SequenceNumber, text),
        energy_cost: extract_decimal(Field::EnergyCost, text),
        meter_rent: extract_decimal(Field::MeterRent, text),
        demand_charge: extract_decimal(Field::DemandCharge, text),
        vat: extract_decimal(Field::Vat, text),
        rebate: extract_decimal(Field::Rebate, text),
        arrear_amount: extract_decimal(Field::ArrearAmount, text),
        vending_amount: extract_decimal(Field::VendingAmount, text),
    };

    // The vending amount is the total paid for the token
    let amount = token.vending_amount.unwrap_or(Decimal::ZERO);

    let mut record = Record::new(RecordDetails::ElectricityToken(token), text);
    record.amount = amount;
    record.transaction_id = extract_text(Field::TransactionId, text);
    record.customer_name = extract_text(Field::CustomerName, text);
    record
}

fn build_mobile_payment(provider: Provider, text: &str) -> Record {
    let details = RecordDetails::MobilePayment {
        provider,
        phone_number: extract_text(Field::PhoneNumber, text),
    };

    let mut record = Record::new(details, text);
    record.transaction_id = extract_text(transaction_id_field(provider), text);
    record.amount = extract_decimal(Field::Amount, text).unwrap_or(Decimal::ZERO);
    record
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::Family;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_electricity_amount_is_vending_amount() {
        let record = build(
            Classification::ElectricityToken,
            "REB Token: 1234 Vending Amount: 1,050.25 Tk",
        );
        assert_eq!(record.family(), Family::ElectricityToken);
        assert_eq!(record.amount, dec("1050.25"));
        assert_eq!(record.electricity().unwrap().vending_amount, Some(dec("1050.25")));
    }

    #[test]
    fn test_electricity_without_vending_amount_defaults_to_zero() {
        let record = build(Classification::ElectricityToken, "REB Meter No: 5566");
        assert_eq!(record.amount, Decimal::ZERO);
        let token = record.electricity().unwrap();
        assert_eq!(token.meter_number.as_deref(), Some("5566"));
        assert_eq!(token.vending_amount, None);
        assert_eq!(token.energy_cost, None);
        assert!(record.is_low_quality());
    }

    #[test]
    fn test_mobile_payment_fields() {
        let record = build(
            Classification::MobilePayment(Provider::Bkash),
            "bKash: You have received Tk 1,200.00 from 01812345678. TrxID 9FG7HJ2K",
        );
        assert_eq!(record.family(), Family::MobilePayment);
        assert_eq!(record.provider(), Some(Provider::Bkash));
        assert_eq!(record.amount, dec("1200.00"));
        assert_eq!(record.phone_number(), Some("01812345678"));
        assert_eq!(record.transaction_id.as_deref(), Some("9FG7HJ2K"));
        assert!(record.customer_name.is_none());
    }

    #[test]
    fn test_mobile_payment_uses_provider_transaction_label() {
        let text = "Nagad: Money Received. Amount: Tk 300.00 Sender: 01911223344 TxnID: 7A1B2C3D";
        let nagad = build(Classification::MobilePayment(Provider::Nagad), text);
        assert_eq!(nagad.transaction_id.as_deref(), Some("7A1B2C3D"));

        // bKash's label is TrxID, which this message does not contain
        let bkash = build(Classification::MobilePayment(Provider::Bkash), text);
        assert_eq!(bkash.transaction_id, None);
    }

    #[test]
    fn test_mobile_payment_never_carries_electricity_fields() {
        let text = "Rocket: Tk 538.75 paid. Meter No: 12345678 Vending Amt: 538.75 TxnId:55";
        let record = build(Classification::MobilePayment(Provider::Rocket), text);
        assert!(record.electricity().is_none());
        assert_eq!(record.amount, dec("538.75"));
    }

    #[test]
    fn test_mobile_payment_amount_after_number() {
        let text = "Rocket: 500.00 Tk received from 01812345678. TxnId: 9988";
        let record = build(Classification::MobilePayment(Provider::Rocket), text);
        assert_eq!(record.amount, dec("500.00"));
        assert_eq!(record.transaction_id.as_deref(), Some("9988"));
        assert!(!record.is_low_quality());
    }

    #[test]
    fn test_mobile_payment_amount_is_not_balance() {
        let text = "Rocket: 500.00 Tk received from 01812345678. TxnId: 9988 Balance Tk 12,000.00";
        let record = build(Classification::MobilePayment(Provider::Rocket), text);
        assert_eq!(record.amount, dec("500.00"));

        let only_balance = "bKash: Your Balance Tk 12,000.00 TrxID 9FG7HJ2K";
        let record = build(Classification::MobilePayment(Provider::Bkash), only_balance);
        assert_eq!(record.amount, Decimal::ZERO);
    }

    #[test]
    fn test_electricity_never_carries_phone_number() {
        let text = "BREB Token: 1234 Meter No: 12345678 Helpline 01712345678";
        let record = build(Classification::ElectricityToken, text);
        assert_eq!(record.phone_number(), None);
        assert_eq!(record.provider(), None);
    }

    #[test]
    fn test_raw_text_kept_verbatim() {
        let text = "  REB Token: 12  \n";
        let record = build(Classification::ElectricityToken, text);
        assert_eq!(record.raw_text, text);
    }
}
