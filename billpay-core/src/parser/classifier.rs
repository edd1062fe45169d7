//! Message classifier - decides which family and provider an SMS belongs to
//!
//! Classification looks only for fixed marker words, in Latin or Bengali
//! script, case-insensitively. Electricity markers are checked before
//! mobile-money markers, so a message that names both an authority and a
//! provider is always an electricity token.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::compile;
use crate::domain::{Family, Provider};

/// Outcome of classifying a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", content = "provider", rename_all = "snake_case")]
pub enum Classification {
    ElectricityToken,
    MobilePayment(Provider),
}

impl Classification {
    pub fn family(&self) -> Family {
        match self {
            Classification::ElectricityToken => Family::ElectricityToken,
            Classification::MobilePayment(_) => Family::MobilePayment,
        }
    }

    /// Provider, only set for mobile payments
    pub fn provider(&self) -> Option<Provider> {
        match self {
            Classification::ElectricityToken => None,
            Classification::MobilePayment(provider) => Some(*provider),
        }
    }
}

struct Markers {
    /// Issuing authority: BREB / REB abbreviations, "Prepaid Token", Palli Bidyut
    authority: Regex,
    /// Meter-number label or the word "Token"
    meter: Regex,
    bkash: Regex,
    nagad: Regex,
    rocket: Regex,
}

impl Markers {
    fn compile() -> Self {
        Self {
            // REB must stand alone: "Rebate" or "REBATE" is not an authority.
            // Punctuation counts as a word edge, so "BREB-Token" still matches.
            authority: compile(r"(?i)\bB?REB\b|\bprepaid\s+token|পল্লী\s*বিদ্যুৎ"),
            meter: compile(r"(?i)\bmeter\s*no|\btoken"),
            bkash: compile(r"(?i)\bbkash\b|বিকাশ"),
            nagad: compile(r"(?i)\bnagad\b|নগদ"),
            rocket: compile(r"(?i)\brocket\b|রকেট"),
        }
    }

    fn provider(&self, provider: Provider) -> Option<&Regex> {
        match provider {
            Provider::Bkash => Some(&self.bkash),
            Provider::Nagad => Some(&self.nagad),
            Provider::Rocket => Some(&self.rocket),
            Provider::Other => None,
        }
    }
}

static MARKERS: LazyLock<Markers> = LazyLock::new(Markers::compile);

/// Classify a message, or `None` when no family matches
pub fn classify(text: &str) -> Option<Classification> {
    if is_electricity_token(text) {
        return Some(Classification::ElectricityToken);
    }
    detect_provider(text).map(Classification::MobilePayment)
}

/// True when the text carries an authority marker together with a meter
/// or token marker
pub fn is_electricity_token(text: &str) -> bool {
    MARKERS.authority.is_match(text) && MARKERS.meter.is_match(text)
}

/// True when the text classifies as a mobile-money payment
///
/// Electricity precedence applies: a message that also qualifies as an
/// electricity token is not a mobile payment.
pub fn is_mobile_payment(text: &str) -> bool {
    matches!(classify(text), Some(Classification::MobilePayment(_)))
}

/// True when the provider's name appears anywhere in the text
///
/// `Provider::Other` has no marker and never matches.
pub fn mentions_provider(text: &str, provider: Provider) -> bool {
    MARKERS
        .provider(provider)
        .is_some_and(|marker| marker.is_match(text))
}

/// The single named provider mentioned in the text
///
/// Returns `None` when no provider or more than one provider is named.
pub fn detect_provider(text: &str) -> Option<Provider> {
    let mut named = Provider::NAMED
        .iter()
        .copied()
        .filter(|provider| mentions_provider(text, *provider));

    match (named.next(), named.next()) {
        (Some(provider), None) => Some(provider),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_electricity_requires_authority_and_meter_marker() {
        assert!(is_electricity_token("BREB Prepaid Token. Meter No: 12345678"));
        assert!(is_electricity_token("REB: Token: 1234-5678 for your meter"));
        assert!(is_electricity_token("Your prepaid token is ready"));
        // Authority without a meter/token marker
        assert!(!is_electricity_token("BREB office closed on Friday"));
        // Meter marker without an authority
        assert!(!is_electricity_token("Meter No: 12345678 Token: 1111"));
    }

    #[test]
    fn test_electricity_markers_are_case_insensitive() {
        assert!(is_electricity_token("breb prepaid TOKEN meter no 1"));
        assert_eq!(
            classify("PREPAID TOKEN: 1234"),
            Some(Classification::ElectricityToken)
        );
    }

    #[test]
    fn test_rebate_is_not_an_authority_marker() {
        // "REB" only counts as a whole word
        assert!(!is_electricity_token("Rebate: 5.00 Tk applied. Token bonus"));
    }

    #[test]
    fn test_authority_marker_next_to_punctuation() {
        assert_eq!(
            classify("BREB-Token: 1234-5678 Meter No: 12345678"),
            Some(Classification::ElectricityToken)
        );
        assert!(is_electricity_token("(REB)/Token 1111-2222"));
        assert!(is_electricity_token("Palli Bidyut REB:Meter No 55"));
        assert!(!is_electricity_token("REBATE offer. Token bonus"));
    }

    #[test]
    fn test_bengali_markers() {
        assert!(is_electricity_token("পল্লী বিদ্যুৎ Meter No: 998877"));
        assert_eq!(
            classify("আপনার বিকাশ একাউন্টে Tk 500.00 জমা হয়েছে"),
            Some(Classification::MobilePayment(Provider::Bkash))
        );
        assert_eq!(
            classify("নগদ: Tk 100 পাঠানো হয়েছে"),
            Some(Classification::MobilePayment(Provider::Nagad))
        );
        assert_eq!(
            classify("রকেট থেকে Tk 20"),
            Some(Classification::MobilePayment(Provider::Rocket))
        );
    }

    #[test]
    fn test_detects_each_provider() {
        assert_eq!(detect_provider("bKash: Cash In Tk 500"), Some(Provider::Bkash));
        assert_eq!(detect_provider("NAGAD Money received"), Some(Provider::Nagad));
        assert_eq!(detect_provider("Rocket: Tk100 sent"), Some(Provider::Rocket));
        assert_eq!(detect_provider("Your parcel has shipped"), None);
    }

    #[test]
    fn test_several_providers_is_ambiguous() {
        let text = "Send money from bKash to Nagad Tk 500";
        assert!(mentions_provider(text, Provider::Bkash));
        assert!(mentions_provider(text, Provider::Nagad));
        assert_eq!(detect_provider(text), None);
        assert_eq!(classify(text), None);
    }

    #[test]
    fn test_electricity_wins_over_provider_marker() {
        // Token bought through bKash: both marker sets match
        let text = "bKash payment to BREB successful. Meter No: 12345678 Token: 1111-2222";
        assert!(mentions_provider(text, Provider::Bkash));
        assert_eq!(classify(text), Some(Classification::ElectricityToken));
        assert!(!is_mobile_payment(text));
    }

    #[test]
    fn test_other_provider_never_matches() {
        assert!(!mentions_provider("Other bank transfer", Provider::Other));
    }

    #[test]
    fn test_unrelated_text_is_unclassified() {
        assert_eq!(classify("Hello, your package has shipped."), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_classification_accessors() {
        let c = Classification::MobilePayment(Provider::Rocket);
        assert_eq!(c.family(), Family::MobilePayment);
        assert_eq!(c.provider(), Some(Provider::Rocket));
        assert_eq!(Classification::ElectricityToken.provider(), None);
    }
}
