//! Deterministic per-field extraction from a fixed regex table.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    CandidateSet, FieldCandidate, FieldSource, TargetField, DETERMINISTIC_CONFIDENCE,
};

/// Case-insensitive pattern for a field. The `value` group holds the answer.
/// Free-text clause values stop at the end of their line.
fn pattern_for(field: TargetField) -> &'static str {
    match field {
        TargetField::LocationCode => r"(?i)Mahal[\s_-]?Kodu[:\s]+(?P<value>\w+)",
        TargetField::Area => r"(?i)(?P<value>\d+(?:[,.]\d+)?)\s*m2",
        TargetField::MinimumRent => r"(?i)Asgari\s+Kira[:\s]+(?P<value>[\d.,]+)",
        TargetField::RevenueShareRatio => r"(?i)Ciro\s+Kira\s+Orani[:\s]+(?P<value>[\d.,]+%?)",
        TargetField::DecorationCoordination => {
            r"(?i)Dekorasyon\s+Koordinasyon[: \t]+(?P<value>[\w \t]+)"
        }
        TargetField::LiabilityInsurance => {
            r"(?i)Mali\s+Sorumluluk\s+Sigortasi[: \t]+(?P<value>[\w \t]+)"
        }
        TargetField::LatePaymentInterest => r"(?i)Gecikme\s+Faizi[:\s]+(?P<value>[\d.,]+%?)",
        TargetField::ExtensionIncrease => {
            r"(?i)Bir\s+Yil\s+Uzama\s+Artis[:\s]+(?P<value>[\d.,]+%?)"
        }
        TargetField::ExtensionRevenueShare => {
            r"(?i)Bir\s+Yil\s+Uzama\s+Ciro\s+Kira[:\s]+(?P<value>[\d.,]+%?)"
        }
        TargetField::PenaltyAmount => r"(?i)Ceza\s+Bedeli[:\s]+(?P<value>[\d.,]+)",
    }
}

static FIELD_PATTERNS: LazyLock<Vec<(TargetField, Regex)>> = LazyLock::new(|| {
    TargetField::ALL
        .iter()
        .map(|&field| (field, Regex::new(pattern_for(field)).unwrap()))
        .collect()
});

/// Regex-based candidate source. Stateless; always yields one candidate per
/// target field.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> CandidateSet {
        FIELD_PATTERNS
            .iter()
            .map(|(field, re)| {
                let value = re
                    .captures(text)
                    .and_then(|caps| caps.name("value"))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|v| !v.is_empty());
                let confidence = if value.is_some() {
                    DETERMINISTIC_CONFIDENCE
                } else {
                    0.0
                };
                let candidate = FieldCandidate {
                    name: *field,
                    value,
                    confidence,
                    source_quote: None,
                    source: FieldSource::Pattern,
                };
                (*field, candidate)
            })
            .collect()
    }
}
