use serde_json::{Map, Value};

use super::StructuringError;
use crate::models::{CandidateSet, FieldCandidate, FieldSource, TargetField};

/// Locate and parse the JSON object in a model reply.
///
/// Tries the whole reply, then a ```json fenced block, then the outermost
/// `{...}` span.
pub fn parse_model_reply(reply: &str) -> Result<Map<String, Value>, StructuringError> {
    let trimmed = reply.trim();
    let value = serde_json::from_str::<Value>(trimmed)
        .ok()
        .or_else(|| fenced_json_block(trimmed).and_then(|b| serde_json::from_str(b).ok()))
        .or_else(|| outer_braces(trimmed).and_then(|b| serde_json::from_str(b).ok()))
        .ok_or_else(|| StructuringError::JsonParsing("No JSON object found in reply".into()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(StructuringError::MalformedResponse(format!(
            "Expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Turn a parsed reply into model candidates. Unknown keys, non-object
/// entries and empty values are dropped.
pub fn normalize_candidates(reply: &Map<String, Value>) -> CandidateSet {
    let mut set = CandidateSet::new();
    for (key, entry) in reply {
        let Ok(field) = key.parse::<TargetField>() else {
            continue;
        };
        let Value::Object(entry) = entry else {
            continue;
        };
        let Some(value) = entry.get("value").and_then(value_text) else {
            continue;
        };

        let confidence = entry.get("confidence").map(confidence_of).unwrap_or(0.0);
        let source_quote = entry
            .get("source_quote")
            .or_else(|| entry.get("quote"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(String::from);

        set.insert(
            field,
            FieldCandidate {
                name: field,
                value: Some(value),
                confidence,
                source_quote,
                source: FieldSource::Model,
            },
        );
    }
    set
}

/// Extract the body of the first ```json fence.
fn fenced_json_block(reply: &str) -> Option<&str> {
    let start = reply.find("```json")? + "```json".len();
    let len = reply[start..].find("```")?;
    Some(reply[start..start + len].trim())
}

fn outer_braces(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Strings are trimmed; numbers and booleans rendered as text.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Numeric or numeric-string confidence; anything else is 0. Not clamped.
fn confidence_of(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        Value::String(s) => s.trim().parse::<f32>().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_normalize(reply: &str) -> CandidateSet {
        normalize_candidates(&parse_model_reply(reply).unwrap())
    }

    #[test]
    fn bare_json_object() {
        let set = parse_and_normalize(r#"{"M2": {"value": "120", "confidence": 0.7}}"#);
        let area = &set[&TargetField::Area];
        assert_eq!(area.value.as_deref(), Some("120"));
        assert_eq!(area.confidence, 0.7);
        assert_eq!(area.source, FieldSource::Model);
        assert!(area.source_quote.is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn fenced_json_block_with_prose() {
        let reply = "İşte sonuç:\n```json\n{\"Asgari_Kira\": {\"value\": \"5.000 TL\", \
                     \"confidence\": 0.9, \"source_quote\": \"Asgari Kira 5.000 TL\"}}\n```\nBaşka bir şey?";
        let set = parse_and_normalize(reply);
        let rent = &set[&TargetField::MinimumRent];
        assert_eq!(rent.value.as_deref(), Some("5.000 TL"));
        assert_eq!(rent.source_quote.as_deref(), Some("Asgari Kira 5.000 TL"));
    }

    #[test]
    fn outermost_braces_when_unfenced() {
        let reply = "Sonuç şu şekilde: {\"Ceza_Bedeli\": {\"value\": \"1000\"}} umarım yardımcı olur";
        let set = parse_and_normalize(reply);
        assert_eq!(set[&TargetField::PenaltyAmount].value.as_deref(), Some("1000"));
        assert_eq!(set[&TargetField::PenaltyAmount].confidence, 0.0);
    }

    #[test]
    fn non_object_reply_is_malformed() {
        assert!(matches!(
            parse_model_reply("[1, 2, 3]"),
            Err(StructuringError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_model_reply("\"just a string\""),
            Err(StructuringError::MalformedResponse(_))
        ));
    }

    #[test]
    fn reply_without_json_is_an_error() {
        assert!(matches!(
            parse_model_reply("Bu metinde alan bulunamadı."),
            Err(StructuringError::JsonParsing(_))
        ));
    }

    #[test]
    fn unknown_keys_and_non_object_entries_dropped() {
        let reply = r#"{
            "Kira_Suresi": {"value": "5 yil", "confidence": 0.9},
            "M2": "120",
            "Mahal_Kodu": {"value": "B7", "confidence": 0.8}
        }"#;
        let set = parse_and_normalize(reply);
        assert_eq!(set.len(), 1);
        assert_eq!(set[&TargetField::LocationCode].value.as_deref(), Some("B7"));
    }

    #[test]
    fn empty_and_missing_values_dropped() {
        let reply = r#"{
            "M2": {"value": "   ", "confidence": 0.9},
            "Asgari_Kira": {"confidence": 0.9},
            "Ceza_Bedeli": {"value": null}
        }"#;
        assert!(parse_and_normalize(reply).is_empty());
    }

    #[test]
    fn numeric_and_boolean_values_rendered_as_text() {
        let reply = r#"{
            "M2": {"value": 120.5, "confidence": 0.6},
            "Mali_Sorumluluk_Sigortasi": {"value": true, "confidence": 0.5}
        }"#;
        let set = parse_and_normalize(reply);
        assert_eq!(set[&TargetField::Area].value.as_deref(), Some("120.5"));
        assert_eq!(set[&TargetField::LiabilityInsurance].value.as_deref(), Some("true"));
    }

    #[test]
    fn confidence_parsing_rules() {
        let reply = r#"{
            "M2": {"value": "1", "confidence": "0.65"},
            "Asgari_Kira": {"value": "2", "confidence": "high"},
            "Ceza_Bedeli": {"value": "3", "confidence": 1.4}
        }"#;
        let set = parse_and_normalize(reply);
        assert_eq!(set[&TargetField::Area].confidence, 0.65);
        assert_eq!(set[&TargetField::MinimumRent].confidence, 0.0);
        // Not clamped
        assert_eq!(set[&TargetField::PenaltyAmount].confidence, 1.4);
    }

    #[test]
    fn quote_alias_and_empty_quote() {
        let reply = r#"{
            "M2": {"value": "120", "quote": "120 m2 alan"},
            "Gecikme_Faizi": {"value": "2%", "source_quote": "  "}
        }"#;
        let set = parse_and_normalize(reply);
        assert_eq!(set[&TargetField::Area].source_quote.as_deref(), Some("120 m2 alan"));
        assert!(set[&TargetField::LatePaymentInterest].source_quote.is_none());
    }
}
