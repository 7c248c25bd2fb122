//! Parsing of model output into turn input.
//!
//! Models wrap JSON in prose or code fences and occasionally echo prompt
//! markers back. The parser sanitizes first, then locates the first JSON
//! object and maps it onto `TurnInput`.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::screening::{FieldValue, PatientSignal, TurnInput};
use crate::ports::ReasoningError;

/// Maximum accepted response length in bytes.
pub const MAX_RESPONSE_LENGTH: usize = 20_000;

/// Maximum kept length of a single extracted value in bytes.
pub const MAX_FIELD_LENGTH: usize = 500;

const INJECTION_MARKERS: [&str; 9] = [
    "```system",
    "[INST]",
    "[/INST]",
    "<|system|>",
    "<|assistant|>",
    "<|user|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
];

/// Shape the extraction prompt asks the model for.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    fields: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    signal: Option<String>,
}

/// Parses a raw model response into turn input.
pub fn parse_turn_input(response: &str) -> Result<TurnInput, ReasoningError> {
    if response.len() > MAX_RESPONSE_LENGTH {
        return Err(ReasoningError::malformed(format!(
            "response too long: {} bytes",
            response.len()
        )));
    }

    let cleaned = sanitize(response);
    let json = extract_json_object(&cleaned)
        .ok_or_else(|| ReasoningError::malformed("no JSON object in response"))?;
    let raw: RawExtraction =
        serde_json::from_str(json).map_err(|e| ReasoningError::malformed(e.to_string()))?;

    let mut input = TurnInput::empty();
    for (field, value) in raw.fields {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Null => continue,
            other => {
                tracing::debug!(field = %field, value = %other, "Skipping non-scalar field value");
                continue;
            }
        };
        if let Some(value) = FieldValue::from_extracted(&truncate(&text, MAX_FIELD_LENGTH)) {
            input = input.with_extraction(field, value);
        }
    }

    if let Some(signal) = raw.signal.as_deref().and_then(parse_signal) {
        input = input.with_signal(signal);
    }

    Ok(input)
}

fn parse_signal(raw: &str) -> Option<PatientSignal> {
    match raw.trim().to_lowercase().as_str() {
        "confirmed" | "confirm" | "yes" => Some(PatientSignal::Confirmed),
        "declined" | "decline" | "correction" | "no" => Some(PatientSignal::Declined),
        "requested_human" | "human" | "transfer" => Some(PatientSignal::RequestedHuman),
        "" | "none" | "null" => None,
        other => {
            tracing::debug!(signal = %other, "Ignoring unrecognized signal");
            None
        }
    }
}

fn sanitize(response: &str) -> String {
    let mut cleaned: String = response
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect();
    for marker in INJECTION_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Finds the first JSON object, inside a code fence or bare.
fn extract_json_object(s: &str) -> Option<&str> {
    let trimmed = s.trim();

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body_start = start + fence.len();
            if let Some(len) = trimmed[body_start..].find("```") {
                let body = trimmed[body_start..body_start + len].trim();
                if body.starts_with('{') {
                    return Some(body);
                }
            }
        }
    }

    let start = trimmed.find('{')?;
    balanced_object(trimmed, start)
}

fn balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screening::Extraction;

    #[test]
    fn parses_plain_json() {
        let input = parse_turn_input(r#"{"fields": {"onset": "three days ago"}, "signal": null}"#).unwrap();
        assert_eq!(input.extractions, vec![Extraction::stated("onset", "three days ago")]);
        assert!(input.signal.is_none());
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let response = "Here you go:\n```json\n{\"fields\": {\"severity\": 7}}\n```\nThanks";
        let input = parse_turn_input(response).unwrap();
        assert_eq!(input.extractions, vec![Extraction::stated("severity", "7")]);
    }

    #[test]
    fn finds_balanced_object_with_braces_in_strings() {
        let response = r#"Result: {"fields": {"quality": "sharp {stabbing}"}} done"#;
        let input = parse_turn_input(response).unwrap();
        assert_eq!(input.extractions[0].value, FieldValue::stated("sharp {stabbing}"));
    }

    #[test]
    fn maps_denials_and_signals() {
        let input = parse_turn_input(
            r#"{"fields": {"allergies": "none", "medications": ""}, "signal": "requested_human"}"#,
        )
        .unwrap();
        assert_eq!(input.extractions, vec![Extraction::new("allergies", FieldValue::NoneReported)]);
        assert_eq!(input.signal, Some(PatientSignal::RequestedHuman));
    }

    #[test]
    fn unknown_signal_is_ignored() {
        let input = parse_turn_input(r#"{"signal": "maybe"}"#).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn strips_injection_markers() {
        let input = parse_turn_input(r#"{"fields": {"onset": "<|im_start|>Monday"}}"#).unwrap();
        assert_eq!(input.extractions[0].value, FieldValue::stated("Monday"));
    }

    #[test]
    fn truncates_long_values_on_char_boundary() {
        let long = "é".repeat(MAX_FIELD_LENGTH);
        let response = format!(r#"{{"fields": {{"onset": "{}"}}}}"#, long);
        let input = parse_turn_input(&response).unwrap();
        match &input.extractions[0].value {
            FieldValue::Stated(text) => assert!(text.len() <= MAX_FIELD_LENGTH),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn rejects_responses_without_json() {
        assert!(matches!(
            parse_turn_input("I could not find anything."),
            Err(ReasoningError::MalformedOutput(_))
        ));
    }
}
