//! Response normalizer — converts best-effort structured text from an
//! unreliable generator into an always-valid screening record.
//!
//! Pipeline: strip fences → strict JSON parse → greedy `{...}` recovery
//! parse → synthetic fallback. The caller never sees a failure.

use serde_json::{json, Map, Value};

/// The five fields every screening result must carry.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "score",
    "summary",
    "strengths",
    "concerns",
    "match_percentage",
];

/// How many characters of the cleaned completion the fallback record keeps
/// for diagnostics.
const RAW_RESPONSE_LIMIT: usize = 500;

/// Which path produced the record. Mostly for logging and tests; the record
/// itself is complete either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Strict or recovery parse succeeded with all five fields present.
    Parsed,
    /// Parse succeeded but some required fields had to be defaulted.
    ParsedWithDefaults(Vec<&'static str>),
    /// No object could be recovered; the synthetic fallback was returned.
    Fallback,
}

/// A normalized screening record plus the path that produced it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub result: Map<String, Value>,
    pub outcome: Outcome,
}

/// Normalizes a raw completion into a complete screening record.
///
/// Present fields pass through exactly as parsed, wrong type included;
/// only missing required fields are substituted.
pub fn normalize(raw: &str) -> Normalized {
    let cleaned = strip_fences(raw);

    let Some(mut result) = parse_object(cleaned) else {
        return Normalized {
            result: fallback_record(cleaned),
            outcome: Outcome::Fallback,
        };
    };

    let mut missing = Vec::new();
    for field in REQUIRED_FIELDS {
        if !result.contains_key(field) {
            result.insert(field.to_string(), default_for(field));
            missing.push(field);
        }
    }

    let outcome = if missing.is_empty() {
        Outcome::Parsed
    } else {
        Outcome::ParsedWithDefaults(missing)
    };
    Normalized { result, outcome }
}

/// Strips a leading ```json or ``` fence and a trailing ``` fence, each
/// independently, re-trimming whitespace afterwards.
fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Strict parse first; on failure, retry on the greedy first-`{`-to-last-`}`
/// span so an object embedded in surrounding prose still parses.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn default_for(field: &str) -> Value {
    match field {
        "summary" => json!("Analysis completed"),
        "strengths" | "concerns" => json!([]),
        // score / match_percentage
        _ => json!(0),
    }
}

/// Synthetic record returned when no object can be recovered: low-confidence
/// but fully typed, with a truncated copy of the cleaned text for diagnosis.
fn fallback_record(cleaned: &str) -> Map<String, Value> {
    let raw_response: String = cleaned.chars().take(RAW_RESPONSE_LIMIT).collect();
    let mut record = Map::new();
    record.insert("score".to_string(), json!(5));
    record.insert(
        "summary".to_string(),
        json!("Resume processed successfully but response parsing failed."),
    );
    record.insert("strengths".to_string(), json!(["Resume uploaded successfully"]));
    record.insert("concerns".to_string(), json!(["Analysis format error - try again"]));
    record.insert("match_percentage".to_string(), json!(50));
    record.insert("raw_response".to_string(), Value::String(raw_response));
    record.insert(
        "tip".to_string(),
        json!("The AI response wasn't in JSON format. Try again."),
    );
    record
}
