//! Shape-tolerant snapshot parsing.
//!
//! Producers disagree on layout. The flat shape carries the snapshot fields at
//! the top level:
//!
//! ```json
//! { "samples": 10, "mean": 0.5, "variance": 0.1, "jitter": 0.01, "decision": "Keep" }
//! ```
//!
//! The envelope shape (gateway-style status documents) nests them under
//! `krypton` next to unrelated status fields:
//!
//! ```json
//! { "status": "ok", "krypton": { "samples": 5, "decision": "Throttle" } }
//! ```
//!
//! All of that is resolved here, so transports only ever deal in raw text or
//! JSON values and never branch on layout.

use serde_json::{Map, Value};

use super::{Decision, HealthSnapshot};

const ENVELOPE_KEY: &str = "krypton";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("producer returned no output")]
    EmptyOutput,

    #[error("producer output is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("missing 'decision' field")]
    MissingDecision,

    #[error("unrecognized decision '{0}' (expected Keep, Throttle or Kill)")]
    UnknownDecision(String),

    #[error("invalid '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Accepted response layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Snapshot fields at the top level only.
    Flat,
    /// Snapshot under `krypton` when that key holds an object, else flat.
    Envelope,
}

impl ResponseShape {
    /// Pick the object that holds the snapshot fields.
    fn locate<'a>(&self, root: &'a Map<String, Value>) -> &'a Map<String, Value> {
        match self {
            ResponseShape::Flat => root,
            ResponseShape::Envelope => match root.get(ENVELOPE_KEY) {
                Some(Value::Object(inner)) => inner,
                _ => root,
            },
        }
    }
}

/// Normalize a decoded JSON document into a snapshot.
pub fn normalize(value: &Value, shape: ResponseShape) -> Result<HealthSnapshot, ParseError> {
    let root = value
        .as_object()
        .ok_or_else(|| ParseError::NotAnObject(json_kind(value)))?;
    snapshot_from_object(shape.locate(root))
}

/// Parse raw process output: the last non-blank line is the flat snapshot.
///
/// Earlier lines are treated as producer diagnostics and ignored.
///
/// The whole output must be valid UTF-8; nothing is substituted for bad bytes.
pub fn from_process_output(stdout: impl AsRef<[u8]>) -> Result<HealthSnapshot, ParseError> {
    let text = std::str::from_utf8(stdout.as_ref())?;
    let line = last_non_empty_line(text).ok_or(ParseError::EmptyOutput)?;
    let value: Value = serde_json::from_str(line)?;
    normalize(&value, ResponseShape::Flat)
}

fn last_non_empty_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

fn snapshot_from_object(obj: &Map<String, Value>) -> Result<HealthSnapshot, ParseError> {
    let decision = match obj.get("decision") {
        None => return Err(ParseError::MissingDecision),
        Some(Value::String(s)) => s.parse::<Decision>()?,
        Some(other) => {
            return Err(ParseError::InvalidField {
                field: "decision",
                reason: format!("expected a string, found {}", json_kind(other)),
            })
        }
    };

    let samples = match obj.get("samples") {
        None => 0,
        Some(v) => count_field("samples", v)?,
    };
    let mean = float_field(obj, "mean")?;
    let variance = non_negative(float_field(obj, "variance")?, "variance")?;
    let jitter = non_negative(float_field(obj, "jitter")?, "jitter")?;

    Ok(HealthSnapshot {
        samples,
        mean,
        variance,
        jitter,
        decision,
    })
}

/// Numbers may also arrive as numeric strings from looser producers.
fn as_number(field: &'static str, value: &Value) -> Result<f64, ParseError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ParseError::InvalidField {
            field,
            reason: format!("expected a number, found {}", value),
        }),
    }
}

fn float_field(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ParseError> {
    match obj.get(field) {
        None => Ok(0.0),
        Some(v) => as_number(field, v),
    }
}

fn count_field(field: &'static str, value: &Value) -> Result<u64, ParseError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let n = as_number(field, value)?;
    if n < 0.0 {
        return Err(ParseError::InvalidField {
            field,
            reason: format!("must be non-negative, got {}", n),
        });
    }
    // Fractional counts truncate toward zero.
    Ok(n.trunc() as u64)
}

fn non_negative(n: f64, field: &'static str) -> Result<f64, ParseError> {
    if n < 0.0 {
        Err(ParseError::InvalidField {
            field,
            reason: format!("must be non-negative, got {}", n),
        })
    } else {
        Ok(n)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_shape() {
        let v = json!({"samples": 10, "mean": 0.5, "variance": 0.1, "jitter": 0.01, "decision": "Keep"});
        let s = normalize(&v, ResponseShape::Flat).unwrap();
        assert_eq!(s.samples, 10);
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.variance, 0.1);
        assert_eq!(s.jitter, 0.01);
        assert_eq!(s.decision, Decision::Keep);
    }

    #[test]
    fn test_envelope_prefers_nested_object() {
        let v = json!({
            "krypton": {"samples": 5, "mean": 0.1, "variance": 0.0, "jitter": 0.0, "decision": "Throttle"},
            "status": "ok"
        });
        let s = normalize(&v, ResponseShape::Envelope).unwrap();
        assert_eq!(s.samples, 5);
        assert_eq!(s.mean, 0.1);
        assert_eq!(s.decision, Decision::Throttle);
    }

    #[test]
    fn test_envelope_falls_back_to_top_level() {
        let v = json!({"samples": 3, "decision": "Kill", "krypton": "not-an-object"});
        let s = normalize(&v, ResponseShape::Envelope).unwrap();
        assert_eq!(s.samples, 3);
        assert_eq!(s.decision, Decision::Kill);
    }

    #[test]
    fn test_flat_shape_ignores_envelope_key() {
        let v = json!({"krypton": {"decision": "Kill"}});
        assert!(matches!(
            normalize(&v, ResponseShape::Flat),
            Err(ParseError::MissingDecision)
        ));
    }

    #[test]
    fn test_nested_unknown_decision_is_rejected() {
        let v = json!({"krypton": {"samples": 1, "decision": "Unknown"}, "decision": "Keep"});
        assert!(matches!(
            normalize(&v, ResponseShape::Envelope),
            Err(ParseError::UnknownDecision(d)) if d == "Unknown"
        ));
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let s = normalize(&json!({"decision": "Keep"}), ResponseShape::Flat).unwrap();
        assert_eq!(s.samples, 0);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.jitter, 0.0);
    }

    #[test]
    fn test_numeric_strings_and_float_counts() {
        let v = json!({"samples": 7.9, "mean": "0.25", "decision": "Keep"});
        let s = normalize(&v, ResponseShape::Flat).unwrap();
        assert_eq!(s.samples, 7);
        assert_eq!(s.mean, 0.25);
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let negative = json!({"variance": -0.1, "decision": "Keep"});
        assert!(matches!(
            normalize(&negative, ResponseShape::Flat),
            Err(ParseError::InvalidField { field: "variance", .. })
        ));

        let bad_samples = json!({"samples": -4, "decision": "Keep"});
        assert!(matches!(
            normalize(&bad_samples, ResponseShape::Flat),
            Err(ParseError::InvalidField { field: "samples", .. })
        ));

        let bad_mean = json!({"mean": [1], "decision": "Keep"});
        assert!(matches!(
            normalize(&bad_mean, ResponseShape::Flat),
            Err(ParseError::InvalidField { field: "mean", .. })
        ));

        let bad_decision = json!({"decision": 2});
        assert!(matches!(
            normalize(&bad_decision, ResponseShape::Flat),
            Err(ParseError::InvalidField { field: "decision", .. })
        ));
    }

    #[test]
    fn test_non_object_documents() {
        assert!(matches!(
            normalize(&json!([1, 2]), ResponseShape::Envelope),
            Err(ParseError::NotAnObject("an array"))
        ));
        assert!(matches!(
            normalize(&json!("Keep"), ResponseShape::Flat),
            Err(ParseError::NotAnObject("a string"))
        ));
    }

    #[test]
    fn test_process_output_takes_last_non_blank_line() {
        let out = "warming up sensors\n{\"samples\":1,\"decision\":\"Keep\"}\n{\"samples\":2,\"decision\":\"Kill\"}\n\n  \n";
        let s = from_process_output(out).unwrap();
        assert_eq!(s.samples, 2);
        assert_eq!(s.decision, Decision::Kill);
    }

    #[test]
    fn test_process_output_failures() {
        assert!(matches!(from_process_output(""), Err(ParseError::EmptyOutput)));
        assert!(matches!(from_process_output(" \n\t\n"), Err(ParseError::EmptyOutput)));
        assert!(matches!(
            from_process_output("{\"decision\":\"Keep\"}\nnot json"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_process_output_rejects_invalid_utf8() {
        let out: &[u8] = b"{\"samples\":1,\"decision\":\"Keep\",\"note\":\"\xff\"}\n";
        assert!(matches!(from_process_output(out), Err(ParseError::Utf8(_))));

        let out: &[u8] = b"\xfe diagnostics\n{\"decision\":\"Kill\"}\n";
        assert!(matches!(from_process_output(out), Err(ParseError::Utf8(_))));
    }

    #[test]
    fn test_process_output_accepts_bytes() {
        let out: Vec<u8> = b"{\"samples\":7,\"decision\":\"Throttle\"}\n".to_vec();
        let s = from_process_output(out).unwrap();
        assert_eq!(s.samples, 7);
        assert_eq!(s.decision, Decision::Throttle);
    }
}
