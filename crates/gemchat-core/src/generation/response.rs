//! Response-shape decoding.
//!
//! Bindings return either a direct text value or a loosely structured JSON
//! value. [`ResponseShape`] classifies a response into a closed set of
//! variants and extracts text from it; anything unrecognised is stringified.

use serde_json::{Map, Value};

/// A response, or one unit of a response stream, as produced by a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    /// The binding already extracted the text.
    Text(String),
    /// Raw structured payload whose text still has to be located.
    Structured(Value),
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        GenerationResponse::Text(text.into())
    }
}

/// Where a response came from; candidate lists are only inspected for
/// whole (non-streamed) responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    StreamUnit,
    WholeResponse,
}

const TEXT_KEYS: [&str; 2] = ["text", "output_text"];
const CANDIDATE_KEYS: [&str; 2] = ["candidates", "outputs"];

/// The known shapes of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape<'a> {
    DirectText(&'a str),
    TextKey(&'a str),
    Candidates(&'a [Value]),
    Opaque(&'a Value),
}

impl<'a> ResponseShape<'a> {
    pub fn of(response: &'a GenerationResponse, mode: DecodeMode) -> Self {
        match response {
            GenerationResponse::Text(text) => ResponseShape::DirectText(text),
            GenerationResponse::Structured(value) => Self::of_value(value, mode),
        }
    }

    pub fn of_value(value: &'a Value, mode: DecodeMode) -> Self {
        let map = match value {
            Value::String(text) => return ResponseShape::DirectText(text),
            Value::Object(map) => map,
            other => return ResponseShape::Opaque(other),
        };

        if let Some(text) = first_text_key(map, true) {
            return ResponseShape::TextKey(text);
        }

        if mode == DecodeMode::WholeResponse {
            if let Some(candidates) = candidate_list(map) {
                return ResponseShape::Candidates(candidates);
            }
        }

        match first_text_key(map, false) {
            Some(empty) => ResponseShape::TextKey(empty),
            None => ResponseShape::Opaque(value),
        }
    }

    /// Extracts text, or `None` when this shape yields nothing usable.
    pub fn text(&self) -> Option<String> {
        match self {
            ResponseShape::DirectText(text) | ResponseShape::TextKey(text) => {
                non_empty(text)
            }
            ResponseShape::Candidates(candidates) => {
                candidates.first().and_then(candidate_text)
            }
            ResponseShape::Opaque(value) => stringify(value),
        }
    }
}

/// Text fragment of one stream unit, if any.
pub fn normalize_unit(unit: &GenerationResponse) -> Option<String> {
    ResponseShape::of(unit, DecodeMode::StreamUnit).text()
}

/// Text of a whole response; falls back to stringifying the response.
pub fn normalize_response(response: &GenerationResponse) -> String {
    ResponseShape::of(response, DecodeMode::WholeResponse)
        .text()
        .unwrap_or_else(|| match response {
            GenerationResponse::Text(text) => text.clone(),
            GenerationResponse::Structured(value) => value.to_string(),
        })
}

fn first_text_key(map: &Map<String, Value>, require_non_empty: bool) -> Option<&str> {
    TEXT_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(text)) if !require_non_empty || !text.is_empty() => {
            Some(text.as_str())
        }
        _ => None,
    })
}

fn candidate_list(map: &Map<String, Value>) -> Option<&[Value]> {
    CANDIDATE_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items.as_slice()),
        _ => None,
    })
}

/// Decodes the first candidate.
///
/// Understands a `content` string, a nested `content` object and a `parts`
/// list in addition to the regular text keys.
fn candidate_text(candidate: &Value) -> Option<String> {
    let Value::Object(map) = candidate else {
        return stringify(candidate);
    };

    match map.get("content") {
        Some(Value::String(text)) if !text.is_empty() => return Some(text.clone()),
        Some(nested @ Value::Object(_)) => {
            if let Some(text) = candidate_text(nested) {
                return Some(text);
            }
        }
        _ => {}
    }

    if let Some(Value::Array(parts)) = map.get("parts") {
        let joined: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        if !joined.is_empty() {
            return Some(joined);
        }
    }

    match ResponseShape::of_value(candidate, DecodeMode::WholeResponse) {
        ResponseShape::Opaque(_) => None,
        shape => shape.text(),
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => non_empty(text),
        other => Some(other.to_string()),
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(value: Value) -> GenerationResponse {
        GenerationResponse::Structured(value)
    }

    #[test]
    fn test_direct_text_unit() {
        assert_eq!(normalize_unit(&GenerationResponse::text("he")), Some("he".into()));
        assert_eq!(normalize_unit(&GenerationResponse::text("")), None);
    }

    #[test]
    fn test_text_key_then_output_text() {
        assert_eq!(
            normalize_unit(&structured(json!({"text": "a"}))),
            Some("a".into())
        );
        assert_eq!(
            normalize_unit(&structured(json!({"text": "", "output_text": "b"}))),
            Some("b".into())
        );
    }

    #[test]
    fn test_empty_text_key_yields_nothing() {
        assert_eq!(normalize_unit(&structured(json!({"text": ""}))), None);
    }

    #[test]
    fn test_opaque_unit_is_stringified() {
        assert_eq!(normalize_unit(&structured(json!(42))), Some("42".into()));
        assert_eq!(
            normalize_unit(&structured(json!({"delta": 1}))),
            Some(r#"{"delta":1}"#.into())
        );
    }

    #[test]
    fn test_stream_unit_ignores_candidates() {
        let unit = structured(json!({"candidates": [{"text": "x"}]}));
        assert!(matches!(
            ResponseShape::of(&unit, DecodeMode::StreamUnit),
            ResponseShape::Opaque(_)
        ));
    }

    #[test]
    fn test_whole_response_first_candidate() {
        let response = structured(json!({
            "candidates": [{"content": "first"}, {"content": "second"}]
        }));
        assert_eq!(normalize_response(&response), "first");
    }

    #[test]
    fn test_whole_response_outputs_list() {
        let response = structured(json!({"outputs": [{"output_text": "out"}]}));
        assert_eq!(normalize_response(&response), "out");
    }

    #[test]
    fn test_whole_response_gemini_rest_shape() {
        let response = structured(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "hi "}, {"text": "there"}]}
            }]
        }));
        assert_eq!(normalize_response(&response), "hi there");
    }

    #[test]
    fn test_non_object_candidate_is_stringified() {
        let response = structured(json!({"candidates": ["plain"]}));
        assert_eq!(normalize_response(&response), "plain");
    }

    #[test]
    fn test_unusable_response_is_stringified_whole() {
        let response = structured(json!({"candidates": [{"finishReason": "STOP"}]}));
        assert_eq!(
            normalize_response(&response),
            r#"{"candidates":[{"finishReason":"STOP"}]}"#
        );
    }
}
