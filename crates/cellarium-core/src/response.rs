// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsed response bodies and structured HTTP failures.
//!
//! The backend is not consistent about what it sends back: list endpoints may
//! return a bare array or a paginated envelope, error bodies may be JSON with a
//! `detail` or `error` field or plain text, and some actions answer 204.
//! [`ResponseBody`] keeps every one of those shapes without failing, and
//! [`HttpFailure`] derives a stable human-readable message from them.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CellarError;

/// A response body after lenient parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The server answered 204; the body was never read as JSON.
    NoContent,
    /// The server answered with a zero-length body.
    Empty,
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not valid JSON and is kept verbatim.
    Text(String),
}

impl ResponseBody {
    /// Parses a raw body, degrading to [`ResponseBody::Text`] for malformed JSON.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text.to_string()),
        }
    }

    /// True for 204, an empty body, and JSON `null` alike.
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            ResponseBody::NoContent | ResponseBody::Empty | ResponseBody::Json(Value::Null)
        )
    }

    /// Returns the JSON value, if the body parsed as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Normalizes a list payload: a bare array, or an object with a `results`
    /// array. Anything else is an empty list.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            ResponseBody::Json(Value::Array(items)) => items,
            ResponseBody::Json(Value::Object(mut map)) => match map.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Decodes a JSON body into `T`. `what` names the entity for error messages.
    pub fn decode<T: DeserializeOwned>(self, what: &str) -> Result<T, CellarError> {
        match self {
            ResponseBody::Json(value) => {
                serde_json::from_value(value).map_err(|e| CellarError::Decode {
                    what: what.to_string(),
                    message: e.to_string(),
                })
            }
            other => Err(CellarError::Decode {
                what: what.to_string(),
                message: format!("expected a JSON body, got {}", other.kind()),
            }),
        }
    }

    /// Decodes a list payload (bare or enveloped) into a vector of `T`.
    pub fn decode_list<T: DeserializeOwned>(self, what: &str) -> Result<Vec<T>, CellarError> {
        self.into_list()
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| CellarError::Decode {
                    what: what.to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn kind(&self) -> &'static str {
        match self {
            ResponseBody::NoContent => "204 no content",
            ResponseBody::Empty => "an empty body",
            ResponseBody::Json(_) => "JSON",
            ResponseBody::Text(_) => "plain text",
        }
    }
}

/// A non-2xx response, normalized for display and programmatic inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    /// Numeric HTTP status.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// The parsed body, kept for callers that need field-level errors.
    pub body: ResponseBody,
}

impl HttpFailure {
    /// Builds a failure from a status, the parsed body, and the raw body text.
    ///
    /// Message precedence: a `detail` or `error` field of a JSON object, a
    /// JSON string body, the raw text, then `request failed: <status>`.
    pub fn new(status: u16, body: ResponseBody, raw_text: &str) -> Self {
        let message = message_from_body(&body)
            .or_else(|| (!raw_text.is_empty()).then(|| raw_text.to_string()))
            .unwrap_or_else(|| format!("request failed: {status}"));
        Self {
            status,
            message,
            body,
        }
    }

    /// 4xx responses are validation failures owned by the backend.
    pub fn is_validation(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// True for 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn message_from_body(body: &ResponseBody) -> Option<String> {
    match body {
        ResponseBody::Json(Value::Object(map)) => ["detail", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(value_to_message),
        ResponseBody::Json(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        ResponseBody::Text(text) => Some(text.clone()),
        _ => None,
    }
}

fn value_to_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_json_degrades_to_text() {
        let body = ResponseBody::parse("<html>oops</html>");
        assert_eq!(body, ResponseBody::Text("<html>oops</html>".into()));
    }

    #[test]
    fn empty_and_null_bodies_count_as_no_body() {
        assert!(ResponseBody::parse("").is_empty());
        assert!(ResponseBody::parse("null").is_empty());
        assert!(ResponseBody::NoContent.is_empty());
        assert!(!ResponseBody::parse("{}").is_empty());
        assert_ne!(ResponseBody::NoContent, ResponseBody::Json(Value::Null));
    }

    #[test]
    fn list_normalization_accepts_bare_and_enveloped() {
        let bare = ResponseBody::Json(json!([{"id": 1}, {"id": 2}]));
        let envelope = ResponseBody::Json(json!({"count": 2, "results": [{"id": 1}, {"id": 2}]}));
        assert_eq!(bare.into_list(), envelope.into_list());
        assert!(ResponseBody::Json(json!({"count": 0})).into_list().is_empty());
        assert!(ResponseBody::Text("nope".into()).into_list().is_empty());
        assert!(ResponseBody::NoContent.into_list().is_empty());
    }

    #[test]
    fn failure_message_prefers_detail_then_error() {
        let body = ResponseBody::Json(json!({"detail": "Token is invalid", "error": "x"}));
        let failure = HttpFailure::new(401, body, r#"{"detail":"Token is invalid"}"#);
        assert_eq!(failure.message, "Token is invalid");

        let body = ResponseBody::Json(json!({"error": "bad wine"}));
        let failure = HttpFailure::new(400, body, r#"{"error":"bad wine"}"#);
        assert_eq!(failure.message, "bad wine");
        assert!(failure.is_validation());
    }

    #[test]
    fn failure_message_falls_back_to_raw_text_then_status() {
        let raw = r#"{"name":["This field is required."]}"#;
        let failure = HttpFailure::new(400, ResponseBody::parse(raw), raw);
        assert_eq!(failure.message, raw);
        assert!(failure.body.as_json().is_some());

        let failure = HttpFailure::new(502, ResponseBody::parse("Bad Gateway"), "Bad Gateway");
        assert_eq!(failure.message, "Bad Gateway");
        assert!(!failure.is_validation());

        let failure = HttpFailure::new(500, ResponseBody::Empty, "");
        assert_eq!(failure.message, "request failed: 500");
    }

    #[test]
    fn decode_rejects_non_json_bodies() {
        let err = ResponseBody::Text("hello".into())
            .decode::<serde_json::Value>("wine")
            .unwrap_err();
        assert!(err.to_string().contains("plain text"), "got: {err}");
    }
}
