// Error classifier — decides from the first chunk whether a stream is an error payload.
//
// Streaming hosts do not always expose the real HTTP status (a rate-limited
// call can arrive with an "unknown" status), so the body is inspected too.

use ai_translator_types::{
    Error, HttpStatus, INVALID_CREDENTIAL_MESSAGE, QUOTA_EXCEEDED_MESSAGE,
};
use serde_json::Value;

use crate::util::http::{error_message, reason_phrase};

/// Longest raw body quoted in a status-derived message.
const MAX_QUOTED_BODY: usize = 200;

const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "ratelimit",
    "resource_exhausted",
    "resource exhausted",
    "too many requests",
    "insufficient balance",
    "billing",
];

const CREDENTIAL_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "apikey",
    "invalid key",
    "unauthorized",
    "unauthenticated",
    "authentication",
    "permission denied",
    "permission_denied",
];

/// Outcome of inspecting the first chunk of a call.
#[derive(Debug)]
pub enum Classification {
    /// Proceed with normal frame processing.
    Normal,
    /// The call failed; nothing from it may be shown as content.
    Error(Error),
}

/// Classify `first_chunk` received with `status`.
///
/// 1. The whole chunk is parsed as one JSON value. If it exposes `error` or
///    a top-level `message`, the stream is an error. With an `Unknown`
///    status, a numeric `error.code` in the HTTP range stands in for it.
/// 2. A definite status >= 400 is an error whatever the body looks like.
/// 3. Otherwise, including an `Unknown` status, the stream is normal: a
///    possibly good stream is never aborted on a status sentinel alone.
///
/// Error messages are normalized with [`normalize_provider_message`]. When
/// the message carries no marker, the structured `error.status` tag and
/// then a 429 or 401 status are consulted.
pub fn classify(first_chunk: &str, status: HttpStatus) -> Classification {
    let payload = serde_json::from_str::<Value>(first_chunk.trim()).ok();

    if let Some(error) = payload.as_ref().and_then(error_object) {
        let detail = error_detail(error);
        let status = match status {
            HttpStatus::Unknown => reported_code(detail).map_or(status, HttpStatus::Known),
            known => known,
        };
        let raw = error_message(error).unwrap_or_else(|| derived_message(status, first_chunk));
        let tag = detail.get("status").and_then(Value::as_str).map(str::to_string);
        return Classification::Error(provider_error(&raw, tag.as_deref(), status, payload));
    }

    if status.is_error() {
        let raw = derived_message(status, first_chunk);
        return Classification::Error(provider_error(&raw, None, status, payload));
    }

    Classification::Normal
}

/// Map known quota and credential failures to their canonical messages.
/// Anything else passes through unchanged.
pub fn normalize_provider_message(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
        QUOTA_EXCEEDED_MESSAGE.to_string()
    } else if CREDENTIAL_MARKERS.iter().any(|m| lower.contains(m)) {
        INVALID_CREDENTIAL_MESSAGE.to_string()
    } else {
        raw.to_string()
    }
}

/// The object carrying an error, if `payload` is error-shaped. A top-level
/// array is inspected through its first element.
fn error_object(payload: &Value) -> Option<&Value> {
    let candidate = match payload {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let obj = candidate.as_object()?;
    let has_error = obj.get("error").is_some_and(|e| !e.is_null());
    let has_message = obj.contains_key("message");
    (has_error || has_message).then_some(candidate)
}

/// The structured error body: `error` when it is an object, else the payload itself.
fn error_detail(error: &Value) -> &Value {
    error
        .get("error")
        .filter(|e| e.is_object())
        .unwrap_or(error)
}

/// A numeric `code` that is a plausible HTTP status.
fn reported_code(detail: &Value) -> Option<u16> {
    detail
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .filter(|code| (100..=599).contains(code))
}

fn derived_message(status: HttpStatus, body: &str) -> String {
    let head = match status.code() {
        Some(code) => format!("HTTP {code} {}", reason_phrase(code)),
        None => "Provider returned an error".to_string(),
    };
    let body = body.trim();
    if body.is_empty() || body.len() > MAX_QUOTED_BODY {
        head
    } else {
        format!("{head}: {body}")
    }
}

fn provider_error(
    raw: &str,
    tag: Option<&str>,
    status: HttpStatus,
    payload: Option<Value>,
) -> Error {
    let mut message = normalize_provider_message(raw);
    if message == raw {
        if let Some(canonical) = tag
            .map(normalize_provider_message)
            .filter(|m| Some(m.as_str()) != tag)
        {
            message = canonical;
        } else {
            match status.code() {
                Some(429) => message = QUOTA_EXCEEDED_MESSAGE.to_string(),
                Some(401) => message = INVALID_CREDENTIAL_MESSAGE.to_string(),
                _ => {}
            }
        }
    }
    tracing::warn!(status = ?status, tag = ?tag, raw = %raw, "Provider reported an error");
    Error::provider(message, status.code(), payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_translator_types::ErrorKind;

    fn expect_error(c: Classification) -> Error {
        match c {
            Classification::Error(e) => e,
            Classification::Normal => panic!("expected an error classification"),
        }
    }

    #[test]
    fn test_quota_payload_with_unknown_status() {
        let err = expect_error(classify(
            r#"{"error":{"message":"Quota exceeded for today"}}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.kind, ErrorKind::Provider);
        assert_eq!(err.message, QUOTA_EXCEEDED_MESSAGE);
        assert_eq!(err.status_code, None);
        assert!(err.raw.is_some());
    }

    #[test]
    fn test_sse_chunk_with_unknown_status_is_normal() {
        let c = classify(
            "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
            HttpStatus::Unknown,
        );
        assert!(matches!(c, Classification::Normal));
    }

    #[test]
    fn test_sse_chunk_with_ok_status_is_normal() {
        let c = classify("data: {\"x\":1}\n\n", HttpStatus::Known(200));
        assert!(matches!(c, Classification::Normal));
    }

    #[test]
    fn test_non_error_json_with_unknown_status_is_normal() {
        let c = classify(r#"{"candidates":[]}"#, HttpStatus::Unknown);
        assert!(matches!(c, Classification::Normal));
    }

    #[test]
    fn test_error_status_without_structure() {
        let err = expect_error(classify("upstream exploded", HttpStatus::Known(502)));
        assert_eq!(err.status_code, Some(502));
        assert_eq!(err.message, "HTTP 502 Bad Gateway: upstream exploded");
        assert!(err.raw.is_none());
    }

    #[test]
    fn test_error_status_with_empty_body() {
        let err = expect_error(classify("", HttpStatus::Known(500)));
        assert_eq!(err.message, "HTTP 500 Internal Server Error");
    }

    #[test]
    fn test_error_status_wins_over_normal_looking_body() {
        let err = expect_error(classify("data: {\"x\":1}\n\n", HttpStatus::Known(400)));
        assert_eq!(err.status_code, Some(400));
    }

    #[test]
    fn test_429_status_maps_to_quota() {
        let err = expect_error(classify("", HttpStatus::Known(429)));
        assert_eq!(err.message, QUOTA_EXCEEDED_MESSAGE);
    }

    #[test]
    fn test_invalid_key_maps_to_credential_message() {
        let err = expect_error(classify(
            r#"{"error":{"message":"Incorrect API key provided: sk-****","type":"invalid_request_error","code":"invalid_api_key"}}"#,
            HttpStatus::Known(401),
        ));
        assert_eq!(err.message, INVALID_CREDENTIAL_MESSAGE);
    }

    #[test]
    fn test_gemini_array_error() {
        let err = expect_error(classify(
            r#"[{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}]"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.message, INVALID_CREDENTIAL_MESSAGE);
    }

    #[test]
    fn test_gemini_resource_exhausted() {
        let err = expect_error(classify(
            r#"{"error":{"code":429,"message":"You exceeded your current limit","status":"RESOURCE_EXHAUSTED"}}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.message, QUOTA_EXCEEDED_MESSAGE);
        assert_eq!(err.status_code, Some(429));
    }

    #[test]
    fn test_reported_code_alone_maps_to_quota() {
        let err = expect_error(classify(
            r#"{"error":{"code":429,"message":"Try again later"}}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.message, QUOTA_EXCEEDED_MESSAGE);
        assert_eq!(err.status_code, Some(429));
    }

    #[test]
    fn test_status_tag_maps_to_credential() {
        let err = expect_error(classify(
            r#"{"error":{"code":403,"message":"The caller does not have access","status":"PERMISSION_DENIED"}}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.message, INVALID_CREDENTIAL_MESSAGE);
        assert_eq!(err.status_code, Some(403));
    }

    #[test]
    fn test_known_status_wins_over_reported_code() {
        let err = expect_error(classify(
            r#"{"error":{"code":429,"message":"Server busy"}}"#,
            HttpStatus::Known(503),
        ));
        assert_eq!(err.status_code, Some(503));
        assert_eq!(err.message, "Server busy");
    }

    #[test]
    fn test_non_http_code_is_ignored() {
        let err = expect_error(classify(
            r#"{"error":{"code":401000,"message":"Server busy"}}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.status_code, None);
        assert_eq!(err.message, "Server busy");
    }

    #[test]
    fn test_top_level_message_is_error() {
        let err = expect_error(classify(
            r#"{"message":"Model is overloaded"}"#,
            HttpStatus::Known(200),
        ));
        assert_eq!(err.message, "Model is overloaded");
    }

    #[test]
    fn test_generic_error_passes_through() {
        let err = expect_error(classify(
            r#"{"error":"model not found"}"#,
            HttpStatus::Unknown,
        ));
        assert_eq!(err.message, "model not found");
    }

    #[test]
    fn test_null_error_field_is_not_error() {
        let c = classify(r#"{"error":null,"result":"ok"}"#, HttpStatus::Known(200));
        assert!(matches!(c, Classification::Normal));
    }

    #[test]
    fn test_normalize_quota_takes_precedence() {
        assert_eq!(
            normalize_provider_message("API key has no quota left"),
            QUOTA_EXCEEDED_MESSAGE
        );
        assert_eq!(
            normalize_provider_message("Authentication Fails (no such user)"),
            INVALID_CREDENTIAL_MESSAGE
        );
        assert_eq!(normalize_provider_message("Server busy"), "Server busy");
    }

    #[test]
    fn test_long_body_not_quoted() {
        let body = "x".repeat(MAX_QUOTED_BODY + 1);
        let err = expect_error(classify(&body, HttpStatus::Known(503)));
        assert_eq!(err.message, "HTTP 503 Service Unavailable");
    }
}
