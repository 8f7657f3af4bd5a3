// Shared HTTP helpers for the request builder and the classifier.

use ai_translator_types::Error;
use serde_json::Value;

/// Append `params` to `endpoint` as a URL-encoded query string.
pub(crate) fn url_with_query(endpoint: &str, params: &[(String, String)]) -> Result<String, Error> {
    let url = url::Url::parse_with_params(endpoint, params)
        .map_err(|e| Error::configuration(format!("Invalid endpoint URL `{endpoint}`: {e}")))?;
    Ok(url.into())
}

/// Canonical reason phrase for `status`.
#[cfg(feature = "http")]
pub(crate) fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_else(|| fallback_reason(status))
}

#[cfg(not(feature = "http"))]
pub(crate) fn reason_phrase(status: u16) -> &'static str {
    fallback_reason(status)
}

/// Reason phrases for the statuses providers commonly return, by class
/// otherwise. Used when reqwest is not compiled in or has no phrase.
fn fallback_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Unexpected Status",
    }
}

/// Extract a human-readable message from an error-shaped payload.
///
/// Looks at `error.message`, then `error` itself when it is a string, then a
/// top-level `message`. Falls back to the serialized `error` value.
pub(crate) fn error_message(payload: &Value) -> Option<String> {
    let error = payload.get("error");
    if let Some(msg) = error.and_then(|e| e.get("message")).and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    if let Some(msg) = error.and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    if let Some(msg) = payload.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    error.filter(|e| !e.is_null()).map(Value::to_string)
}
