use serde::{Deserialize, Serialize};

/// Header names whose values must never appear in logs.
const REDACTED_HEADERS: &[&str] = &["authorization", "x-goog-api-key", "api-key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Status of a response as far as the transport could tell.
///
/// Some hosts cannot read the real status of a streaming response and report
/// a sentinel instead; `Unknown` models that sentinel so callers never
/// mistake it for success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpStatus {
    Known(u16),
    Unknown,
}

impl HttpStatus {
    /// `true` only for a definite 4xx/5xx status.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Known(code) if *code >= 400)
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Known(code) => Some(*code),
            Self::Unknown => None,
        }
    }
}

impl From<u16> for HttpStatus {
    /// Hosts report `0` when the status could not be read.
    fn from(code: u16) -> Self {
        if code == 0 {
            Self::Unknown
        } else {
            Self::Known(code)
        }
    }
}

/// A transport-agnostic outbound call, built fresh for every request.
#[derive(Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let redact = REDACTED_HEADERS.iter().any(|h| k.eq_ignore_ascii_case(h));
                (k.as_str(), if redact { "[REDACTED]" } else { v.as_str() })
            })
            .collect();
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}
