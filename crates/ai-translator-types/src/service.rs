// Service descriptors — the protocol table entries the registry owns.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::field_path::FieldPath;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Translate,
    Explain,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Explain => "explain",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire protocol of a streaming LLM service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `POST {base}/chat/completions` with `stream: true` (OpenAI, DeepSeek, ...).
    ChatCompletions,
    /// `POST {base}/{model}:streamGenerateContent?alt=sse` (Gemini).
    GenerateContent,
}

impl Protocol {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ChatCompletions => "openai_compatible",
            Self::GenerateContent => "gemini",
        }
    }

    /// Where the text fragment lives in one streamed payload.
    pub fn default_delta_path(&self) -> FieldPath {
        match self {
            Self::ChatCompletions => FieldPath::parse("choices.0.delta.content"),
            Self::GenerateContent => FieldPath::parse("candidates.0.content.parts.0.text"),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "openai_compatible" | "openai-compatible" | "chat_completions" => {
                Ok(Self::ChatCompletions)
            }
            "gemini" | "generate_content" => Ok(Self::GenerateContent),
            other => Err(Error::unknown_protocol(other)),
        }
    }
}

/// How a batch service's single response body is turned into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResponse {
    /// Google `translate_a/single?client=gtx`: `[[["seg", ...], ...], ...]`,
    /// the first element of every inner segment joined.
    GoogleGtx,
    /// A string at a fixed path.
    Path(FieldPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub endpoint: String,
    /// Query parameters in order; values may contain `{text}`.
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub response: BatchResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingSpec {
    pub protocol: Protocol,
    pub base_url: String,
    pub model: String,
    pub delta_path: FieldPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    Batch(BatchSpec),
    Streaming(StreamingSpec),
}

/// One registered service. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub id: String,
    pub display_name: String,
    pub kind: ServiceKind,
}

impl ServiceDescriptor {
    pub fn is_streaming(&self) -> bool {
        matches!(self.kind, ServiceKind::Streaming(_))
    }

    /// Batch endpoints are plain translators; only LLM services can explain.
    pub fn supports(&self, mode: Mode) -> bool {
        match (&self.kind, mode) {
            (ServiceKind::Streaming(_), _) => true,
            (ServiceKind::Batch(_), Mode::Translate) => true,
            (ServiceKind::Batch(_), Mode::Explain) => false,
        }
    }

    /// Credentials are only attached to streaming calls.
    pub fn requires_credential(&self) -> bool {
        self.is_streaming()
    }
}

/// Serialized form of a service, as written in configuration.
///
/// `type` is `"ai"` (streaming) or `"free"` (batch). Protocol and parser
/// tags stay free strings here so an unrecognized tag surfaces as
/// `UnknownProtocol` when the descriptor is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,

    // Streaming fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_path: Option<FieldPath>,

    // Batch fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_path: Option<FieldPath>,
}

fn required(value: Option<String>, id: &str, field: &str) -> Result<String, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::configuration(format!("Service [{id}] is missing `{field}`")))
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TryFrom<ServiceConfig> for ServiceDescriptor {
    type Error = Error;

    fn try_from(config: ServiceConfig) -> Result<Self, Self::Error> {
        let id = config.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::configuration("Service id must not be empty"));
        }
        let display_name = config
            .display_name
            .unwrap_or_else(|| capitalize(&id));

        let kind = match config.kind.as_str() {
            "ai" | "streaming" => {
                let protocol: Protocol = required(config.provider, &id, "provider")?.parse()?;
                let delta_path = match config.delta_path {
                    Some(path) if !path.is_empty() => path,
                    _ => protocol.default_delta_path(),
                };
                ServiceKind::Streaming(StreamingSpec {
                    protocol,
                    base_url: required(config.base_url, &id, "base_url")?,
                    model: required(config.model, &id, "model")?,
                    delta_path,
                })
            }
            "free" | "batch" => {
                let response = match (config.parser.as_deref(), config.response_path) {
                    (Some("google_gtx"), _) => BatchResponse::GoogleGtx,
                    (Some(other), _) => return Err(Error::unknown_protocol(other)),
                    (None, Some(path)) if !path.is_empty() => BatchResponse::Path(path),
                    (None, _) => {
                        return Err(Error::configuration(format!(
                            "Service [{id}] needs either `parser` or `response_path`"
                        )))
                    }
                };
                ServiceKind::Batch(BatchSpec {
                    endpoint: required(config.url, &id, "url")?,
                    params: config.params,
                    headers: config.headers,
                    response,
                })
            }
            other => {
                return Err(Error::configuration(format!(
                    "Service [{id}] has unknown type `{other}` (expected \"ai\" or \"free\")"
                )))
            }
        };

        Ok(Self {
            id,
            display_name,
            kind,
        })
    }
}
