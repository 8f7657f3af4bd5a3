// Error hierarchy — unified error type for the entire workspace.

use serde::{Deserialize, Serialize};

/// Canonical message for quota or rate-limit exhaustion reported by a provider.
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "Quota exceeded: the service's usage limit has been reached. Try again later or switch services.";

/// Canonical message for a rejected or malformed credential.
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "Invalid credential: check the API key configured for this service.";

/// Discriminator covering every failure the translator can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Configuration errors
    UnknownService,
    InvalidService,
    UnknownProtocol,
    Configuration,

    // Non-fatal: reported to the user as an informational update
    UnsupportedMode,
    MissingCredential,

    // Provider-reported errors (detected by the classifier)
    Provider,

    // Transport errors
    Timeout,
    Network,
    ResponseParse,
}

impl ErrorKind {
    /// Returns `true` for configuration mistakes that abort a call with no output.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownService | Self::InvalidService | Self::UnknownProtocol | Self::Configuration
        )
    }

    /// Returns `false` for conditions the user can remediate, which are shown
    /// as a panel message instead of failing the call.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnsupportedMode | Self::MissingCredential)
    }
}

/// The single error type for the entire workspace.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,

    /// Service identifier the failure relates to, when known.
    pub service: Option<String>,
    /// HTTP status reported by the transport, when it was definite.
    pub status_code: Option<u16>,
    /// Raw provider payload, kept for diagnostics.
    pub raw: Option<serde_json::Value>,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            service: None,
            status_code: None,
            raw: None,
        }
    }

    pub fn unknown_service(id: &str) -> Self {
        let mut err = Self::new(ErrorKind::UnknownService, format!("Service [{id}] not found"));
        err.service = Some(id.to_string());
        err
    }

    pub fn invalid_service(id: &str) -> Self {
        let mut err = Self::new(
            ErrorKind::InvalidService,
            format!("Cannot select service [{id}]: it is not registered"),
        );
        err.service = Some(id.to_string());
        err
    }

    pub fn unknown_protocol(tag: &str) -> Self {
        Self::new(ErrorKind::UnknownProtocol, format!("Unknown provider protocol: {tag}"))
    }

    /// Convenience: configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// The service cannot run in the requested mode (e.g. explanations on a
    /// plain translation endpoint).
    pub fn unsupported_mode(id: &str, mode: &str) -> Self {
        let mut err = Self::new(
            ErrorKind::UnsupportedMode,
            format!(
                "The free service [{id}] does not support \"{mode}\" mode. Switch to an AI service."
            ),
        );
        err.service = Some(id.to_string());
        err
    }

    pub fn missing_credential(id: &str) -> Self {
        let mut err = Self::new(
            ErrorKind::MissingCredential,
            format!("Set the API key for [{id}] in the settings menu first."),
        );
        err.service = Some(id.to_string());
        err
    }

    /// Provider-reported failure. `message` should already be normalized.
    pub fn provider(message: impl Into<String>, status: Option<u16>, raw: Option<serde_json::Value>) -> Self {
        let mut err = Self::new(ErrorKind::Provider, message);
        err.status_code = status;
        err.raw = raw;
        err
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Convenience: network error with source.
    pub fn network(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let mut err = Self::new(ErrorKind::Network, message);
        err.source = Some(Box::new(source));
        err
    }

    pub fn response_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseParse, message)
    }

    /// Attach the service identifier if none is recorded yet.
    pub fn with_service(mut self, id: &str) -> Self {
        if self.service.is_none() {
            self.service = Some(id.to_string());
        }
        self
    }

    /// Text suitable for showing in the result panel.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::UnsupportedMode | ErrorKind::MissingCredential => self.message.clone(),
            ErrorKind::Timeout => format!("[Timeout] {}", self.message),
            ErrorKind::Network => "[Network Error]".to_string(),
            _ => format!("[Error] {}", self.message),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_kinds() {
        assert!(ErrorKind::UnknownService.is_configuration());
        assert!(ErrorKind::InvalidService.is_configuration());
        assert!(ErrorKind::UnknownProtocol.is_configuration());
        assert!(!ErrorKind::Provider.is_configuration());
        assert!(!ErrorKind::Timeout.is_configuration());
    }

    #[test]
    fn test_remediable_kinds_are_not_fatal() {
        assert!(!ErrorKind::MissingCredential.is_fatal());
        assert!(!ErrorKind::UnsupportedMode.is_fatal());
        assert!(ErrorKind::Provider.is_fatal());
        assert!(ErrorKind::Network.is_fatal());
    }

    #[test]
    fn test_unknown_service_records_id() {
        let err = Error::unknown_service("nope");
        assert_eq!(err.kind, ErrorKind::UnknownService);
        assert_eq!(err.service.as_deref(), Some("nope"));
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_provider_error_fields() {
        let raw = serde_json::json!({"error": {"message": "boom"}});
        let err = Error::provider("boom", Some(500), Some(raw.clone()));
        assert_eq!(err.kind, ErrorKind::Provider);
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.raw, Some(raw));
    }

    #[test]
    fn test_error_display_output() {
        let err = Error::unknown_protocol("soap");
        let display = format!("{}", err);
        assert!(display.contains("UnknownProtocol"));
        assert!(display.contains("soap"));
    }

    #[test]
    fn test_error_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::network("connection failed", inner);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_with_service_keeps_existing() {
        let err = Error::missing_credential("gemini").with_service("openai");
        assert_eq!(err.service.as_deref(), Some("gemini"));
        let err = Error::timeout("slow").with_service("openai");
        assert_eq!(err.service.as_deref(), Some("openai"));
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            Error::provider(QUOTA_EXCEEDED_MESSAGE, None, None).user_message(),
            format!("[Error] {QUOTA_EXCEEDED_MESSAGE}")
        );
        let warn = Error::missing_credential("deepseek");
        assert_eq!(warn.user_message(), warn.message);
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "x");
        assert_eq!(Error::network("x", inner).user_message(), "[Network Error]");
    }
}
