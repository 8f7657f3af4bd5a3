// RequestBuilder — turns (descriptor, mode, text, credential) into an OutboundRequest.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use ai_translator_types::{
    BatchSpec, Error, Mode, OutboundRequest, PromptTemplates, Protocol, ServiceDescriptor,
    ServiceKind, StreamingSpec, TEXT_PLACEHOLDER,
};

use crate::util::http::url_with_query;
use crate::util::normalize_base_url;

/// Builds provider requests. Holds the prompt templates used for LLM services.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    prompts: PromptTemplates,
}

impl RequestBuilder {
    pub fn new(prompts: PromptTemplates) -> Self {
        Self { prompts }
    }

    /// Build the outbound call for `text` in `mode`.
    ///
    /// Fails with `UnsupportedMode` when the service cannot serve `mode`, and
    /// with `MissingCredential` when a streaming service has no usable key.
    pub fn build(
        &self,
        descriptor: &ServiceDescriptor,
        mode: Mode,
        text: &str,
        credential: Option<&SecretString>,
    ) -> Result<OutboundRequest, Error> {
        if !descriptor.supports(mode) {
            return Err(Error::unsupported_mode(&descriptor.id, mode.as_str()));
        }

        let request = match &descriptor.kind {
            ServiceKind::Batch(spec) => build_batch(spec, text),
            ServiceKind::Streaming(spec) => {
                let key = credential
                    .filter(|c| !c.expose_secret().trim().is_empty())
                    .ok_or_else(|| Error::missing_credential(&descriptor.id))?;
                let prompt = self.prompts.render(mode, text);
                build_streaming(spec, &prompt, key)
            }
        };
        request.map_err(|e| e.with_service(&descriptor.id))
    }
}

fn build_batch(spec: &BatchSpec, text: &str) -> Result<OutboundRequest, Error> {
    let params: Vec<(String, String)> = spec
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.replace(TEXT_PLACEHOLDER, text)))
        .collect();
    let url = url_with_query(&spec.endpoint, &params)?;

    let mut request = OutboundRequest::get(url);
    for (name, value) in &spec.headers {
        request = request.header(name, value);
    }
    Ok(request)
}

fn build_streaming(
    spec: &StreamingSpec,
    prompt: &str,
    key: &SecretString,
) -> Result<OutboundRequest, Error> {
    let base_url = normalize_base_url(&spec.base_url);
    let key = key.expose_secret().trim();
    if key.chars().any(|c| c.is_control()) {
        return Err(Error::configuration(
            "Invalid API key: contains control characters",
        ));
    }

    let request = match spec.protocol {
        Protocol::ChatCompletions => OutboundRequest::post(
            format!("{base_url}/chat/completions"),
            json!({
                "model": spec.model,
                "messages": [{"role": "user", "content": prompt}],
                "stream": true,
            }),
        )
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {key}"))
        .header("accept", "text/event-stream"),

        // The key goes in a header rather than `?key=` so it stays out of URLs.
        Protocol::GenerateContent => OutboundRequest::post(
            format!("{base_url}/{}:streamGenerateContent?alt=sse", spec.model),
            json!({
                "contents": [{"parts": [{"text": prompt}]}],
            }),
        )
        .header("content-type", "application/json")
        .header("x-goog-api-key", key),
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderRegistry;
    use ai_translator_types::{ErrorKind, HttpMethod};

    fn key(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn builder() -> RequestBuilder {
        RequestBuilder::new(PromptTemplates {
            translate: "Translate: {text}".into(),
            explain: "Explain: {text}".into(),
        })
    }

    #[test]
    fn test_chat_completions_request() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("openai").unwrap();
        let req = builder()
            .build(desc, Mode::Translate, "Hello", Some(&key("sk-test")))
            .unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(req.header_value("authorization"), Some("Bearer sk-test"));
        assert_eq!(req.header_value("accept"), Some("text/event-stream"));
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        let body = req.body.unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Translate: Hello");
    }

    #[test]
    fn test_generate_content_request() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("gemini").unwrap();
        let req = builder()
            .build(desc, Mode::Explain, "borrow checker", Some(&key("AIza-test")))
            .unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:streamGenerateContent?alt=sse"
        );
        assert_eq!(req.header_value("x-goog-api-key"), Some("AIza-test"));
        assert!(req.header_value("authorization").is_none());
        let body = req.body.unwrap();
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Explain: borrow checker"
        );
    }

    #[test]
    fn test_batch_request_interpolates_text() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("google").unwrap();
        let req = builder()
            .build(desc, Mode::Translate, "good morning", None)
            .unwrap();

        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
        assert_eq!(
            req.url,
            "https://translate.googleapis.com/translate_a/single?client=gtx&dt=t&sl=auto&tl=zh-CN&q=good+morning"
        );
    }

    #[test]
    fn test_batch_request_static_headers() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("bing").unwrap();
        let req = builder().build(desc, Mode::Translate, "x", None).unwrap();
        assert_eq!(req.header_value("authorization"), Some("Bearer"));
        assert!(req.url.contains("api-version=3.0"));
        assert!(req.url.ends_with("text=x"));
    }

    #[test]
    fn test_batch_explain_is_unsupported() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("google").unwrap();
        let err = builder()
            .build(desc, Mode::Explain, "x", None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedMode);
        assert_eq!(err.service.as_deref(), Some("google"));
    }

    #[test]
    fn test_streaming_without_credential() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("deepseek").unwrap();
        let err = builder()
            .build(desc, Mode::Translate, "x", None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingCredential);

        let err = builder()
            .build(desc, Mode::Translate, "x", Some(&key("  ")))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingCredential);
    }

    #[test]
    fn test_credential_with_control_characters_rejected() {
        let registry = ProviderRegistry::builtin().unwrap();
        let desc = registry.resolve("deepseek").unwrap();
        let err = builder()
            .build(desc, Mode::Translate, "x", Some(&key("sk\ninjected")))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let desc = ServiceDescriptor {
            id: "local".into(),
            display_name: "Local".into(),
            kind: ServiceKind::Streaming(StreamingSpec {
                protocol: Protocol::ChatCompletions,
                base_url: "http://localhost:8000/v1/".into(),
                model: "llama".into(),
                delta_path: Protocol::ChatCompletions.default_delta_path(),
            }),
        };
        let req = builder()
            .build(&desc, Mode::Translate, "x", Some(&key("k")))
            .unwrap();
        assert_eq!(req.url, "http://localhost:8000/v1/chat/completions");
    }
}
