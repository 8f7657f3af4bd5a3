// TranslationService — the facade: resolve the active service, build, send, and deliver updates.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::Value;
use tracing::Instrument;

use ai_translator_types::{
    credential_key, BatchResponse, BatchSpec, Error, Mode, PreferenceStore, ServiceDescriptor,
    ServiceKind, StreamingSpec, Transport, TranslatorConfig, Update,
};

use crate::registry::ProviderRegistry;
use crate::request_builder::RequestBuilder;
use crate::stream::{classify, drive_stream, Classification};

/// Runs translation and explanation requests against the active service.
pub struct TranslationService {
    registry: ProviderRegistry,
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    preferences: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TranslationService {
    pub fn new(
        registry: ProviderRegistry,
        builder: RequestBuilder,
        transport: Arc<dyn Transport>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            registry,
            builder,
            transport,
            preferences,
        }
    }

    /// Build registry and prompts from `config`.
    pub fn from_config(
        config: &TranslatorConfig,
        transport: Arc<dyn Transport>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Result<Self, Error> {
        let registry = ProviderRegistry::from_config(config)?;
        let builder = RequestBuilder::new(config.prompts.clone());
        Ok(Self::new(registry, builder, transport, preferences))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn active_service(&self) -> &ServiceDescriptor {
        self.registry.active_service(self.preferences.as_ref())
    }

    pub fn set_active_service(&self, service_id: &str) -> Result<(), Error> {
        self.registry.set_active(service_id, self.preferences.as_ref())
    }

    /// Registered services, for menus.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.registry.services()
    }

    /// Run `text` through the active service in `mode`.
    ///
    /// Streaming services deliver `Update::Delta`s in wire order. Batch
    /// services deliver a single `Update::Replace`. A missing credential or
    /// an unsupported mode is reported as a `Replace` warning and the call
    /// still returns `Ok`.
    pub async fn request(
        &self,
        text: &str,
        mode: Mode,
        mut on_update: impl FnMut(Update),
    ) -> Result<(), Error> {
        let descriptor = self.active_service();
        let span = tracing::info_span!("translate", service = %descriptor.id, mode = %mode);
        self.dispatch(descriptor, text, mode, &mut on_update)
            .instrument(span)
            .await
            .map_err(|e| e.with_service(&descriptor.id))
    }

    async fn dispatch(
        &self,
        descriptor: &ServiceDescriptor,
        text: &str,
        mode: Mode,
        on_update: &mut impl FnMut(Update),
    ) -> Result<(), Error> {
        let credential = self
            .preferences
            .get(&credential_key(&descriptor.id))
            .map(SecretString::from);

        let request = match self.builder.build(descriptor, mode, text, credential.as_ref()) {
            Ok(request) => request,
            Err(e) if !e.kind.is_fatal() => {
                tracing::debug!(kind = ?e.kind, "Request not sent");
                on_update(Update::Replace(e.user_message()));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match &descriptor.kind {
            ServiceKind::Batch(spec) => {
                let reply = self.transport.send(request).await?;
                if let Classification::Error(err) = classify(&reply.body, reply.status) {
                    return Err(err);
                }
                let result = parse_batch(spec, &reply.body)?;
                on_update(Update::Replace(result));
                Ok(())
            }
            ServiceKind::Streaming(StreamingSpec { delta_path, .. }) => {
                let reply = self.transport.open_stream(request).await?;
                drive_stream(reply, delta_path, |delta| on_update(Update::Delta(delta))).await
            }
        }
    }
}

/// Extract the translated text from a batch response body.
fn parse_batch(spec: &BatchSpec, body: &str) -> Result<String, Error> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::response_parse(format!("Batch response is not JSON: {e}")))?;

    match &spec.response {
        BatchResponse::GoogleGtx => {
            // [[["译文","source",...], ...], ...]: join the first element of each segment
            let segments = value
                .get(0)
                .and_then(Value::as_array)
                .ok_or_else(|| Error::response_parse("Unexpected gtx response shape"))?;
            Ok(segments
                .iter()
                .filter_map(|segment| segment.get(0).and_then(Value::as_str))
                .collect())
        }
        BatchResponse::Path(path) => path
            .resolve_str(&value)
            .map(str::to_string)
            .ok_or_else(|| Error::response_parse(format!("No text at response path `{path}`"))),
    }
}
