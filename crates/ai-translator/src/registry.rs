// ProviderRegistry — static table of services, plus the active-service preference.

use std::collections::HashSet;

use ai_translator_types::{
    Error, PreferenceStore, ServiceDescriptor, TranslatorConfig, ACTIVE_SERVICE_KEY,
};

/// Registered services, in registration order, with a default.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    services: Vec<ServiceDescriptor>,
    default_service: String,
}

impl ProviderRegistry {
    /// The built-in table: deepseek, openai, gemini (streaming) and google,
    /// bing (batch), defaulting to gemini.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_config(&TranslatorConfig::default())
    }

    /// Build from configuration.
    ///
    /// Fails with `UnknownProtocol` for an unrecognized protocol tag, and with
    /// a configuration error for duplicate ids or an unregistered default.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        let mut services = Vec::with_capacity(config.services.len());
        for service in &config.services {
            let descriptor = ServiceDescriptor::try_from(service.clone())?;
            if !seen.insert(descriptor.id.clone()) {
                return Err(Error::configuration(format!(
                    "Service [{}] is registered twice",
                    descriptor.id
                )));
            }
            services.push(descriptor);
        }

        if !seen.contains(&config.default_service) {
            return Err(Error::configuration(format!(
                "Default service [{}] is not registered",
                config.default_service
            )));
        }

        Ok(Self {
            services,
            default_service: config.default_service.clone(),
        })
    }

    pub fn resolve(&self, service_id: &str) -> Result<&ServiceDescriptor, Error> {
        self.services
            .iter()
            .find(|s| s.id == service_id)
            .ok_or_else(|| Error::unknown_service(service_id))
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.services.iter().any(|s| s.id == service_id)
    }

    pub fn default_service(&self) -> &ServiceDescriptor {
        // from_config guarantees the default is registered
        self.services
            .iter()
            .find(|s| s.id == self.default_service)
            .unwrap_or(&self.services[0])
    }

    /// The user's stored choice when it is still registered, else the default.
    pub fn active_service(&self, preferences: &dyn PreferenceStore) -> &ServiceDescriptor {
        let id = preferences.get_or(ACTIVE_SERVICE_KEY, &self.default_service);
        self.resolve(&id).unwrap_or_else(|_| {
            tracing::debug!(stale = %id, "Stored service is no longer registered, using default");
            self.default_service()
        })
    }

    /// Persist `service_id` as the user's choice.
    pub fn set_active(&self, service_id: &str, preferences: &dyn PreferenceStore) -> Result<(), Error> {
        if !self.contains(service_id) {
            return Err(Error::invalid_service(service_id));
        }
        preferences.set(ACTIVE_SERVICE_KEY, service_id);
        tracing::info!(service = %service_id, "Default service switched");
        Ok(())
    }

    /// All services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
