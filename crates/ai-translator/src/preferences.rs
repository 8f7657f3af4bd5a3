// MemoryPreferences — in-process PreferenceStore, optionally seeded from the environment.

use std::collections::HashMap;
use std::sync::RwLock;

use ai_translator_types::{credential_key, PreferenceStore, ACTIVE_SERVICE_KEY};

use crate::registry::ProviderRegistry;

/// Environment variable naming the preferred service.
pub const SERVICE_ENV: &str = "AI_TRANSLATOR_SERVICE";

/// A `PreferenceStore` backed by a map. Values live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed credentials and the active service from environment variables.
    ///
    /// For every streaming service `<id>`, `<ID>_API_KEY` (upper-cased, `-`
    /// replaced by `_`) becomes its credential, e.g. `GEMINI_API_KEY`.
    /// `AI_TRANSLATOR_SERVICE` becomes the stored service choice; a stale
    /// value is harmless because the registry falls back to its default.
    pub fn from_env(registry: &ProviderRegistry) -> Self {
        let prefs = Self::new();
        for service in registry.services().filter(|s| s.requires_credential()) {
            let var = format!("{}_API_KEY", service.id.to_uppercase().replace('-', "_"));
            if let Ok(key) = std::env::var(&var) {
                let key = key.trim();
                if !key.is_empty() {
                    prefs.set(&credential_key(&service.id), key);
                    tracing::debug!(service = %service.id, "Loaded credential from {var}");
                }
            }
        }
        if let Ok(service) = std::env::var(SERVICE_ENV) {
            prefs.set(ACTIVE_SERVICE_KEY, service.trim());
        }
        prefs
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}
