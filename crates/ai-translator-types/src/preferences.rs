// PreferenceStore — the key/value collaborator for user choices and keys.

/// Preference key holding the user's chosen service id.
pub const ACTIVE_SERVICE_KEY: &str = "preferred_service";

/// Preference key holding the credential for `service_id`.
pub fn credential_key(service_id: &str) -> String {
    format!("key_{service_id}")
}

/// Persistent user preferences, owned outside the core.
///
/// Values are opaque strings. The core never validates or rotates stored
/// credentials; it only reads them at request build time.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}
