use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::service::{Mode, ServiceConfig};

/// Built-in service table, embedded at compile time.
static SERVICES_JSON: &str = include_str!("services.json");

static BUILTIN_SERVICES: LazyLock<Vec<ServiceConfig>> = LazyLock::new(|| {
    serde_json::from_str(SERVICES_JSON).expect("services.json must be valid JSON")
});

/// Service used when no preference is stored.
pub const DEFAULT_SERVICE: &str = "gemini";

/// Placeholder substituted with the selected text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Service used when the stored preference is missing or stale.
    pub default_service: String,
    pub prompts: PromptTemplates,
    pub services: Vec<ServiceConfig>,
    pub render: RenderPacing,
    pub timeout: TransportTimeout,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            default_service: DEFAULT_SERVICE.to_string(),
            prompts: PromptTemplates::default(),
            services: BUILTIN_SERVICES.clone(),
            render: RenderPacing::default(),
            timeout: TransportTimeout::default(),
        }
    }
}

impl TranslatorConfig {
    /// Parse a JSON document. Omitted sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("Invalid translator config: {e}")))
    }

    /// Load the file named by `AI_TRANSLATOR_CONFIG` (defaults when unset),
    /// then apply the `AI_TRANSLATOR_*_TIMEOUT` overrides.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let json = std::fs::read_to_string(path.trim()).map_err(|e| {
                    Error::configuration(format!("Cannot read config file {path}: {e}"))
                })?;
                Self::from_json(&json)?
            }
            _ => Self::default(),
        };
        config.timeout = TransportTimeout::from_env(config.timeout);
        Ok(config)
    }
}

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "AI_TRANSLATOR_CONFIG";

/// Prompt templates per mode. Each must contain `{text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub translate: String,
    pub explain: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            translate: "You are a professional translator. Translate the following text into \
                        Simplified Chinese directly without explanation:\n\n{text}"
                .to_string(),
            explain: "You are a computer science expert. Explain the following text in \
                      Simplified Chinese clearly:\n\n{text}"
                .to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn template(&self, mode: Mode) -> &str {
        match mode {
            Mode::Translate => &self.translate,
            Mode::Explain => &self.explain,
        }
    }

    /// Substitute the first `{text}` in the template for `mode`.
    pub fn render(&self, mode: Mode, text: &str) -> String {
        self.template(mode).replacen(TEXT_PLACEHOLDER, text, 1)
    }
}

/// Pacing of the render drain loop.
///
/// Each tick commits `step_for(backlog)` characters: the larger the backlog,
/// the larger the step, capped at `fast_step` so bursts still animate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPacing {
    /// Milliseconds between drain ticks (default: 16).
    pub tick_ms: u64,
    /// Backlog at which the medium step applies (default: 20).
    pub small_threshold: usize,
    /// Backlog at which the fast step applies (default: 50).
    pub moderate_threshold: usize,
    pub slow_step: usize,
    pub medium_step: usize,
    pub fast_step: usize,
}

impl Default for RenderPacing {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            small_threshold: 20,
            moderate_threshold: 50,
            slow_step: 1,
            medium_step: 3,
            fast_step: 6,
        }
    }
}

impl RenderPacing {
    /// Characters to commit this tick. Never zero while there is a backlog.
    pub fn step_for(&self, backlog: usize) -> usize {
        let step = if backlog >= self.moderate_threshold {
            self.fast_step
        } else if backlog >= self.small_threshold {
            self.medium_step
        } else {
            self.slow_step
        };
        step.max(1)
    }

    pub fn tick(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Transport timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportTimeout {
    /// Connection timeout (default: 10.0).
    pub connect: f64,
    /// Ceiling for a whole call (default: 120.0).
    pub request: f64,
    /// Maximum wait between two stream chunks (default: 30.0).
    pub stream_read: f64,
}

impl TransportTimeout {
    /// Override each field from `AI_TRANSLATOR_{CONNECT,REQUEST,STREAM_READ}_TIMEOUT`.
    /// Unparseable values are ignored.
    pub fn from_env(base: Self) -> Self {
        fn seconds(var: &str, fallback: f64) -> f64 {
            std::env::var(var)
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(fallback)
        }
        Self {
            connect: seconds("AI_TRANSLATOR_CONNECT_TIMEOUT", base.connect),
            request: seconds("AI_TRANSLATOR_REQUEST_TIMEOUT", base.request),
            stream_read: seconds("AI_TRANSLATOR_STREAM_READ_TIMEOUT", base.stream_read),
        }
    }
}

impl Default for TransportTimeout {
    fn default() -> Self {
        Self {
            connect: 10.0,
            request: 120.0,
            stream_read: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_has_builtin_services() {
        let config = TranslatorConfig::default();
        let ids: Vec<&str> = config.services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["deepseek", "openai", "gemini", "google", "bing"]);
        assert_eq!(config.default_service, "gemini");
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = TranslatorConfig::from_json(r#"{"default_service": "google"}"#).unwrap();
        assert_eq!(config.default_service, "google");
        assert_eq!(config.services.len(), 5);
        assert_eq!(config.render, RenderPacing::default());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = TranslatorConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_and_timeout_overrides() {
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::set_var("AI_TRANSLATOR_STREAM_READ_TIMEOUT", "5");
        std::env::set_var("AI_TRANSLATOR_CONNECT_TIMEOUT", "not-a-number");

        let config = TranslatorConfig::from_env().unwrap();
        assert_eq!(config.timeout.stream_read, 5.0);
        assert_eq!(config.timeout.connect, 10.0);
        assert_eq!(config.timeout.request, 120.0);

        std::env::remove_var("AI_TRANSLATOR_STREAM_READ_TIMEOUT");
        std::env::remove_var("AI_TRANSLATOR_CONNECT_TIMEOUT");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_config_file() {
        let path = std::env::temp_dir().join("ai-translator-config-test.json");
        std::fs::write(&path, r#"{"default_service": "deepseek", "render": {"tick_ms": 8}}"#)
            .unwrap();
        std::env::set_var(CONFIG_PATH_ENV, &path);

        let config = TranslatorConfig::from_env().unwrap();
        assert_eq!(config.default_service, "deepseek");
        assert_eq!(config.render.tick_ms, 8);
        assert_eq!(config.render.fast_step, 6);

        std::env::set_var(CONFIG_PATH_ENV, path.with_extension("missing"));
        let err = TranslatorConfig::from_env().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);

        std::env::remove_var(CONFIG_PATH_ENV);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_prompt_render_substitutes_first_placeholder() {
        let prompts = PromptTemplates {
            translate: "T: {text} / {text}".into(),
            explain: "E: {text}".into(),
        };
        assert_eq!(prompts.render(Mode::Translate, "hi"), "T: hi / {text}");
        assert_eq!(prompts.render(Mode::Explain, "hi"), "E: hi");
    }

    #[test]
    fn test_step_policy_tiers() {
        let pacing = RenderPacing::default();
        assert_eq!(pacing.step_for(1), 1);
        assert_eq!(pacing.step_for(19), 1);
        assert_eq!(pacing.step_for(20), 3);
        assert_eq!(pacing.step_for(49), 3);
        assert_eq!(pacing.step_for(50), 6);
        assert_eq!(pacing.step_for(10_000), 6);
    }

    #[test]
    fn test_zero_step_is_clamped() {
        let pacing = RenderPacing {
            slow_step: 0,
            tick_ms: 0,
            ..Default::default()
        };
        assert_eq!(pacing.step_for(3), 1);
        assert_eq!(pacing.tick(), std::time::Duration::from_millis(1));
    }

    #[test]
    fn test_timeout_defaults() {
        let t = TransportTimeout::default();
        assert_eq!(t.connect, 10.0);
        assert_eq!(t.request, 120.0);
        assert_eq!(t.stream_read, 30.0);
    }
}
