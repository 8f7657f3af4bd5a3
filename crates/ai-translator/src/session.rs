// PanelSession — owns the one current call of a result panel.

use std::sync::Arc;

use ai_translator_types::{Error, Mode, Update};

use crate::render::RenderScheduler;
use crate::service::TranslationService;

/// Connects a [`TranslationService`] to one panel's [`RenderScheduler`].
///
/// Starting a run supersedes the previous one: its render is discarded and
/// any update it still produces is dropped.
#[derive(Debug)]
pub struct PanelSession {
    service: Arc<TranslationService>,
    scheduler: Arc<RenderScheduler>,
}

impl PanelSession {
    pub fn new(service: Arc<TranslationService>, scheduler: Arc<RenderScheduler>) -> Self {
        Self { service, scheduler }
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Run `text` in `mode` and feed the panel. On failure the panel shows
    /// the user-facing error line and the error is returned.
    pub async fn run(&self, text: &str, mode: Mode) -> Result<(), Error> {
        self.scheduler.reset();
        let generation = self.scheduler.generation();

        let mut superseded = false;
        let result = self
            .service
            .request(text, mode, |update| {
                if !superseded && !self.scheduler.push_if_current(generation, update) {
                    tracing::debug!("Panel request superseded, dropping further updates");
                    superseded = true;
                }
            })
            .await;

        if let Err(e) = &result {
            if e.kind.is_configuration() {
                tracing::error!(error = %e, "Panel request misconfigured");
            } else {
                tracing::warn!(error = %e, "Panel request failed");
            }
            self.scheduler
                .push_if_current(generation, Update::Replace(e.user_message()));
        }
        result
    }

    /// Close the panel: stop rendering and discard all text.
    pub fn dismiss(&self) {
        self.scheduler.reset();
    }
}
