// ai-translator: Layer 2 — registry, request building, stream pipeline, render pacing, facade
#![allow(clippy::result_large_err)]

pub mod preferences;
pub mod registry;
pub mod render;
pub mod request_builder;
pub mod service;
pub mod session;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub(crate) mod util;

// --- Curated re-exports from ai-translator-types (Layer 1) ---
// We avoid `pub use ai_translator_types::*` to keep the public API surface
// intentional.
pub use ai_translator_types::{
    // Transport collaborator
    BatchReply,
    BatchResponse,
    BatchSpec,
    // Type aliases
    BoxFuture,
    BoxStream,
    // Display collaborator
    DisplaySink,
    // Errors
    Error,
    ErrorKind,
    FieldPath,
    HttpMethod,
    HttpStatus,
    // Services
    Mode,
    OutboundRequest,
    // Preferences collaborator
    PreferenceStore,
    // Config
    PromptTemplates,
    Protocol,
    RenderPacing,
    ServiceConfig,
    ServiceDescriptor,
    ServiceKind,
    StreamReply,
    StreamingSpec,
    Transport,
    TransportTimeout,
    TranslatorConfig,
    Update,
    ACTIVE_SERVICE_KEY,
    INVALID_CREDENTIAL_MESSAGE,
    QUOTA_EXCEEDED_MESSAGE,
};

pub use preferences::MemoryPreferences;
pub use registry::ProviderRegistry;
pub use render::{RenderScheduler, RenderSnapshot, RenderState};
pub use request_builder::RequestBuilder;
pub use service::TranslationService;
pub use session::PanelSession;
pub use stream::{classify, drive_stream, Classification, IngestState, StreamIngestor};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
