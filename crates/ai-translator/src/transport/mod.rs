// Transport implementations. The trait itself lives in ai-translator-types.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

pub use ai_translator_types::{BatchReply, StreamReply, Transport};
