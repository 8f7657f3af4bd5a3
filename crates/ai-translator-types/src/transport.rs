// Transport trait — the network collaborator every call goes through.

use std::future::Future;
use std::pin::Pin;

use futures_core::Stream;

use crate::error::Error;
use crate::request::{HttpStatus, OutboundRequest};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed stream that is Send.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Result of a request/response call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReply {
    pub status: HttpStatus,
    pub body: String,
}

/// An open streaming response: the status as far as the transport knows it,
/// and the body as raw chunks in wire order.
pub struct StreamReply {
    pub status: HttpStatus,
    pub body: BoxStream<'static, Result<Vec<u8>, Error>>,
}

impl std::fmt::Debug for StreamReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReply")
            .field("status", &self.status)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Sends outbound requests.
///
/// Implementations own timeouts: a call that exceeds its ceiling fails with
/// `ErrorKind::Timeout`. Implementations must report `HttpStatus::Unknown`
/// rather than guess when the real status of a stream is unavailable.
pub trait Transport: Send + Sync {
    /// Send a request and read the whole body.
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<BatchReply, Error>>;

    /// Send a request and hand back the body incrementally.
    fn open_stream(&self, request: OutboundRequest) -> BoxFuture<'_, Result<StreamReply, Error>>;
}
