// MockTransport and RecordingSink — testing utilities for unit and integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ai_translator_types::{
    BatchReply, BoxFuture, DisplaySink, Error, HttpStatus, OutboundRequest, StreamReply, Transport,
};

/// One `data:` frame in the chat-completions delta shape.
pub fn chat_delta_frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
    )
}

/// One `data:` frame in the generate-content shape.
pub fn gemini_delta_frame(text: &str) -> String {
    format!(
        "data: {}\r\n\r\n",
        serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    )
}

/// A complete chat-completions body for `deltas`, ending with `[DONE]`.
pub fn chat_sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|d| chat_delta_frame(d)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

enum StreamAction {
    Open {
        status: HttpStatus,
        chunks: Vec<Result<Vec<u8>, Error>>,
    },
    Fail(Error),
}

/// A scripted transport. Replies are consumed in the order they were queued,
/// separately for batch and streaming calls.
pub struct MockTransport {
    batch_actions: Mutex<Vec<Result<BatchReply, Error>>>,
    stream_actions: Mutex<Vec<StreamAction>>,
    recorded: Mutex<Vec<OutboundRequest>>,
    call_count: AtomicUsize,
    /// Optional delay before yielding each stream chunk (for timeout and pacing tests).
    stream_delay: Mutex<Option<Duration>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            batch_actions: Mutex::new(Vec::new()),
            stream_actions: Mutex::new(Vec::new()),
            recorded: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            stream_delay: Mutex::new(None),
        }
    }

    /// Queue a batch reply for the next `send()`.
    pub fn with_batch(self, status: u16, body: impl Into<String>) -> Self {
        self.batch_actions.lock().unwrap().push(Ok(BatchReply {
            status: HttpStatus::from(status),
            body: body.into(),
        }));
        self
    }

    /// Queue a failure for the next `send()`.
    pub fn with_batch_error(self, error: Error) -> Self {
        self.batch_actions.lock().unwrap().push(Err(error));
        self
    }

    /// Queue a stream for the next `open_stream()`. Each string is one chunk.
    pub fn with_stream(self, status: HttpStatus, chunks: &[&str]) -> Self {
        let chunks = chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        self.with_stream_chunks(status, chunks)
    }

    /// Queue a stream of raw chunk results; an `Err` item aborts the stream there.
    pub fn with_stream_chunks(self, status: HttpStatus, chunks: Vec<Result<Vec<u8>, Error>>) -> Self {
        self.stream_actions
            .lock()
            .unwrap()
            .push(StreamAction::Open { status, chunks });
        self
    }

    /// Queue a failure to open the next stream (e.g. connection refused).
    pub fn with_open_error(self, error: Error) -> Self {
        self.stream_actions.lock().unwrap().push(StreamAction::Fail(error));
        self
    }

    /// Use with `tokio::time::pause()` for deterministic timing.
    pub fn with_stream_delay(self, delay: Duration) -> Self {
        *self.stream_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All requests seen so far, batch and streaming.
    pub fn recorded_requests(&self) -> Vec<OutboundRequest> {
        self.recorded.lock().unwrap().clone()
    }

    fn record(&self, request: OutboundRequest) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().push(request);
    }
}

impl Transport for MockTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<BatchReply, Error>> {
        self.record(request);
        Box::pin(async {
            let mut actions = self.batch_actions.lock().unwrap();
            if !actions.is_empty() {
                return actions.remove(0);
            }
            Err(Error::configuration("MockTransport: no batch replies configured"))
        })
    }

    fn open_stream(&self, request: OutboundRequest) -> BoxFuture<'_, Result<StreamReply, Error>> {
        self.record(request);
        let action = {
            let mut queue = self.stream_actions.lock().unwrap();
            (!queue.is_empty()).then(|| queue.remove(0))
        };
        let delay = *self.stream_delay.lock().unwrap();
        Box::pin(async move {
            match action {
                Some(StreamAction::Open { status, chunks }) => Ok(StreamReply {
                    status,
                    body: Box::pin(async_stream::stream! {
                        for chunk in chunks {
                            if let Some(d) = delay {
                                tokio::time::sleep(d).await;
                            }
                            yield chunk;
                        }
                    }),
                }),
                Some(StreamAction::Fail(error)) => Err(error),
                None => Err(Error::configuration("MockTransport: no streams configured")),
            }
        })
    }
}

/// A display sink that records every render and can be hidden.
pub struct RecordingSink {
    renders: Mutex<Vec<String>>,
    visible: AtomicBool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
            visible: AtomicBool::new(true),
        }
    }

    pub fn renders(&self) -> Vec<String> {
        self.renders.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}

impl DisplaySink for RecordingSink {
    fn render(&self, committed: &str) {
        self.renders.lock().unwrap().push(committed.to_string());
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_transport_batch_queue() {
        let mock = MockTransport::new()
            .with_batch(200, "first")
            .with_batch(0, "second");
        let r1 = mock.send(OutboundRequest::get("https://a.test")).await.unwrap();
        let r2 = mock.send(OutboundRequest::get("https://b.test")).await.unwrap();
        assert_eq!(r1.body, "first");
        assert_eq!(r2.status, HttpStatus::Unknown);
        assert!(mock.send(OutboundRequest::get("https://c.test")).await.is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.recorded_requests()[1].url, "https://b.test");
    }

    #[tokio::test]
    async fn test_mock_transport_stream_chunks() {
        let mock = MockTransport::new().with_stream(HttpStatus::Unknown, &["a", "b"]);
        let reply = mock
            .open_stream(OutboundRequest::get("https://s.test"))
            .await
            .unwrap();
        assert_eq!(reply.status, HttpStatus::Unknown);
        let chunks: Vec<Vec<u8>> = reply.body.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[tokio::test]
    async fn test_mock_transport_open_error() {
        let mock = MockTransport::new().with_open_error(Error::timeout("connect"));
        let err = mock
            .open_stream(OutboundRequest::get("https://s.test"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ai_translator_types::ErrorKind::Timeout);
    }

    #[test]
    fn test_chat_sse_body() {
        let body = chat_sse_body(&["He", "llo"]);
        assert!(body.starts_with("data: {"));
        assert!(body.ends_with("data: [DONE]\n\n"));
        assert_eq!(body.matches("\n\n").count(), 3);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        assert!(sink.is_visible());
        sink.render("a");
        sink.render("ab");
        assert_eq!(sink.last().as_deref(), Some("ab"));
        sink.set_visible(false);
        assert!(!sink.is_visible());
    }
}
