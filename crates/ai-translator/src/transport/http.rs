// HttpTransport — reqwest-backed Transport with connect, request and per-chunk timeouts.

use std::time::Duration;

use futures::{Stream, StreamExt};

use ai_translator_types::{
    BatchReply, BoxFuture, BoxStream, Error, HttpMethod, HttpStatus, OutboundRequest, StreamReply, Transport,
    TransportTimeout,
};

/// Sends requests over HTTP(S). Statuses are always reported as `Known`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// Maximum wait between two body chunks of a stream.
    stream_read_timeout: Duration,
}

impl HttpTransport {
    /// Build a client with `timeout.connect` as the connect timeout and
    /// `timeout.request` as the ceiling for a whole call.
    pub fn new(timeout: &TransportTimeout) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs_f64(timeout.connect))
            .timeout(Duration::from_secs_f64(timeout.request))
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}"), e))?;
        Ok(Self::with_client(
            client,
            Duration::from_secs_f64(timeout.stream_read),
        ))
    }

    /// Use an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: reqwest::Client, stream_read_timeout: Duration) -> Self {
        Self {
            client,
            stream_read_timeout,
        }
    }

    fn prepare(&self, request: OutboundRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    async fn do_send(&self, request: OutboundRequest) -> Result<BatchReply, Error> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Sending request");
        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| transport_error("HTTP request failed", e))?;
        let status = HttpStatus::Known(response.status().as_u16());
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("Failed to read response body", e))?;
        Ok(BatchReply { status, body })
    }

    async fn do_open_stream(&self, request: OutboundRequest) -> Result<StreamReply, Error> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Opening stream");
        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| transport_error("HTTP request failed", e))?;
        let status = HttpStatus::Known(response.status().as_u16());

        let body = read_chunks(response.bytes_stream(), self.stream_read_timeout, |e| {
            transport_error("Stream read error", e)
        });

        Ok(StreamReply { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<BatchReply, Error>> {
        Box::pin(self.do_send(request))
    }

    fn open_stream(&self, request: OutboundRequest) -> BoxFuture<'_, Result<StreamReply, Error>> {
        Box::pin(self.do_open_stream(request))
    }
}

/// Re-yield `chunks` as owned bytes. The stream ends with a `Timeout` error
/// when no chunk arrives within `read_timeout`, and stops after the first
/// read error.
fn read_chunks<S, B, E>(
    chunks: S,
    read_timeout: Duration,
    map_err: fn(E) -> Error,
) -> BoxStream<'static, Result<Vec<u8>, Error>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
{
    let mut chunks = Box::pin(chunks);
    Box::pin(async_stream::stream! {
        loop {
            match tokio::time::timeout(read_timeout, chunks.next()).await {
                Ok(Some(Ok(chunk))) => yield Ok(chunk.as_ref().to_vec()),
                Ok(Some(Err(e))) => {
                    yield Err(map_err(e));
                    return;
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    yield Err(Error::timeout(format!(
                        "Stream read timed out after {read_timeout:?}"
                    )));
                    return;
                }
            }
        }
    })
}

/// reqwest timeouts become `Timeout`; everything else is `Network`.
fn transport_error(context: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        let mut err = Error::timeout(format!("{context}: request timed out"));
        err.source = Some(Box::new(e));
        err
    } else {
        Error::network(format!("{context}: {e}"), e)
    }
}
