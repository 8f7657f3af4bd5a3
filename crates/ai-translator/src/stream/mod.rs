// Streaming pipeline — classification, frame ingestion, and delta delivery.

pub mod classifier;
pub mod frame;
pub mod ingest;

pub use classifier::{classify, normalize_provider_message, Classification};
pub use frame::{Frame, DONE_SENTINEL};
pub use ingest::{IngestState, StreamIngestor};

use futures::StreamExt;

use ai_translator_types::{Error, FieldPath, StreamReply};

/// Drive one streaming reply to completion, calling `on_delta` for every
/// non-empty content delta in wire order.
///
/// The first chunk carrying anything but whitespace is classified before any
/// frame is processed. An error payload fails the call and no delta is
/// delivered. A transport failure mid-stream also fails the call; deltas
/// already delivered stay delivered.
pub async fn drive_stream(
    reply: StreamReply,
    delta_path: &FieldPath,
    mut on_delta: impl FnMut(String),
) -> Result<(), Error> {
    let StreamReply { status, mut body } = reply;
    let mut ingestor = StreamIngestor::new(delta_path.clone());
    let mut classified = false;
    let mut delivered = 0usize;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, bytes = ingestor.cursor(), "Stream aborted by transport");
                ingestor.fail();
                return Err(e);
            }
        };

        if !classified {
            let text = String::from_utf8_lossy(&chunk);
            if text.trim().is_empty() {
                continue;
            }
            classified = true;
            if let Classification::Error(err) = classify(&text, status) {
                ingestor.fail();
                return Err(err);
            }
        }

        for delta in ingestor.feed(&chunk) {
            delivered += 1;
            on_delta(delta);
        }
    }

    if !classified && status.is_error() {
        ingestor.fail();
        return Err(match classify("", status) {
            Classification::Error(err) => err,
            Classification::Normal => Error::provider(
                format!("Stream ended with status {status:?}"),
                status.code(),
                None,
            ),
        });
    }

    ingestor.finish();
    tracing::debug!(bytes = ingestor.cursor(), deltas = delivered, "Stream finished");
    Ok(())
}
