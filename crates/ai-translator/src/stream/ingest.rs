// StreamIngestor — incremental decoder from raw chunks to content deltas.

use ai_translator_types::FieldPath;
use serde_json::Value;

use super::frame::Frame;

/// Lifecycle of one streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    AwaitingFirstData,
    Streaming,
    /// Terminal: the transport finished.
    Done,
    /// Terminal: the call was classified as an error or the transport failed.
    Failed,
}

impl IngestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Incremental UTF-8 decoding that holds back a multibyte character split
/// across chunks. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        loop {
            // error_len: Some(0) = all valid, Some(n) = n invalid bytes, None = incomplete tail
            let (valid, error_len) = match std::str::from_utf8(&self.pending) {
                Ok(s) => (s.len(), Some(0)),
                Err(e) => (e.valid_up_to(), e.error_len()),
            };
            out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
            match error_len {
                Some(0) => {
                    self.pending.clear();
                    break;
                }
                Some(n) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + n);
                }
                None => {
                    self.pending.drain(..valid);
                    break;
                }
            }
        }
        out
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Per-call stream state: the carry buffer holding at most one incomplete
/// trailing line, and a cursor counting bytes accepted so far.
///
/// Every complete line in newly arrived data is decoded before `feed`
/// returns, so the carry buffer never holds a line boundary.
#[derive(Debug)]
pub struct StreamIngestor {
    delta_path: FieldPath,
    state: IngestState,
    decoder: Utf8Decoder,
    carry: String,
    cursor: usize,
}

impl StreamIngestor {
    pub fn new(delta_path: FieldPath) -> Self {
        Self {
            delta_path,
            state: IngestState::AwaitingFirstData,
            decoder: Utf8Decoder::default(),
            carry: String::new(),
            cursor: 0,
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Total bytes accepted.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The incomplete trailing line, if any.
    pub fn carry(&self) -> &str {
        &self.carry
    }

    /// Accept one raw chunk and return the content deltas it completes,
    /// in wire order. Feeding a finished ingestor yields nothing.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.state.is_terminal() || chunk.is_empty() {
            return deltas;
        }
        self.state = IngestState::Streaming;
        self.cursor += chunk.len();

        let text = self.decoder.decode(chunk);
        self.carry.push_str(&text);

        let Some(boundary) = self.carry.rfind('\n') else {
            return deltas;
        };
        let complete: String = self.carry.drain(..=boundary).collect();
        for line in complete.split('\n') {
            self.process_line(line, &mut deltas);
        }
        deltas
    }

    fn process_line(&self, line: &str, deltas: &mut Vec<String>) {
        let payload = match Frame::decode(line) {
            Frame::Data(payload) => payload,
            Frame::Blank | Frame::Done | Frame::Other(_) => return,
        };
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => {
                if let Some(delta) = self.delta_path.resolve_str(&value) {
                    if !delta.is_empty() {
                        deltas.push(delta.to_string());
                    }
                }
            }
            Err(e) => {
                // Keep-alive noise or a malformed fragment; the stream goes on.
                tracing::debug!(error = %e, "Dropping unparseable stream frame");
            }
        }
    }

    /// The transport finished. An incomplete trailing line is discarded.
    pub fn finish(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if !self.carry.trim().is_empty() {
            tracing::debug!(
                bytes = self.carry.len(),
                "Discarding incomplete trailing frame at end of stream"
            );
        }
        self.carry.clear();
        self.decoder.clear();
        self.state = IngestState::Done;
    }

    /// Abandon the call. All buffered state is discarded.
    pub fn fail(&mut self) {
        self.carry.clear();
        self.decoder.clear();
        self.state = IngestState::Failed;
    }
}
