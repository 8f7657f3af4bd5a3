// Frame decoding — one complete line of a server-sent-event body.

/// Sentinel some providers send as the last data line.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded line of a streamed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Empty line (SSE event boundary) or whitespace.
    Blank,
    /// `data: [DONE]`.
    Done,
    /// Payload of a `data:` line, prefix stripped.
    Data(&'a str),
    /// Any other line: `event:`, `id:`, `:` comments, or noise.
    Other(&'a str),
}

impl<'a> Frame<'a> {
    /// Classify a single line. Surrounding whitespace (including a `\r`
    /// left over from CRLF endings) is ignored.
    pub fn decode(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Frame::Blank;
        }
        match line.strip_prefix("data:") {
            Some(rest) => {
                let payload = rest.strip_prefix(' ').unwrap_or(rest).trim();
                if payload == DONE_SENTINEL {
                    Frame::Done
                } else {
                    Frame::Data(payload)
                }
            }
            None => Frame::Other(line),
        }
    }
}
